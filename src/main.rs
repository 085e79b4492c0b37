//! Formpilot - Remote page control for automated form filling.
//!
//! Main entry point for the formpilot CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formpilot_config::{Config, ConfigLoader};
use formpilot_protocols::{Point, TabId};
use formpilot_remote::{
    CdpSocketTransport, ControllerOptions, KeyPress, MouseButton, RemoteDebugController,
};

/// Formpilot CLI.
#[derive(Parser)]
#[command(name = "formpilot")]
#[command(about = "Remote page control for automated form filling")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Browser debugging endpoint, e.g. http://127.0.0.1:9222
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Pin commands to this tab instead of the focused one
    #[arg(long, global = true)]
    tab: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List debuggable tabs
    Tabs {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Print the URL of the controlled tab
    Url,

    /// Click at a point on the page
    Click {
        /// Target point as X,Y in CSS pixels
        point: String,

        /// Mouse button (left, middle, right)
        #[arg(long, default_value = "left")]
        button: String,

        /// Click count, e.g. 2 for a double click
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Move the pointer without clicking
    Move {
        /// Target point as X,Y in CSS pixels
        point: String,
    },

    /// Drag from one point to another
    Drag {
        /// Start point as X,Y
        from: String,

        /// End point as X,Y
        to: String,
    },

    /// Type text into the focused element
    Type {
        /// Text to type
        text: String,
    },

    /// Press a key chord, held together in order
    Press {
        /// Key names, e.g. Control a
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Clear the input element at a point
    Clear {
        /// Target point as X,Y
        point: String,
    },

    /// Scroll the page
    Scroll {
        /// Direction (up, down, left, right)
        direction: String,

        /// Distance in CSS pixels (default: most of one viewport)
        #[arg(long)]
        distance: Option<f64>,

        /// Scroll all the way to the edge
        #[arg(long)]
        edge: bool,
    },

    /// Capture a JPEG screenshot of the page
    Screenshot {
        /// Output file
        #[arg(short, long, default_value = "page.jpg")]
        output: PathBuf,
    },

    /// Evaluate a JavaScript expression and print the CDP response
    Eval {
        /// Expression to evaluate
        expression: String,
    },

    /// Print the structured element tree as JSON
    Tree,

    /// Wait until the page's network goes idle
    WaitIdle,
}

/// Initialize tracing on stderr, leaving stdout to command output.
fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

/// Load configuration. An explicit path must load; without one,
/// `formpilot.toml` is used when present, defaults otherwise.
fn load_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(ConfigLoader::load(path)?),
        None => {
            let fallback = PathBuf::from("formpilot.toml");
            if fallback.exists() {
                Ok(ConfigLoader::load(&fallback)?)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn parse_point(s: &str) -> Result<Point, Box<dyn std::error::Error>> {
    let parsed = s.split_once(',').and_then(|(x, y)| {
        let x: f64 = x.trim().parse().ok()?;
        let y: f64 = y.trim().parse().ok()?;
        Some(Point::new(x, y))
    });
    parsed.ok_or_else(|| format!("invalid point '{}', expected X,Y", s).into())
}

fn parse_button(s: &str) -> Result<MouseButton, Box<dyn std::error::Error>> {
    match s {
        "left" => Ok(MouseButton::Left),
        "middle" => Ok(MouseButton::Middle),
        "right" => Ok(MouseButton::Right),
        other => Err(format!("unknown mouse button '{}'", other).into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config.logging.level);

    let endpoint = cli
        .endpoint
        .unwrap_or_else(|| config.browser.http_base());
    debug!(%endpoint, "connecting to browser");

    let transport = CdpSocketTransport::connect(&endpoint).await?;
    let options = ControllerOptions {
        force_same_tab_navigation: config.controller.force_same_tab_navigation,
        overlay: config.controller.overlay,
    };
    let controller = RemoteDebugController::with_options(Arc::new(transport), options);

    if let Some(tab) = cli.tab {
        controller.set_active_tab(TabId::from(tab)).await?;
    }

    let result = run_command(&controller, cli.command).await;

    // Detach before reporting so the page never stays in the debugged state.
    controller.destroy().await;
    result
}

async fn run_command(
    controller: &RemoteDebugController,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Tabs { format } => cmd_tabs(controller, &format).await,
        Commands::Url => {
            println!("{}", controller.url().await?);
            Ok(())
        }
        Commands::Click {
            point,
            button,
            count,
        } => {
            let point = parse_point(&point)?;
            let button = parse_button(&button)?;
            controller.click_with(point, button, count).await?;
            Ok(())
        }
        Commands::Move { point } => {
            controller.mouse_move(parse_point(&point)?).await?;
            Ok(())
        }
        Commands::Drag { from, to } => {
            controller
                .drag(parse_point(&from)?, parse_point(&to)?)
                .await?;
            Ok(())
        }
        Commands::Type { text } => {
            controller.type_text(&text).await?;
            Ok(())
        }
        Commands::Press { keys } => {
            let chord: Vec<KeyPress> = keys.iter().map(|key| KeyPress::new(key.as_str())).collect();
            controller.press(&chord).await?;
            Ok(())
        }
        Commands::Clear { point } => {
            controller.clear_input(parse_point(&point)?).await?;
            Ok(())
        }
        Commands::Scroll {
            direction,
            distance,
            edge,
        } => cmd_scroll(controller, &direction, distance, edge).await,
        Commands::Screenshot { output } => cmd_screenshot(controller, &output).await,
        Commands::Eval { expression } => {
            let response = controller.evaluate(&expression).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Tree => {
            let page = controller.page_content().await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
            Ok(())
        }
        Commands::WaitIdle => {
            controller.wait_until_network_idle().await?;
            println!("Network idle.");
            Ok(())
        }
    }
}

/// List debuggable tabs.
async fn cmd_tabs(
    controller: &RemoteDebugController,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let tabs = controller.tab_list().await?;

    if tabs.is_empty() {
        println!("No debuggable tabs found.");
        return Ok(());
    }

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&tabs)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<36} {:<7} {:<42} {}", "ID", "ACTIVE", "TITLE", "URL");
            println!("{}", "-".repeat(110));
            for tab in tabs {
                let active = if tab.current_active_tab { "yes" } else { "-" };
                println!(
                    "{:<36} {:<7} {:<42} {}",
                    tab.id.as_str(),
                    active,
                    truncate(&tab.title, 40),
                    tab.url
                );
            }
        }
    }

    Ok(())
}

async fn cmd_scroll(
    controller: &RemoteDebugController,
    direction: &str,
    distance: Option<f64>,
    edge: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match (direction, edge) {
        ("up", true) => controller.scroll_until_top(None).await?,
        ("down", true) => controller.scroll_until_bottom(None).await?,
        ("left", true) => controller.scroll_until_left(None).await?,
        ("right", true) => controller.scroll_until_right(None).await?,
        ("up", false) => controller.scroll_up(distance, None).await?,
        ("down", false) => controller.scroll_down(distance, None).await?,
        ("left", false) => controller.scroll_left(distance, None).await?,
        ("right", false) => controller.scroll_right(distance, None).await?,
        (other, _) => return Err(format!("unknown scroll direction '{}'", other).into()),
    }
    Ok(())
}

/// Capture a screenshot and write it as a JPEG file.
async fn cmd_screenshot(
    controller: &RemoteDebugController,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data_uri = controller.screenshot_base64().await?;
    let encoded = data_uri
        .split_once("base64,")
        .map(|(_, data)| data)
        .ok_or("screenshot response was not a base64 data URI")?;

    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
    std::fs::write(output, &bytes)?;
    info!("saved {} bytes to {}", bytes.len(), output.display());
    println!("{}", output.display());
    Ok(())
}

/// Shorten a string for table display.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
