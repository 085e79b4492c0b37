//! In-memory transport double for controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use formpilot_protocols::{DebuggerTransport, TabId, TabInfo, TransportError};
use parking_lot::Mutex;
use serde_json::{Value, json};

type CommandResponder = Box<dyn Fn(&str, &Value) -> Result<Value, TransportError> + Send + Sync>;

/// One observed transport operation, in call order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransportCall {
    ActiveTab,
    ListTabs,
    TabUrl(TabId),
    ActivateTab(TabId),
    Attach(TabId),
    Detach(TabId),
    Command {
        tab: TabId,
        method: String,
        params: Value,
    },
    FetchResource(String),
}

/// Scriptable [`DebuggerTransport`] that records every call.
///
/// Commands answer `{}` unless a responder closure or a queued result
/// says otherwise; the spawned overlay refresh can then fire at any
/// point without disturbing scripted tests.
#[derive(Default)]
pub(crate) struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    active_tab: Mutex<Option<TabId>>,
    tabs: Mutex<Vec<TabInfo>>,
    urls: Mutex<HashMap<TabId, String>>,
    resources: Mutex<HashMap<String, String>>,
    command_results: Mutex<VecDeque<Result<Value, TransportError>>>,
    responder: Mutex<Option<CommandResponder>>,
    attach_results: Mutex<VecDeque<Result<(), TransportError>>>,
    detach_results: Mutex<VecDeque<Result<(), TransportError>>>,
    activate_results: Mutex<VecDeque<Result<(), TransportError>>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport with one focused tab showing `url`.
    pub(crate) fn with_page(url: &str) -> Arc<Self> {
        let transport = Self::new();
        transport.set_active_tab("tab-1");
        transport.set_tab_url("tab-1", url);
        transport
    }

    pub(crate) fn set_active_tab(&self, tab: &str) {
        *self.active_tab.lock() = Some(TabId::new(tab));
    }

    pub(crate) fn set_tab_url(&self, tab: &str, url: &str) {
        self.urls.lock().insert(TabId::new(tab), url.to_string());
    }

    pub(crate) fn add_tab(&self, info: TabInfo) {
        self.tabs.lock().push(info);
    }

    pub(crate) fn set_resource(&self, path: &str, content: &str) {
        self.resources
            .lock()
            .insert(path.to_string(), content.to_string());
    }

    pub(crate) fn queue_command_result(&self, result: Result<Value, TransportError>) {
        self.command_results.lock().push_back(result);
    }

    pub(crate) fn queue_attach_result(&self, result: Result<(), TransportError>) {
        self.attach_results.lock().push_back(result);
    }

    pub(crate) fn queue_detach_result(&self, result: Result<(), TransportError>) {
        self.detach_results.lock().push_back(result);
    }

    pub(crate) fn queue_activate_result(&self, result: Result<(), TransportError>) {
        self.activate_results.lock().push_back(result);
    }

    pub(crate) fn set_responder(
        &self,
        responder: impl Fn(&str, &Value) -> Result<Value, TransportError> + Send + Sync + 'static,
    ) {
        *self.responder.lock() = Some(Box::new(responder));
    }

    pub(crate) fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().clone()
    }

    /// Params of every command dispatched with `method`, in order.
    pub(crate) fn commands(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Command {
                    method: m, params, ..
                } if m == method => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn command_count(&self, method: &str) -> usize {
        self.commands(method).len()
    }

    pub(crate) fn attach_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, TransportCall::Attach(_)))
            .count()
    }

    pub(crate) fn detach_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, TransportCall::Detach(_)))
            .count()
    }

    pub(crate) fn fetch_count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, TransportCall::FetchResource(p) if p == path))
            .count()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl DebuggerTransport for MockTransport {
    async fn active_tab(&self) -> Result<TabId, TransportError> {
        self.record(TransportCall::ActiveTab);
        self.active_tab
            .lock()
            .clone()
            .ok_or_else(|| TransportError::TabNotFound("no active tab".to_string()))
    }

    async fn list_tabs(&self) -> Result<Vec<TabInfo>, TransportError> {
        self.record(TransportCall::ListTabs);
        Ok(self.tabs.lock().clone())
    }

    async fn tab_url(&self, tab: &TabId) -> Result<String, TransportError> {
        self.record(TransportCall::TabUrl(tab.clone()));
        self.urls
            .lock()
            .get(tab)
            .cloned()
            .ok_or_else(|| TransportError::TabNotFound(tab.to_string()))
    }

    async fn activate_tab(&self, tab: &TabId) -> Result<(), TransportError> {
        self.record(TransportCall::ActivateTab(tab.clone()));
        self.activate_results.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn attach(&self, tab: &TabId) -> Result<(), TransportError> {
        self.record(TransportCall::Attach(tab.clone()));
        self.attach_results.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn detach(&self, tab: &TabId) -> Result<(), TransportError> {
        self.record(TransportCall::Detach(tab.clone()));
        self.detach_results.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn send_command(
        &self,
        tab: &TabId,
        method: &str,
        params: Value,
    ) -> Result<Value, TransportError> {
        self.record(TransportCall::Command {
            tab: tab.clone(),
            method: method.to_string(),
            params: params.clone(),
        });
        if let Some(responder) = self.responder.lock().as_ref() {
            return responder(method, &params);
        }
        self.command_results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({})))
    }

    async fn fetch_resource(&self, path: &str) -> Result<String, TransportError> {
        self.record(TransportCall::FetchResource(path.to_string()));
        self.resources
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::ResourceNotFound(path.to_string()))
    }
}
