use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::api::PodSource;
use crate::model::{NamespaceScope, PodRecord};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RefreshPhase {
    Idle,
    Loading,
    Success,
    Failure,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshState {
    pub records: Vec<PodRecord>,
    pub loading: bool,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Local>>,
}

// Callers must not overlap refreshes: whichever result lands last wins.
#[derive(Debug, Clone)]
pub struct RefreshController {
    scope: NamespaceScope,
    phase: RefreshPhase,
    state: RefreshState,
}

impl RefreshController {
    pub fn new(scope: NamespaceScope) -> Self {
        Self {
            scope,
            phase: RefreshPhase::Idle,
            state: RefreshState::default(),
        }
    }

    pub fn scope(&self) -> &NamespaceScope {
        &self.scope
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    pub fn records(&self) -> &[PodRecord] {
        &self.state.records
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn begin(&mut self, scope: &NamespaceScope) {
        debug!("pod refresh started scope={scope}");
        self.scope = scope.clone();
        self.phase = RefreshPhase::Loading;
        self.state.loading = true;
        self.state.last_error = None;
    }

    pub fn finish(&mut self, result: Result<Vec<PodRecord>>) {
        match result {
            Ok(records) => {
                debug!(
                    "pod refresh finished scope={} pods={}",
                    self.scope,
                    records.len()
                );
                self.state.records = records;
                self.state.last_success = Some(Local::now());
                self.state.last_error = None;
                self.phase = RefreshPhase::Success;
            }
            Err(error) => {
                let message = compact_error(&error);
                warn!("pod refresh failed scope={}: {message}", self.scope);
                self.state.last_error = Some(message);
                self.phase = RefreshPhase::Failure;
            }
        }
        self.state.loading = false;
    }

    pub async fn refresh<S: PodSource>(&mut self, source: &S, scope: &NamespaceScope) {
        self.begin(scope);
        let result = source.list_pods(scope).await;
        self.finish(result);
    }
}

pub fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}
