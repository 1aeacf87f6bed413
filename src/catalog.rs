use anyhow::Result;
use tracing::{debug, warn};

use crate::api::PodSource;
use crate::model::{NamespaceDescriptor, NamespaceScope};
use crate::refresh::compact_error;

#[derive(Debug, Clone)]
pub struct NamespaceCatalog {
    namespaces: Vec<NamespaceDescriptor>,
    loading: bool,
    error: Option<String>,
}

impl Default for NamespaceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceCatalog {
    pub fn new() -> Self {
        Self {
            namespaces: Vec::new(),
            loading: true,
            error: None,
        }
    }

    pub fn namespaces(&self) -> &[NamespaceDescriptor] {
        &self.namespaces
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn finish(&mut self, result: Result<Vec<NamespaceDescriptor>>) {
        match result {
            Ok(namespaces) => {
                debug!("namespace catalog loaded count={}", namespaces.len());
                self.namespaces = namespaces;
                self.error = None;
            }
            Err(error) => {
                let message = compact_error(&error);
                warn!("namespace catalog failed: {message}");
                self.namespaces.clear();
                self.error = Some(message);
            }
        }
        self.loading = false;
    }

    pub async fn load<S: PodSource>(&mut self, source: &S) {
        self.loading = true;
        let result = source.list_namespaces().await;
        self.finish(result);
    }

    pub fn scope_choices(&self) -> Vec<NamespaceScope> {
        std::iter::once(NamespaceScope::All)
            .chain(
                self.namespaces
                    .iter()
                    .map(|namespace| NamespaceScope::Named(namespace.name.clone())),
            )
            .collect()
    }
}
