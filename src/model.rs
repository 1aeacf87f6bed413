use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    pub status: String,
    pub ready: String,
    pub restarts: u32,
    pub age: String,
    pub cpu_request: String,
    pub cpu_limit: String,
    pub mem_request: String,
    pub mem_limit: String,
    pub node_name: String,
    #[serde(rename = "podIP")]
    pub pod_ip: String,
}

impl PodRecord {
    pub fn identity(&self) -> (&str, &str) {
        (&self.namespace, &self.name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceDescriptor {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub enum NamespaceScope {
    #[default]
    All,
    Named(String),
}

impl NamespaceScope {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == "all" {
            Self::All
        } else {
            Self::Named(value.to_string())
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Named(namespace) => Some(namespace),
        }
    }
}

impl Display for NamespaceScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Named(namespace) => write!(f, "{namespace}"),
        }
    }
}

#[cfg(test)]
pub(crate) fn pod(name: &str, namespace: &str, status: &str) -> PodRecord {
    PodRecord {
        name: name.to_string(),
        namespace: namespace.to_string(),
        status: status.to_string(),
        ready: "1/1".to_string(),
        ..PodRecord::default()
    }
}
