use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The spec of a given tier (global, environment or instance).
///
/// Every field is optional in the deploy file; an absent `spec:` block
/// deserializes to `Spec::default()` so callers never deal with a
/// missing spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    #[serde(default)]
    pub kubernetes: Kubernetes,
    #[serde(default)]
    pub secrets: Vec<SecretRequest>,
    #[serde(default, rename = "env")]
    pub environment_vars: Vec<EnvironmentVar>,
    #[serde(default)]
    pub add_confirmation_prompt: bool,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolConfig>,
}

/// Kubernetes cluster target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kubernetes {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub service_account: String,
}

/// A shell env var injected into the deployment environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl EnvironmentVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A request to expose keys of a secret as env vars at deploy time.
///
/// `set` maps the exposed env var name to the key inside the secret.
/// The secret itself is never read here; the request is only carried
/// through to the secret descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRequest {
    pub secret_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub set: BTreeMap<String, String>,
}

impl SecretRequest {
    /// Names of the env vars this request exposes.
    pub fn exposed_names(&self) -> impl Iterator<Item = &str> {
        self.set.keys().map(String::as_str)
    }
}

/// Tool version pin for one tier. `unset` removes a tool inherited from
/// a less specific tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unset: bool,
}
