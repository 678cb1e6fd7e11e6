use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::errors::{DeployError, Result};
use crate::core::models::spec::{Kubernetes, SecretRequest};

/// Env var carrying the serialized secret descriptor.
pub const SECRET_CONFIG_VAR: &str = "SECRET_CONFIG";

/// Keys exposed by the generated cluster-credential secret
/// (env var name, key inside the secret).
pub const CLUSTER_SECRET_KEYS: [(&str, &str); 3] = [
    ("CLUSTER_SERVER", "cluster-server"),
    ("CLUSTER_CA", "cluster-ca"),
    ("USER_TOKEN", "user-token"),
];

static SECRET_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s/]+(/[^\s/]+)*$").expect("valid secret path pattern"));
static ENV_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid env name pattern"));

/// The implicit secret request for an instance's cluster credentials.
pub fn cluster_credential_secret(kubernetes: &Kubernetes) -> SecretRequest {
    SecretRequest {
        secret_path: format!(
            "secret/kubernetes/{}/{}/kube-config",
            kubernetes.cluster, kubernetes.service_account
        ),
        ttl: None,
        set: CLUSTER_SECRET_KEYS
            .iter()
            .map(|(env, key)| (env.to_string(), key.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Serialize an instance's full secret list into the descriptor handed to
/// the secret-injection step.
///
/// Every request is checked first: the path must be a `/`-separated list
/// of non-empty, whitespace-free segments, and every exposed name must be
/// a valid env var name mapped to a non-empty key.
pub fn secret_descriptor(secrets: &[SecretRequest], instance: &str) -> Result<String> {
    let fail = |detail: String| DeployError::SecretConfigError {
        instance: instance.to_string(),
        detail,
    };

    for secret in secrets {
        if !SECRET_PATH_RE.is_match(&secret.secret_path) {
            return Err(fail(format!(
                "malformed secret path '{}'",
                secret.secret_path
            )));
        }
        for (name, key) in &secret.set {
            if !ENV_NAME_RE.is_match(name) {
                return Err(fail(format!(
                    "invalid env var name '{name}' for secret '{}'",
                    secret.secret_path
                )));
            }
            if key.is_empty() {
                return Err(fail(format!(
                    "empty secret key for '{name}' in secret '{}'",
                    secret.secret_path
                )));
            }
        }
    }

    serde_json::to_string(secrets).map_err(|e| fail(e.to_string()))
}
