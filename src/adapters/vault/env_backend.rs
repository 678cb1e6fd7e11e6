use std::path::PathBuf;

use crate::core::errors::{DeployError, Result};
use crate::core::traits::secret_backend::SecretBackend;

/// Vault connection details taken from the environment, the same places
/// the `vault` CLI looks.
///
/// - Address: `VAULT_ADDR`
/// - Token: `VAULT_TOKEN`, falling back to the token helper file
///   `~/.vault-token` written by `vault login`
pub struct VaultEnvBackend {
    address: Option<String>,
    token: Option<String>,
    token_file: Option<PathBuf>,
}

impl VaultEnvBackend {
    /// Capture `VAULT_ADDR` / `VAULT_TOKEN` from the process environment.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("VAULT_ADDR").ok(),
            std::env::var("VAULT_TOKEN").ok(),
            dirs::home_dir().map(|home| home.join(".vault-token")),
        )
    }

    pub fn new(
        address: Option<String>,
        token: Option<String>,
        token_file: Option<PathBuf>,
    ) -> Self {
        Self {
            address: address.filter(|a| !a.trim().is_empty()),
            token: token.filter(|t| !t.trim().is_empty()),
            token_file,
        }
    }

    fn read_token_file(&self) -> Result<String> {
        let path = self.token_file.as_ref().ok_or_else(|| DeployError::SecretBackend {
            detail: "VAULT_TOKEN is not set and no home directory was found".into(),
        })?;

        if !path.is_file() {
            return Err(DeployError::SecretBackend {
                detail: format!(
                    "VAULT_TOKEN is not set and {} does not exist. Run 'vault login' first.",
                    path.display()
                ),
            });
        }

        let token = std::fs::read_to_string(path)?.trim().to_string();
        if token.is_empty() {
            return Err(DeployError::SecretBackend {
                detail: format!("token file {} is empty", path.display()),
            });
        }
        Ok(token)
    }
}

impl SecretBackend for VaultEnvBackend {
    fn token(&self) -> Result<String> {
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => self.read_token_file(),
        }
    }

    fn address(&self) -> Result<String> {
        self.address
            .clone()
            .ok_or_else(|| DeployError::SecretBackend {
                detail: "VAULT_ADDR is not set".into(),
            })
    }
}
