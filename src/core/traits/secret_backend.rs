use crate::core::errors::Result;

/// Port for the secret backend that deploy scripts authenticate against.
///
/// Only the connection details are fetched here. Resolving secret paths
/// to values happens later, driven by the serialized secret descriptor.
pub trait SecretBackend: Send + Sync {
    /// Token the deploy run authenticates with.
    fn token(&self) -> Result<String>;

    /// Address of the backend (e.g. `https://vault.example.com:8200`).
    fn address(&self) -> Result<String>;
}
