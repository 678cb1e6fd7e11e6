pub mod env_backend;
