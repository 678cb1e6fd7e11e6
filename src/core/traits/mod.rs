pub mod secret_backend;
