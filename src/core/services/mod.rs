pub mod merge;
pub mod reserved_names;
pub mod secret_config;
pub mod spec_resolver;
pub mod template;
