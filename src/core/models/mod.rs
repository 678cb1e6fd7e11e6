pub mod resolved;
pub mod spec;
