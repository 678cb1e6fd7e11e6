pub mod plan;
pub mod plan_helpers;
pub mod validate;
