use std::path::Path;

use crate::cli::output;
use crate::core::errors::Result;

/// Execute the `stagehand validate` command.
///
/// Loads the deploy file and resolves every instance, failing on the
/// first configuration defect. Nothing is deployed.
pub fn execute(config: Option<&Path>) -> Result<()> {
    let (config, plan) = super::plan_helpers::load_plan(config)?;

    output::header(&format!("Validating {}", config.config_path().display()));

    for environment in &config.environments {
        output::success(&format!(
            "{}: {} instance(s)",
            environment.name,
            environment.instances.len()
        ));
    }

    let script = &plan.deployment.script_path;
    if !script.is_file() {
        output::warning(&format!("Deploy script not found at {}", script.display()));
    }

    output::success(&format!(
        "{} instance(s) resolved, configuration is valid",
        plan.instances.len()
    ));

    Ok(())
}
