use std::path::{Path, PathBuf};

use crate::adapters::vault::env_backend::VaultEnvBackend;
use crate::cli::output;
use crate::config::deploy_config::{DEFAULT_CONFIG_FILE, DeployConfig};
use crate::core::errors::Result;
use crate::core::models::resolved::DeployPlan;
use crate::core::services::spec_resolver::SpecResolver;

/// Deploy file path from `--config` / `STAGEHAND_DEPLOY_FILE`, or the default.
pub fn config_path(custom: Option<&Path>) -> PathBuf {
    match custom {
        Some(path) => path.to_path_buf(),
        None => {
            output::detail(&format!(
                "Deployment file not specified, using {DEFAULT_CONFIG_FILE}"
            ));
            PathBuf::from(DEFAULT_CONFIG_FILE)
        }
    }
}

/// Load the deploy file and resolve every instance against Vault
/// connection details from the environment.
pub fn load_plan(custom: Option<&Path>) -> Result<(DeployConfig, DeployPlan)> {
    let path = config_path(custom);
    let config = DeployConfig::load(&path)?;
    output::detail(&format!(
        "Loaded {} environment(s) from {}",
        config.environments.len(),
        config.config_path().display()
    ));

    let backend = VaultEnvBackend::from_env();
    let plan = SpecResolver::new(&backend).resolve(&config)?;

    for instance in &plan.instances {
        output::detail(&format!(
            "Resolved {}/{}: cluster {}, {} env var(s), {} secret(s)",
            instance.environment,
            instance.instance,
            instance.spec.kubernetes.cluster,
            instance.spec.environment_vars.len(),
            instance.spec.secrets.len()
        ));
    }

    Ok((config, plan))
}
