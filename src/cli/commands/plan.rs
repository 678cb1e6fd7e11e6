use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::cli::output;
use crate::config::deploy_config::ALL_INSTANCES;
use crate::core::errors::Result;
use crate::core::models::resolved::{ResolvedDeployment, ResolvedInstance};
use crate::core::services::reserved_names::VAULT_TOKEN_VAR;

/// JSON shape of `stagehand plan --json`.
#[derive(Serialize)]
struct PlanView<'a> {
    deployment: &'a ResolvedDeployment,
    instances: Vec<ResolvedInstance>,
}

/// Execute the `stagehand plan` command.
///
/// Resolves the deploy file and prints, for each selected instance, the
/// exact environment the deploy script would receive. The Vault token is
/// masked.
pub fn execute(
    config: Option<&Path>,
    env: Option<&str>,
    instance: Option<&str>,
    json: bool,
) -> Result<()> {
    let (config, plan) = super::plan_helpers::load_plan(config)?;
    let selected: Vec<ResolvedInstance> = plan
        .select(env, instance)?
        .into_iter()
        .map(|i| i.masked(&[VAULT_TOKEN_VAR]))
        .collect();

    if json {
        let view = PlanView {
            deployment: &plan.deployment,
            instances: selected,
        };
        let rendered = serde_json::to_string_pretty(&view).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    if let Some(env) = env {
        let all = instance.is_none_or(|i| i.eq_ignore_ascii_case(ALL_INSTANCES));
        if all && config.environment(env)?.remove_all_prompt {
            output::warning(&format!(
                "Environment '{env}' asks for confirmation before deploying to all instances"
            ));
        }
    }

    output::header(&format!(
        "Deploy script: {}",
        plan.deployment.script_path.display()
    ));
    println!(
        "  Container: {}:{}",
        plan.deployment.container.repo, plan.deployment.container.tag
    );

    for resolved in &selected {
        print_instance(resolved);
    }

    Ok(())
}

fn print_instance(resolved: &ResolvedInstance) {
    let spec = &resolved.spec;

    output::header(&format!("{}/{}", resolved.environment, resolved.instance));
    println!(
        "  Cluster: {} (service account {})",
        spec.kubernetes.cluster.cyan(),
        spec.kubernetes.service_account.cyan()
    );

    if spec.add_confirmation_prompt {
        output::warning("Confirmation prompt enabled");
    }

    if !spec.tools.is_empty() {
        let tools: Vec<String> = spec
            .tools
            .iter()
            .map(|(name, tool)| format!("{name} {}", tool.version))
            .collect();
        println!("  Tools: {}", tools.join(", "));
    }

    println!("  Secrets:");
    for secret in &spec.secrets {
        let names: Vec<&str> = secret.exposed_names().collect();
        println!("    • {} → {}", secret.secret_path, names.join(", "));
    }

    println!("  Environment:");
    for var in &resolved.deploy_env {
        println!("    {}={}", var.name.bold(), var.value.escape_debug());
    }
}
