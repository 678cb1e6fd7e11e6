use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::deploy_config::{ALL_INSTANCES, Container};
use crate::core::errors::{DeployError, Result};
use crate::core::models::spec::{EnvironmentVar, Kubernetes, SecretRequest, ToolConfig};

/// The final merged configuration for one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSpec {
    pub kubernetes: Kubernetes,
    /// Merged user env vars, without anything injected by Stagehand.
    pub environment_vars: Vec<EnvironmentVar>,
    /// Rendered template text, when the template produced output.
    pub template_output: Option<String>,
    /// Global, environment and instance secrets, then the generated
    /// cluster-credential secret.
    pub secrets: Vec<SecretRequest>,
    pub tools: BTreeMap<String, ToolConfig>,
    pub add_confirmation_prompt: bool,
}

/// Collects the pieces of a [`ResolvedSpec`] as resolution proceeds.
///
/// Starts from the resolved cluster target. Nothing is readable until
/// [`finalize`](Self::finalize), so a partially merged spec can never leak
/// out of a failed resolution.
#[derive(Debug)]
pub struct ResolvedSpecBuilder {
    kubernetes: Kubernetes,
    environment_vars: Vec<EnvironmentVar>,
    template_output: Option<String>,
    secrets: Vec<SecretRequest>,
    tools: BTreeMap<String, ToolConfig>,
    add_confirmation_prompt: bool,
}

impl ResolvedSpecBuilder {
    pub fn new(kubernetes: Kubernetes) -> Self {
        Self {
            kubernetes,
            environment_vars: Vec::new(),
            template_output: None,
            secrets: Vec::new(),
            tools: BTreeMap::new(),
            add_confirmation_prompt: false,
        }
    }

    pub fn environment_vars(&mut self, vars: Vec<EnvironmentVar>) -> &mut Self {
        self.environment_vars = vars;
        self
    }

    pub fn template_output(&mut self, output: Option<String>) -> &mut Self {
        self.template_output = output;
        self
    }

    pub fn secrets(&mut self, secrets: Vec<SecretRequest>) -> &mut Self {
        self.secrets = secrets;
        self
    }

    pub fn secret(&mut self, secret: SecretRequest) -> &mut Self {
        self.secrets.push(secret);
        self
    }

    pub fn tools(&mut self, tools: BTreeMap<String, ToolConfig>) -> &mut Self {
        self.tools = tools;
        self
    }

    pub fn add_confirmation_prompt(&mut self, prompt: bool) -> &mut Self {
        self.add_confirmation_prompt = prompt;
        self
    }

    /// Merged user env vars collected so far.
    pub fn current_environment_vars(&self) -> &[EnvironmentVar] {
        &self.environment_vars
    }

    /// User secrets collected so far.
    pub fn current_secrets(&self) -> &[SecretRequest] {
        &self.secrets
    }

    pub fn finalize(self) -> ResolvedSpec {
        ResolvedSpec {
            kubernetes: self.kubernetes,
            environment_vars: self.environment_vars,
            template_output: self.template_output,
            secrets: self.secrets,
            tools: self.tools,
            add_confirmation_prompt: self.add_confirmation_prompt,
        }
    }
}

/// One instance, resolved and ready to hand to the deploy invoker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedInstance {
    pub environment: String,
    pub instance: String,
    pub spec: ResolvedSpec,
    /// The complete process environment for the deploy script, in order.
    pub deploy_env: Vec<EnvironmentVar>,
}

impl ResolvedInstance {
    /// Value of a var in the final deploy environment.
    #[cfg(test)]
    pub fn deploy_var(&self, name: &str) -> Option<&str> {
        self.deploy_env
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }

    /// Copy with the values of `names` in the deploy environment masked.
    pub fn masked(&self, names: &[&str]) -> Self {
        let mut copy = self.clone();
        for var in &mut copy.deploy_env {
            if names.contains(&var.name.as_str()) && !var.value.is_empty() {
                var.value = "********".to_string();
            }
        }
        copy
    }
}

/// Deployment assets with their paths resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDeployment {
    pub directory: PathBuf,
    pub script_path: PathBuf,
    pub container: Container,
}

/// Every instance of a deploy file, resolved in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployPlan {
    pub deployment: ResolvedDeployment,
    pub instances: Vec<ResolvedInstance>,
}

impl DeployPlan {
    /// Pick instances to deploy.
    ///
    /// No environment selects everything. With an environment, no
    /// instance or `all` (any case) selects all of its instances.
    pub fn select(
        &self,
        environment: Option<&str>,
        instance: Option<&str>,
    ) -> Result<Vec<&ResolvedInstance>> {
        let Some(environment) = environment else {
            return Ok(self.instances.iter().collect());
        };

        let in_env: Vec<&ResolvedInstance> = self
            .instances
            .iter()
            .filter(|i| i.environment == environment)
            .collect();

        if in_env.is_empty() {
            let mut available: Vec<&str> = Vec::new();
            for i in &self.instances {
                if !available.contains(&i.environment.as_str()) {
                    available.push(&i.environment);
                }
            }
            return Err(DeployError::EnvironmentNotFound {
                name: environment.to_string(),
                available: available.join(", "),
            });
        }

        match instance {
            None => Ok(in_env),
            Some(name) if name.eq_ignore_ascii_case(ALL_INSTANCES) => Ok(in_env),
            Some(name) => {
                let picked: Vec<_> = in_env
                    .iter()
                    .copied()
                    .filter(|i| i.instance == name)
                    .collect();
                if picked.is_empty() {
                    return Err(DeployError::InstanceNotFound {
                        name: name.to_string(),
                        environment: environment.to_string(),
                        available: in_env
                            .iter()
                            .map(|i| i.instance.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    });
                }
                Ok(picked)
            }
        }
    }
}
