use crate::config::deploy_config::{DeployConfig, Environment, Instance};
use crate::core::errors::{DeployError, Result};
use crate::core::models::resolved::{
    DeployPlan, ResolvedDeployment, ResolvedInstance, ResolvedSpecBuilder,
};
use crate::core::models::spec::{EnvironmentVar, Kubernetes};
use crate::core::services::merge::{self, Tiers};
use crate::core::services::reserved_names::{
    DEPLOY_CLUSTER_VAR, DEPLOY_ENVIRONMENT_VAR, DEPLOY_FLAG_VAR, DEPLOY_INSTANCE_VAR,
    ReservedNames, VAULT_ADDR_VAR, VAULT_TOKEN_VAR,
};
use crate::core::services::secret_config::{
    SECRET_CONFIG_VAR, cluster_credential_secret, secret_descriptor,
};
use crate::core::services::template::{self, TEMPLATE_OUT_VAR, TemplateError};
use crate::core::traits::secret_backend::SecretBackend;

/// Resolves every instance of a deploy file into its final spec and
/// deploy environment.
///
/// Instances are resolved one at a time in declaration order. The first
/// failure aborts the whole run; no partial plan is returned.
pub struct SpecResolver<'a> {
    backend: &'a dyn SecretBackend,
}

impl<'a> SpecResolver<'a> {
    pub fn new(backend: &'a dyn SecretBackend) -> Self {
        Self { backend }
    }

    /// Resolve all environments and instances of `config`.
    pub fn resolve(&self, config: &DeployConfig) -> Result<DeployPlan> {
        let mut instances = Vec::new();
        for environment in &config.environments {
            for instance in &environment.instances {
                instances.push(self.resolve_instance(config, environment, instance)?);
            }
        }

        let deployment = &config.deployment;
        Ok(DeployPlan {
            deployment: ResolvedDeployment {
                directory: deployment.full_directory_path().to_path_buf(),
                script_path: deployment.script_path(),
                container: deployment.container.clone(),
            },
            instances,
        })
    }

    /// Resolve one instance against its environment and the global spec.
    ///
    /// Steps run in data-dependency order: cluster target, env vars and
    /// template, tools, secrets, reserved-name check, secret descriptor.
    pub fn resolve_instance(
        &self,
        config: &DeployConfig,
        environment: &Environment,
        instance: &Instance,
    ) -> Result<ResolvedInstance> {
        let env_name = environment.name.as_str();
        let inst_name = instance.name.as_str();
        let tiers = Tiers {
            global: &config.global.spec,
            environment: &environment.spec,
            instance: &instance.spec,
        };

        let kubernetes = resolve_kubernetes(&tiers, env_name, inst_name)?;
        let mut builder = ResolvedSpecBuilder::new(kubernetes.clone());

        let vars = merge::merge_env_vars(
            tiers
                .most_specific_first()
                .map(|spec| spec.environment_vars.as_slice()),
        );
        let rendered = template::render_env_template(&vars)
            .map_err(|e| template_error(e, env_name, inst_name))?;
        builder.environment_vars(vars).template_output(rendered);

        builder.tools(merge::merge_tools(
            tiers.least_specific_first().map(|spec| &spec.tools),
        ));

        builder.secrets(merge::concat_secrets(
            tiers
                .least_specific_first()
                .map(|spec| spec.secrets.as_slice()),
        ));

        builder.add_confirmation_prompt(
            tiers
                .least_specific_first()
                .iter()
                .any(|spec| spec.add_confirmation_prompt),
        );

        let token = self.backend.token()?;
        let address = self.backend.address()?;
        let operational = vec![
            EnvironmentVar::new(VAULT_ADDR_VAR, address),
            EnvironmentVar::new(VAULT_TOKEN_VAR, token),
            EnvironmentVar::new(DEPLOY_ENVIRONMENT_VAR, env_name),
            EnvironmentVar::new(DEPLOY_INSTANCE_VAR, inst_name),
            EnvironmentVar::new(DEPLOY_CLUSTER_VAR, kubernetes.cluster.as_str()),
        ];
        let generated = vec![cluster_credential_secret(&kubernetes)];

        ReservedNames::for_instance(&operational, &generated).check(
            builder.current_environment_vars(),
            builder.current_secrets(),
            env_name,
            inst_name,
        )?;

        for secret in generated {
            builder.secret(secret);
        }
        let spec = builder.finalize();
        let descriptor = secret_descriptor(&spec.secrets, inst_name)?;

        let mut deploy_env = spec.environment_vars.clone();
        if let Some(output) = &spec.template_output {
            deploy_env.push(EnvironmentVar::new(TEMPLATE_OUT_VAR, output.as_str()));
        }
        deploy_env.extend(operational);
        deploy_env.push(EnvironmentVar::new(SECRET_CONFIG_VAR, descriptor));
        deploy_env.push(EnvironmentVar::new(DEPLOY_FLAG_VAR, "true"));

        Ok(ResolvedInstance {
            environment: env_name.to_string(),
            instance: inst_name.to_string(),
            spec,
            deploy_env,
        })
    }
}

/// Cluster and service account: first non-empty value, instance first.
/// The service account is checked before the cluster.
fn resolve_kubernetes(tiers: &Tiers<'_>, environment: &str, instance: &str) -> Result<Kubernetes> {
    let missing = |field: &str| DeployError::MissingRequiredField {
        field: field.to_string(),
        environment: environment.to_string(),
        instance: instance.to_string(),
    };

    let service_account = merge::first_non_empty(
        tiers
            .most_specific_first()
            .map(|spec| spec.kubernetes.service_account.as_str()),
    )
    .ok_or_else(|| missing("serviceAccount"))?;

    let cluster = merge::first_non_empty(
        tiers
            .most_specific_first()
            .map(|spec| spec.kubernetes.cluster.as_str()),
    )
    .ok_or_else(|| missing("cluster"))?;

    Ok(Kubernetes {
        cluster: cluster.to_string(),
        service_account: service_account.to_string(),
    })
}

fn template_error(err: TemplateError, environment: &str, instance: &str) -> DeployError {
    match err {
        TemplateError::ListMalformed { variable } => DeployError::TemplateListMalformed {
            variable,
            environment: environment.to_string(),
            instance: instance.to_string(),
        },
        other => DeployError::TemplateRenderError {
            environment: environment.to_string(),
            instance: instance.to_string(),
            detail: other.to_string(),
        },
    }
}
