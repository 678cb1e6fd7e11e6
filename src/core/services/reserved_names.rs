use std::collections::BTreeSet;

use crate::core::errors::{DeployError, Result};
use crate::core::models::spec::{EnvironmentVar, SecretRequest};
use crate::core::services::secret_config::SECRET_CONFIG_VAR;
use crate::core::services::template::TEMPLATE_OUT_VAR;

/// Marker flag set for every deploy run.
pub const DEPLOY_FLAG_VAR: &str = "STAGEHAND_DEPLOY";

pub const VAULT_ADDR_VAR: &str = "VAULT_ADDR";
pub const VAULT_TOKEN_VAR: &str = "VAULT_TOKEN";
pub const DEPLOY_ENVIRONMENT_VAR: &str = "DEPLOY_ENVIRONMENT";
pub const DEPLOY_INSTANCE_VAR: &str = "DEPLOY_INSTANCE";
pub const DEPLOY_CLUSTER_VAR: &str = "DEPLOY_CLUSTER";

/// Names injected regardless of instance.
const FIXED_NAMES: [&str; 3] = [SECRET_CONFIG_VAR, DEPLOY_FLAG_VAR, TEMPLATE_OUT_VAR];

/// The env var names an instance's configuration may not use.
///
/// Built per instance from the fixed names, the operational vars injected
/// for it, and the keys exposed by its generated secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedNames {
    names: BTreeSet<String>,
}

impl ReservedNames {
    pub fn for_instance(operational: &[EnvironmentVar], generated: &[SecretRequest]) -> Self {
        let names = FIXED_NAMES
            .iter()
            .map(|name| name.to_string())
            .chain(operational.iter().map(|var| var.name.clone()))
            .chain(
                generated
                    .iter()
                    .flat_map(|secret| secret.exposed_names().map(str::to_string)),
            )
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Fail on the first user env var or exposed secret key that shadows
    /// a reserved name.
    pub fn check(
        &self,
        vars: &[EnvironmentVar],
        secrets: &[SecretRequest],
        environment: &str,
        instance: &str,
    ) -> Result<()> {
        let user_names = vars
            .iter()
            .map(|var| var.name.as_str())
            .chain(secrets.iter().flat_map(SecretRequest::exposed_names));

        for name in user_names {
            if self.contains(name) {
                return Err(DeployError::ReservedNameConflict {
                    name: name.to_string(),
                    environment: environment.to_string(),
                    instance: instance.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::spec::Kubernetes;
    use crate::core::services::secret_config::cluster_credential_secret;

    fn reserved() -> ReservedNames {
        let operational = vec![
            EnvironmentVar::new(VAULT_ADDR_VAR, "https://vault:8200"),
            EnvironmentVar::new(VAULT_TOKEN_VAR, "s.token"),
            EnvironmentVar::new(DEPLOY_ENVIRONMENT_VAR, "prod"),
            EnvironmentVar::new(DEPLOY_INSTANCE_VAR, "east"),
            EnvironmentVar::new(DEPLOY_CLUSTER_VAR, "prod-east"),
        ];
        let generated = vec![cluster_credential_secret(&Kubernetes {
            cluster: "prod-east".into(),
            service_account: "deployer".into(),
        })];
        ReservedNames::for_instance(&operational, &generated)
    }

    fn secret_exposing(name: &str) -> SecretRequest {
        SecretRequest {
            secret_path: "secret/app".into(),
            ttl: None,
            set: [(name.to_string(), "key".to_string())].into(),
        }
    }

    #[test]
    fn contains_fixed_operational_and_generated_names() {
        let reserved = reserved();
        for name in [
            "SECRET_CONFIG",
            "STAGEHAND_DEPLOY",
            "STAGEHAND_TEMPLATE_OUT",
            "VAULT_ADDR",
            "VAULT_TOKEN",
            "DEPLOY_ENVIRONMENT",
            "DEPLOY_INSTANCE",
            "DEPLOY_CLUSTER",
            "CLUSTER_SERVER",
            "CLUSTER_CA",
            "USER_TOKEN",
        ] {
            assert!(reserved.contains(name), "{name} should be reserved");
        }
        assert!(!reserved.contains("STAGEHAND_TEMPLATE_IN"));
    }

    #[test]
    fn user_env_var_conflict_is_rejected() {
        let vars = vec![
            EnvironmentVar::new("APP", "x"),
            EnvironmentVar::new("VAULT_TOKEN", "mine"),
        ];

        let err = reserved().check(&vars, &[], "prod", "east").unwrap_err();

        match err {
            DeployError::ReservedNameConflict {
                name,
                environment,
                instance,
            } => {
                assert_eq!(name, "VAULT_TOKEN");
                assert_eq!(environment, "prod");
                assert_eq!(instance, "east");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn secret_exposed_key_conflict_is_rejected() {
        let secrets = vec![secret_exposing("USER_TOKEN")];
        assert!(reserved().check(&[], &secrets, "prod", "east").is_err());
    }

    #[test]
    fn names_are_case_sensitive() {
        let vars = vec![EnvironmentVar::new("vault_token", "x")];
        assert!(reserved().check(&vars, &[], "prod", "east").is_ok());
    }

    #[test]
    fn clean_config_passes() {
        let vars = vec![EnvironmentVar::new("APP", "x")];
        let secrets = vec![secret_exposing("DB_PASSWORD")];
        assert!(reserved().check(&vars, &secrets, "prod", "east").is_ok());
    }
}
