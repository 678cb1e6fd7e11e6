use std::path::PathBuf;

/// All domain errors for Stagehand.
///
/// Every variant names the environment, instance or field at fault so
/// the message alone is enough to fix the deploy file. None of these are
/// transient: a failed run is a configuration defect and is never retried.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(
        "No deployment config file exists at: {path}\n\n  \
         Create one, or point Stagehand at it:\n    \
         → stagehand --config path/to/stagehand.deploy.yaml <command>\n    \
         → export STAGEHAND_DEPLOY_FILE=path/to/stagehand.deploy.yaml"
    )]
    ConfigNotFound { path: PathBuf },

    #[error("Deployment config file {path} could not be read: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Deployment config file {path} is not valid YAML: {detail}\n\n  \
         Expected layout:\n    \
         deployment: {{ directory, script, container: {{ repo, tag }} }}\n    \
         global: {{ spec: ... }}\n    \
         environments: [ {{ name, spec, instances: [ {{ name, spec }} ] }} ]"
    )]
    ConfigMalformed { path: PathBuf, detail: String },

    #[error("Invalid deployment config: {detail}")]
    ConfigInvalid { detail: String },

    #[error(
        "Kubernetes {field} is not set for instance '{instance}' in environment '{environment}'\n\n  \
         Set spec.kubernetes.{field} on the instance, its environment, or the global spec."
    )]
    MissingRequiredField {
        field: String,
        environment: String,
        instance: String,
    },

    #[error(
        "Unable to parse template variable '{variable}' for instance '{instance}' \
         in environment '{environment}': value must be a comma separated list"
    )]
    TemplateListMalformed {
        variable: String,
        environment: String,
        instance: String,
    },

    #[error(
        "Template for instance '{instance}' in environment '{environment}' could not be rendered: {detail}"
    )]
    TemplateRenderError {
        environment: String,
        instance: String,
        detail: String,
    },

    #[error(
        "Reserved environment variable name '{name}' found in config for instance '{instance}' \
         in environment '{environment}'\n\n  \
         This name is injected by Stagehand at deploy time. Rename the env var or secret key."
    )]
    ReservedNameConflict {
        name: String,
        environment: String,
        instance: String,
    },

    #[error("Error making secret config for instance '{instance}': {detail}")]
    SecretConfigError { instance: String, detail: String },

    #[error(
        "Secret backend error: {detail}\n\n  \
         Check VAULT_ADDR and VAULT_TOKEN (or ~/.vault-token)."
    )]
    SecretBackend { detail: String },

    #[error(
        "Environment '{name}' not found\n\n  \
         Available environments: {available}"
    )]
    EnvironmentNotFound { name: String, available: String },

    #[error(
        "Instance '{name}' not found in environment '{environment}'\n\n  \
         Available instances: {available} (or 'all')"
    )]
    InstanceNotFound {
        name: String,
        environment: String,
        available: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_instance_and_environment() {
        let err = DeployError::MissingRequiredField {
            field: "cluster".into(),
            environment: "prod".into(),
            instance: "us-west-2".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with(
            "Kubernetes cluster is not set for instance 'us-west-2' in environment 'prod'"
        ));
        assert!(msg.contains("spec.kubernetes.cluster"));
    }

    #[test]
    fn reserved_conflict_names_key() {
        let err = DeployError::ReservedNameConflict {
            name: "VAULT_TOKEN".into(),
            environment: "dev".into(),
            instance: "east".into(),
        };
        assert!(err.to_string().contains("'VAULT_TOKEN'"));
        assert!(err.to_string().contains("'east'"));
    }

    #[test]
    fn malformed_message_renders_literal_braces() {
        let err = DeployError::ConfigMalformed {
            path: PathBuf::from("stagehand.deploy.yaml"),
            detail: "bad indent".into(),
        };
        assert!(err.to_string().contains("container: { repo, tag }"));
    }
}
