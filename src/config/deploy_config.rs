use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::errors::{DeployError, Result};
use crate::core::models::spec::Spec;

/// Deploy file used when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "./stagehand.deploy.yaml";

/// Instance name reserved for "every instance of an environment".
pub const ALL_INSTANCES: &str = "all";

const DEFAULT_CONTAINER_REPO: &str = "premiereglobal/kube-vault-deploy";
const DEFAULT_CONTAINER_TAG: &str = "0.3.3";
const DEFAULT_DEPLOY_DIRECTORY: &str = "./";
const DEFAULT_DEPLOY_SCRIPT: &str = "deploy.sh";

/// Root of a deploy file.
///
/// ```yaml
/// deployment: { directory, script, container: { repo, tag } }
/// global: { spec: ... }
/// environments:
///   - name: prod
///     spec: ...
///     instances:
///       - name: us-west-2
///         spec: ...
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub deployment: Deployment,
    #[serde(default, deserialize_with = "null_as_default")]
    pub global: Global,
    #[serde(default, deserialize_with = "null_as_default")]
    pub environments: Vec<Environment>,
    #[serde(skip)]
    config_path: PathBuf,
}

/// Where the deploy assets live and which container runs them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub script: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub container: Container,
    #[serde(skip)]
    full_directory_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Global {
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: Spec,
}

/// A deployment environment (dev, stage, prod, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: Spec,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub remove_all_prompt: bool,
}

/// An instance of a deployment within an environment (e.g. us-west-2 in prod).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: Spec,
}

/// A present-but-empty YAML key (`spec:`) reads as the default value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl DeployConfig {
    /// Load and validate the deploy file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                DeployError::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DeployError::ConfigUnreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Self::from_yaml(&content, path)
    }

    /// Parse deploy file content as if it had been read from `path`.
    ///
    /// Applies defaults, validates names and tool pins, and resolves the
    /// deploy directory relative to the directory containing `path`.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let mut config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(content).map_err(|e| DeployError::ConfigMalformed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?
        };

        config.config_path = path.to_path_buf();
        config.apply_defaults();
        config.validate()?;

        let config_abs = std::path::absolute(path)?;
        let config_dir = config_abs.parent().unwrap_or(Path::new("/"));
        config.deployment.full_directory_path =
            clean_join(config_dir, Path::new(&config.deployment.directory));

        Ok(config)
    }

    /// Path this config was loaded from.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Look up an environment by name.
    pub fn environment(&self, name: &str) -> Result<&Environment> {
        self.environments
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DeployError::EnvironmentNotFound {
                name: name.to_string(),
                available: join_names(self.environments.iter().map(|e| e.name.as_str())),
            })
    }

    fn apply_defaults(&mut self) {
        let deployment = &mut self.deployment;
        set_default(&mut deployment.container.repo, DEFAULT_CONTAINER_REPO);
        set_default(&mut deployment.container.tag, DEFAULT_CONTAINER_TAG);
        set_default(&mut deployment.directory, DEFAULT_DEPLOY_DIRECTORY);
        set_default(&mut deployment.script, DEFAULT_DEPLOY_SCRIPT);
    }

    /// Structural checks that do not need merging.
    fn validate(&self) -> Result<()> {
        validate_spec(&self.global.spec, "global spec")?;

        let mut env_names = HashSet::new();
        for environment in &self.environments {
            if environment.name.is_empty() {
                return Err(invalid("environment with an empty name found".into()));
            }
            if !env_names.insert(environment.name.as_str()) {
                return Err(invalid(format!(
                    "duplicate environment name '{}' found",
                    environment.name
                )));
            }
            if environment.instances.is_empty() {
                return Err(invalid(format!(
                    "no instances found for environment '{}'",
                    environment.name
                )));
            }

            validate_spec(
                &environment.spec,
                &format!("environment '{}'", environment.name),
            )?;

            let mut instance_names = HashSet::new();
            for instance in &environment.instances {
                if instance.name.is_empty() {
                    return Err(invalid(format!(
                        "instance with an empty name found in environment '{}'",
                        environment.name
                    )));
                }
                if !instance_names.insert(instance.name.as_str()) {
                    return Err(invalid(format!(
                        "duplicate instance name '{}' for environment '{}'",
                        instance.name, environment.name
                    )));
                }
                if instance.name.eq_ignore_ascii_case(ALL_INSTANCES) {
                    return Err(invalid(format!(
                        "instance name '{}' in environment '{}' is reserved",
                        instance.name, environment.name
                    )));
                }

                validate_spec(
                    &instance.spec,
                    &format!(
                        "instance '{}' in environment '{}'",
                        instance.name, environment.name
                    ),
                )?;
            }
        }

        Ok(())
    }
}

impl Deployment {
    /// Absolute deploy directory, relative to the config file's directory.
    pub fn full_directory_path(&self) -> &Path {
        &self.full_directory_path
    }

    /// Absolute path of the deploy script.
    pub fn script_path(&self) -> PathBuf {
        self.full_directory_path.join(&self.script)
    }
}

fn validate_spec(spec: &Spec, location: &str) -> Result<()> {
    for (name, tool) in &spec.tools {
        if name == "helm" && !tool.unset && tool.version.is_empty() {
            return Err(invalid(format!(
                "version detection not supported for helm, please specify a version \
                 in the `spec.tools.helm` config ({location})"
            )));
        }
    }

    let mut var_names = HashSet::new();
    for var in &spec.environment_vars {
        if var.name.is_empty() {
            return Err(invalid(format!("env var with an empty name in {location}")));
        }
        if !var_names.insert(var.name.as_str()) {
            return Err(invalid(format!(
                "duplicate env var '{}' in {location}",
                var.name
            )));
        }
    }

    Ok(())
}

fn invalid(detail: String) -> DeployError {
    DeployError::ConfigInvalid { detail }
}

fn set_default(value: &mut String, default: &str) {
    if value.is_empty() {
        *value = default.to_string();
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<_> = names.collect();
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

/// Join `rel` onto `base`, dropping `.` and folding `..` components.
fn clean_join(base: &Path, rel: &Path) -> PathBuf {
    let mut out = base.to_path_buf();
    for component in rel.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::Prefix(_) => {
                out = PathBuf::from(component.as_os_str());
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
