use std::collections::{BTreeMap, HashSet};

use crate::core::models::spec::{EnvironmentVar, SecretRequest, Spec, ToolConfig};

/// The three specs that apply to one instance.
///
/// Each merge rule below is a small pure function over these tiers. Rules
/// that let the more specific tier win walk `most_specific_first`; rules
/// that build on a base walk `least_specific_first`.
#[derive(Debug, Clone, Copy)]
pub struct Tiers<'a> {
    pub global: &'a Spec,
    pub environment: &'a Spec,
    pub instance: &'a Spec,
}

impl<'a> Tiers<'a> {
    pub fn most_specific_first(&self) -> [&'a Spec; 3] {
        [self.instance, self.environment, self.global]
    }

    pub fn least_specific_first(&self) -> [&'a Spec; 3] {
        [self.global, self.environment, self.instance]
    }
}

/// First non-empty value, tiers ordered most specific first.
pub fn first_non_empty<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    values.into_iter().find(|v| !v.is_empty())
}

/// Union of env vars by name; the more specific tier wins a collision.
///
/// Result order: every var of the most specific tier, then the vars of
/// each following tier whose names were not seen yet.
pub fn merge_env_vars<'a>(
    tiers: impl IntoIterator<Item = &'a [EnvironmentVar]>,
) -> Vec<EnvironmentVar> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for tier in tiers {
        for var in tier {
            if seen.insert(var.name.as_str()) {
                merged.push(var.clone());
            }
        }
    }

    merged
}

/// Plain concatenation, tiers ordered least specific first. No dedup.
pub fn concat_secrets<'a>(
    tiers: impl IntoIterator<Item = &'a [SecretRequest]>,
) -> Vec<SecretRequest> {
    tiers.into_iter().flatten().cloned().collect()
}

/// Tool maps layered on a base, tiers ordered least specific first.
///
/// Each tier overwrites matching entries, or removes them when its entry
/// has `unset` set.
pub fn merge_tools<'a>(
    tiers: impl IntoIterator<Item = &'a BTreeMap<String, ToolConfig>>,
) -> BTreeMap<String, ToolConfig> {
    let mut merged = BTreeMap::new();

    for tier in tiers {
        for (name, tool) in tier {
            if tool.unset {
                merged.remove(name);
            } else {
                merged.insert(name.clone(), tool.clone());
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<EnvironmentVar> {
        pairs
            .iter()
            .map(|(k, v)| EnvironmentVar::new(*k, *v))
            .collect()
    }

    fn secret(path: &str) -> SecretRequest {
        SecretRequest {
            secret_path: path.to_string(),
            ttl: None,
            set: BTreeMap::new(),
        }
    }

    fn tools(entries: &[(&str, &str, bool)]) -> BTreeMap<String, ToolConfig> {
        entries
            .iter()
            .map(|(name, version, unset)| {
                (
                    name.to_string(),
                    ToolConfig {
                        version: version.to_string(),
                        unset: *unset,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn first_non_empty_skips_blank_tiers() {
        assert_eq!(first_non_empty(["", "env-cluster", "global"]), Some("env-cluster"));
        assert_eq!(first_non_empty(["inst", "", "global"]), Some("inst"));
        assert_eq!(first_non_empty(["", "", ""]), None);
    }

    #[test]
    fn environment_overrides_global_var() {
        let global = vars(&[("X", "1")]);
        let environment = vars(&[("X", "2")]);

        let merged = merge_env_vars([&[][..], environment.as_slice(), global.as_slice()]);

        assert_eq!(merged, vars(&[("X", "2")]));
    }

    #[test]
    fn instance_overrides_environment_and_global_var() {
        let global = vars(&[("X", "1"), ("G", "g")]);
        let environment = vars(&[("X", "2"), ("E", "e")]);
        let instance = vars(&[("X", "3")]);

        let merged = merge_env_vars([
            instance.as_slice(),
            environment.as_slice(),
            global.as_slice(),
        ]);

        assert_eq!(merged, vars(&[("X", "3"), ("E", "e"), ("G", "g")]));
    }

    #[test]
    fn secrets_concatenate_in_tier_order() {
        let global = vec![secret("p1")];
        let environment = vec![secret("p2")];
        let instance = vec![secret("p3"), secret("p1")];

        let merged = concat_secrets([
            global.as_slice(),
            environment.as_slice(),
            instance.as_slice(),
        ]);

        let paths: Vec<_> = merged.iter().map(|s| s.secret_path.as_str()).collect();
        assert_eq!(paths, vec!["p1", "p2", "p3", "p1"]);
    }

    #[test]
    fn unset_removes_inherited_tool() {
        let global = tools(&[("helm", "v3.8.5", false)]);
        let environment = tools(&[("helm", "", true)]);
        let instance = BTreeMap::new();

        let merged = merge_tools([&global, &environment, &instance]);

        assert!(!merged.contains_key("helm"));
    }

    #[test]
    fn instance_readds_unset_tool() {
        let global = tools(&[("helm", "v3.8.5", false)]);
        let environment = tools(&[("helm", "", true)]);
        let instance = tools(&[("helm", "v3.9.0", false)]);

        let merged = merge_tools([&global, &environment, &instance]);

        assert_eq!(merged["helm"].version, "v3.9.0");
    }

    #[test]
    fn specific_tool_version_wins() {
        let global = tools(&[("helm", "v3.8.5", false), ("kubectl", "v1.25.0", false)]);
        let environment = tools(&[("kubectl", "v1.27.1", false)]);
        let instance = BTreeMap::new();

        let merged = merge_tools([&global, &environment, &instance]);

        assert_eq!(merged["helm"].version, "v3.8.5");
        assert_eq!(merged["kubectl"].version, "v1.27.1");
    }

    #[test]
    fn tiers_order_helpers() {
        let global = Spec::default();
        let mut environment = Spec::default();
        environment.kubernetes.cluster = "env".into();
        let mut instance = Spec::default();
        instance.kubernetes.cluster = "inst".into();

        let tiers = Tiers {
            global: &global,
            environment: &environment,
            instance: &instance,
        };

        assert_eq!(tiers.most_specific_first()[0].kubernetes.cluster, "inst");
        assert_eq!(tiers.least_specific_first()[1].kubernetes.cluster, "env");
    }
}
