//! Deploy-time templating over env vars.
//!
//! Variables whose names contain [`TEMPLATE_KV_MARKER`] or
//! [`TEMPLATE_LIST_MARKER`] become template data; the variable containing
//! [`TEMPLATE_IN_VAR`] holds the template text, rendered with Go
//! `text/template` semantics by `gtmpl`. A missing map key prints as
//! `<no value>`.
//!
//! ```yaml
//! env:
//!   - name: STAGEHAND_TEMPLATE_KV_environment
//!     value: nonprod
//!   - name: STAGEHAND_TEMPLATE_LIST_clusters
//!     value: "cluster-1,cluster-2"
//!   - name: STAGEHAND_TEMPLATE_IN
//!     value: >
//!       {{range .list.clusters}}
//!       helm upgrade prometheus-{{.}} -f values-{{ $.kvmap.environment.Value }}.yaml
//!       {{end}}
//! ```
//!
//! The rendered text is exposed to the deploy script as
//! [`TEMPLATE_OUT_VAR`].

use std::collections::{BTreeMap, HashMap};

use gtmpl::Value;

use crate::core::models::spec::EnvironmentVar;

pub const TEMPLATE_KV_MARKER: &str = "STAGEHAND_TEMPLATE_KV_";
pub const TEMPLATE_LIST_MARKER: &str = "STAGEHAND_TEMPLATE_LIST_";
pub const TEMPLATE_IN_VAR: &str = "STAGEHAND_TEMPLATE_IN";
pub const TEMPLATE_OUT_VAR: &str = "STAGEHAND_TEMPLATE_OUT";

/// Errors raised while collecting template data or rendering.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("variable '{variable}' must be a comma separated list")]
    ListMalformed { variable: String },

    #[error("{detail}")]
    Render { detail: String },
}

/// A `kvmap` entry, exposed to templates as `.Key` / `.Value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Template data collected from a merged env var list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateBindings {
    /// Raw template text, if an input variable was present.
    pub source: Option<String>,
    pub kvmap: BTreeMap<String, KeyValue>,
    pub lists: BTreeMap<String, Vec<String>>,
}

impl TemplateBindings {
    /// Scan env vars for template input, KV and LIST variables.
    ///
    /// KV entries sharing a derived name keep the first one seen. A LIST
    /// value without a comma is rejected rather than read as a
    /// one-element list.
    pub fn from_env_vars(vars: &[EnvironmentVar]) -> Result<Self, TemplateError> {
        let mut bindings = Self::default();

        for var in vars {
            if var.name.contains(TEMPLATE_IN_VAR) {
                bindings.source = Some(var.value.clone());
            }

            if var.name.contains(TEMPLATE_KV_MARKER) {
                let key = derived_name(&var.name, TEMPLATE_KV_MARKER);
                bindings
                    .kvmap
                    .entry(key.to_string())
                    .or_insert_with(|| KeyValue {
                        key: key.to_string(),
                        value: var.value.clone(),
                    });
            }

            if var.name.contains(TEMPLATE_LIST_MARKER) {
                if !var.value.contains(',') {
                    return Err(TemplateError::ListMalformed {
                        variable: var.name.clone(),
                    });
                }
                let key = derived_name(&var.name, TEMPLATE_LIST_MARKER);
                bindings.lists.insert(
                    key.to_string(),
                    var.value.split(',').map(str::to_string).collect(),
                );
            }
        }

        Ok(bindings)
    }

    /// The data a template sees: `{ kvmap: {...}, list: {...} }`.
    pub fn to_value(&self) -> Value {
        let kvmap = self
            .kvmap
            .iter()
            .map(|(name, kv)| {
                let entry = HashMap::from([
                    ("Key".to_string(), Value::String(kv.key.clone())),
                    ("Value".to_string(), Value::String(kv.value.clone())),
                ]);
                (name.clone(), Value::Map(entry))
            })
            .collect();

        let lists = self
            .lists
            .iter()
            .map(|(name, items)| {
                let items = items.iter().cloned().map(Value::String).collect();
                (name.clone(), Value::Array(items))
            })
            .collect();

        Value::Map(HashMap::from([
            ("kvmap".to_string(), Value::Map(kvmap)),
            ("list".to_string(), Value::Map(lists)),
        ]))
    }
}

fn derived_name<'a>(name: &'a str, marker: &str) -> &'a str {
    name.strip_prefix(marker).unwrap_or(name)
}

/// Render template `source` against `data`.
pub fn render(source: &str, data: Value) -> Result<String, TemplateError> {
    gtmpl::template(source, data).map_err(|e| TemplateError::Render {
        detail: e.to_string(),
    })
}

/// Render the template carried by a merged env var list.
///
/// Returns `None` when the render is empty, including when no template
/// input variable is present.
pub fn render_env_template(vars: &[EnvironmentVar]) -> Result<Option<String>, TemplateError> {
    let bindings = TemplateBindings::from_env_vars(vars)?;
    let source = bindings.source.as_deref().unwrap_or_default();
    if source.is_empty() {
        return Ok(None);
    }
    let rendered = render(source, bindings.to_value())?;
    Ok(if rendered.is_empty() {
        None
    } else {
        Some(rendered)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, value: &str) -> EnvironmentVar {
        EnvironmentVar::new(name, value)
    }

    #[test]
    fn list_variable_renders_in_range() {
        let vars = vec![
            var("STAGEHAND_TEMPLATE_LIST_hosts", "a,b"),
            var("STAGEHAND_TEMPLATE_IN", "{{range .list.hosts}}{{.}}{{end}}"),
        ];
        assert_eq!(render_env_template(&vars).unwrap(), Some("ab".into()));
    }

    #[test]
    fn kv_variable_renders_value() {
        let vars = vec![
            var("STAGEHAND_TEMPLATE_KV_env", "prod"),
            var("STAGEHAND_TEMPLATE_IN", "{{.kvmap.env.Value}}"),
        ];
        assert_eq!(render_env_template(&vars).unwrap(), Some("prod".into()));
    }

    #[test]
    fn no_template_input_renders_nothing() {
        let vars = vec![var("STAGEHAND_TEMPLATE_KV_env", "prod")];
        assert_eq!(render_env_template(&vars).unwrap(), None);
    }

    #[test]
    fn whitespace_only_render_is_kept() {
        let vars = vec![var("STAGEHAND_TEMPLATE_IN", "\n")];
        assert_eq!(render_env_template(&vars).unwrap(), Some("\n".into()));
    }

    #[test]
    fn list_without_comma_is_rejected() {
        let vars = vec![var("STAGEHAND_TEMPLATE_LIST_hosts", "single")];
        assert_eq!(
            TemplateBindings::from_env_vars(&vars).unwrap_err(),
            TemplateError::ListMalformed {
                variable: "STAGEHAND_TEMPLATE_LIST_hosts".into()
            }
        );
    }

    #[test]
    fn list_split_keeps_empty_items() {
        let vars = vec![var("STAGEHAND_TEMPLATE_LIST_hosts", "a,")];
        let bindings = TemplateBindings::from_env_vars(&vars).unwrap();
        assert_eq!(bindings.lists["hosts"], vec!["a".to_string(), String::new()]);
    }

    #[test]
    fn duplicate_kv_keeps_first_seen() {
        let vars = vec![
            var("STAGEHAND_TEMPLATE_KV_env", "first"),
            var("X_STAGEHAND_TEMPLATE_KV_env", "other"),
            var("STAGEHAND_TEMPLATE_KV_env", "second"),
        ];
        let bindings = TemplateBindings::from_env_vars(&vars).unwrap();
        assert_eq!(bindings.kvmap["env"].value, "first");
        // Marker not at the start: the full name is the key.
        assert_eq!(bindings.kvmap["X_STAGEHAND_TEMPLATE_KV_env"].value, "other");
    }

    #[test]
    fn render_error_surfaces() {
        let vars = vec![var("STAGEHAND_TEMPLATE_IN", "{{range .list.x}}")];
        assert!(matches!(
            render_env_template(&vars),
            Err(TemplateError::Render { .. })
        ));
    }

    #[test]
    fn missing_keys_print_no_value() {
        let vars = vec![
            var("STAGEHAND_TEMPLATE_KV_env", "prod"),
            var("STAGEHAND_TEMPLATE_IN", "[{{.kvmap.typo}}][{{.nope}}]"),
        ];
        assert_eq!(
            render_env_template(&vars).unwrap(),
            Some("[<no value>][<no value>]".into())
        );
    }

    #[test]
    fn go_builtins_are_available() {
        let vars = vec![
            var("STAGEHAND_TEMPLATE_KV_env", "prod"),
            var("STAGEHAND_TEMPLATE_LIST_hosts", "a,b"),
            var(
                "STAGEHAND_TEMPLATE_IN",
                r#"{{if eq .kvmap.env.Value "prod"}}live{{else}}test{{end}} {{len .list.hosts}} {{index .list.hosts 1}}"#,
            ),
        ];
        assert_eq!(render_env_template(&vars).unwrap(), Some("live 2 b".into()));
    }

    #[test]
    fn trim_markers_and_root_access() {
        let vars = vec![
            var("STAGEHAND_TEMPLATE_KV_env", "prod"),
            var("STAGEHAND_TEMPLATE_LIST_hosts", "a,b"),
            var(
                "STAGEHAND_TEMPLATE_IN",
                "{{- range .list.hosts -}}\n{{ . }}-{{ $.kvmap.env.Value }};\n{{- end }}",
            ),
        ];
        assert_eq!(
            render_env_template(&vars).unwrap(),
            Some("a-prod;b-prod;".into())
        );
    }
}
