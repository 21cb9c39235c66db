//! Environment variable expansion in the configuration file

#[cfg(test)]
use std::collections::HashMap;
use std::env;
use std::fs;

use serde_json::Value;

use super::ConfigurationError;

#[derive(buildstructor::Builder, Clone)]
pub(crate) struct Expansion {
    supported_modes: Vec<String>,
    /// Keys whose expanded values always stay strings.
    verbatim_keys: Vec<String>,
    #[cfg(test)]
    mocked_env_vars: HashMap<String, String>,
}

impl Expansion {
    pub(crate) fn default() -> Self {
        Expansion::builder()
            .supported_mode("env")
            .supported_mode("file")
            .verbatim_key("custom_headers")
            .build()
    }

    fn context_fn(&self) -> impl Fn(&str) -> Result<Option<String>, ConfigurationError> + '_ {
        move |key: &str| {
            if !self
                .supported_modes
                .iter()
                .any(|prefix| key.starts_with(&format!("{prefix}.")))
            {
                return Err(ConfigurationError::UnknownExpansionMode {
                    key: key.to_string(),
                    supported_modes: self.supported_modes.join("|"),
                });
            }

            if let Some(key) = key.strip_prefix("env.") {
                return self.get_env(key).map(Some).map_err(|cause| {
                    ConfigurationError::CannotExpandVariable {
                        key: key.to_string(),
                        cause: format!("{cause}"),
                    }
                });
            }
            if let Some(key) = key.strip_prefix("file.") {
                return fs::read_to_string(key)
                    .map(|contents| Some(contents.trim_end().to_string()))
                    .map_err(|cause| ConfigurationError::CannotExpandVariable {
                        key: key.to_string(),
                        cause: format!("{cause}"),
                    });
            }
            Err(ConfigurationError::UnknownExpansionMode {
                key: key.to_string(),
                supported_modes: self.supported_modes.join("|"),
            })
        }
    }

    fn get_env(&self, name: &str) -> Result<String, env::VarError> {
        #[cfg(test)]
        if let Some(value) = self.mocked_env_vars.get(name) {
            return Ok(value.clone());
        }
        env::var(name)
    }

    pub(crate) fn expand(&self, configuration: &Value) -> Result<Value, ConfigurationError> {
        let mut configuration = configuration.clone();
        self.visit(&mut configuration, true)?;
        Ok(configuration)
    }

    fn visit(&self, value: &mut Value, coerce_expanded: bool) -> Result<(), ConfigurationError> {
        let mut expanded: Option<String> = None;
        match value {
            Value::String(value) => {
                let new_value =
                    shellexpand::env_with_context(value, self.context_fn()).map_err(|e| e.cause)?;
                if &new_value != value {
                    expanded = Some(new_value.to_string());
                }
            }
            Value::Array(a) => {
                for v in a {
                    self.visit(v, coerce_expanded)?
                }
            }
            Value::Object(o) => {
                for (k, v) in o.iter_mut() {
                    let verbatim = self.verbatim_keys.iter().any(|key| key == k);
                    self.visit(v, coerce_expanded && !verbatim)?
                }
            }
            _ => {}
        }
        // The expansion may have resulted in a primitive, reparse and replace
        if let Some(expanded) = expanded {
            *value = if coerce_expanded {
                coerce(&expanded)
            } else {
                Value::String(expanded)
            }
        }
        Ok(())
    }
}

pub(crate) fn coerce(expanded: &str) -> Value {
    match serde_yaml::from_str(expanded) {
        Ok(Value::Bool(b)) => Value::Bool(b),
        Ok(Value::Number(n)) => Value::Number(n),
        Ok(Value::Null) => Value::Null,
        _ => Value::String(expanded.to_string()),
    }
}
