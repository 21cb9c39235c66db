//! Logic for loading configuration in to an object model

mod expansion;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use displaydoc::Display;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use http::header::CONTENT_TYPE;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use thiserror::Error;
use url::Url;

pub(crate) use self::expansion::Expansion;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not read configuration file '{path}': {error}
    CannotReadFile { path: String, error: std::io::Error },
    /// could not expand variable: {key}, {cause}
    CannotExpandVariable { key: String, cause: String },
    /// unknown expansion mode '{key}', supported modes are {supported_modes}
    UnknownExpansionMode {
        key: String,
        supported_modes: String,
    },
    /// {message}: {error}
    InvalidConfiguration {
        message: &'static str,
        error: String,
    },
    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_json::Error),
    /// invalid header name '{name}': {error}
    InvalidHeaderName { name: String, error: String },
    /// invalid value for header '{name}': {error}
    InvalidHeaderValue { name: String, error: String },
    /// could not build the HTTP client: {0}
    HttpClient(String),
}

/// The configuration of a [`Client`](crate::Client).
///
/// Can be created through `serde::Deserialize` from various formats, parsed
/// from YAML with [`FromStr`] (expanding `${env.NAME}` and `${file.PATH}`
/// references), or built inline in Rust code with [`Configuration::builder`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// The backend's GraphQL endpoint, e.g. `https://example.hasura.app/v1/graphql`.
    pub host: Url,

    /// Headers sent with every request, e.g. `x-hasura-admin-secret`.
    /// `content-type` is always `application/json` whatever is set here.
    #[serde(default, deserialize_with = "deserialize_header_values")]
    #[schemars(with = "BTreeMap<String, String>")]
    pub custom_headers: BTreeMap<String, String>,

    /// Log every outgoing query and the raw response it received.
    #[serde(default)]
    pub debug: bool,

    /// Render primary key values of `<entity>_by_pk` lookups as strings,
    /// whatever their type (`id: "42"`).
    #[serde(default)]
    pub legacy_quoted_primary_keys: bool,
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder(visibility = "pub")]
    fn new(
        host: Url,
        custom_headers: BTreeMap<String, String>,
        debug: Option<bool>,
        legacy_quoted_primary_keys: Option<bool>,
    ) -> Self {
        Self {
            host,
            custom_headers,
            debug: debug.unwrap_or_default(),
            legacy_quoted_primary_keys: legacy_quoted_primary_keys.unwrap_or_default(),
        }
    }

    /// Reads and parses a YAML (or JSON) configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|error| ConfigurationError::CannotReadFile {
            path: path.display().to_string(),
            error,
        })?;
        raw.parse()
    }

    pub(crate) fn from_yaml(raw_yaml: &str, expansion: &Expansion) -> Result<Self, ConfigurationError> {
        let yaml: serde_json::Value = serde_yaml::from_str(raw_yaml).map_err(|e| {
            ConfigurationError::InvalidConfiguration {
                message: "failed to parse yaml",
                error: e.to_string(),
            }
        })?;
        let expanded = expansion.expand(&yaml)?;
        serde_json::from_value(expanded).map_err(ConfigurationError::DeserializeConfigError)
    }

    /// The headers sent with every request: the custom headers, then
    /// `content-type: application/json`, which always wins.
    pub fn headers(&self) -> Result<HeaderMap, ConfigurationError> {
        let mut headers = HeaderMap::with_capacity(self.custom_headers.len() + 1);
        for (name, value) in &self.custom_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
                ConfigurationError::InvalidHeaderName {
                    name: name.clone(),
                    error: error.to_string(),
                }
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|error| {
                ConfigurationError::InvalidHeaderValue {
                    name: name.clone(),
                    error: error.to_string(),
                }
            })?;
            headers.insert(header_name, header_value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// The JSON schema of the configuration file.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Configuration)
    }
}

impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml(s, &Expansion::default())
    }
}

/// Header values written as YAML numbers or booleans keep their text.
fn deserialize_header_values<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawHeaderValue {
        String(String),
        Number(serde_json::Number),
        Bool(bool),
    }

    let raw = BTreeMap::<String, RawHeaderValue>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                RawHeaderValue::String(value) => value,
                RawHeaderValue::Number(value) => value.to_string(),
                RawHeaderValue::Bool(value) => value.to_string(),
            };
            (name, value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn host() -> Url {
        Url::parse("https://example.hasura.app/v1/graphql").unwrap()
    }

    #[test]
    fn builder_defaults() {
        let configuration = Configuration::builder().host(host()).build();
        assert!(!configuration.debug);
        assert!(!configuration.legacy_quoted_primary_keys);
        assert!(configuration.custom_headers.is_empty());
    }

    #[test]
    fn parses_yaml_with_expansion() {
        let expansion = Expansion::builder()
            .supported_mode("env")
            .mocked_env_var("TEST_HASURA_SECRET", "s3cr3t")
            .build();
        let configuration = Configuration::from_yaml(
            r#"
host: https://example.hasura.app/v1/graphql
custom_headers:
  x-hasura-admin-secret: ${env.TEST_HASURA_SECRET}
debug: true
"#,
            &expansion,
        )
        .unwrap();
        assert_eq!(
            configuration,
            Configuration::builder()
                .host(host())
                .custom_header("x-hasura-admin-secret", "s3cr3t")
                .debug(true)
                .build()
        );
    }

    #[test]
    fn numeric_header_values_stay_strings() {
        let expansion = Expansion::builder()
            .supported_mode("env")
            .verbatim_key("custom_headers")
            .mocked_env_var("TEST_HASURA_SECRET", "12345")
            .build();
        let configuration = Configuration::from_yaml(
            r#"
host: https://example.hasura.app/v1/graphql
custom_headers:
  x-hasura-admin-secret: ${env.TEST_HASURA_SECRET}
  x-client-version: 2
  x-hasura-use-cache: true
"#,
            &expansion,
        )
        .unwrap();
        assert_eq!(
            configuration.custom_headers,
            BTreeMap::from([
                ("x-client-version".to_string(), "2".to_string()),
                ("x-hasura-admin-secret".to_string(), "12345".to_string()),
                ("x-hasura-use-cache".to_string(), "true".to_string()),
            ])
        );
        let headers = configuration.headers().unwrap();
        assert_eq!(headers["x-hasura-admin-secret"], "12345");
    }

    #[test]
    fn rejects_unknown_fields_and_bad_urls() {
        let error = "host: https://example.hasura.app\nretries: 3"
            .parse::<Configuration>()
            .unwrap_err();
        assert!(matches!(error, ConfigurationError::DeserializeConfigError(_)));
        assert!(error.to_string().contains("unknown field `retries`"));

        let error = "host: not a url".parse::<Configuration>().unwrap_err();
        assert!(matches!(error, ConfigurationError::DeserializeConfigError(_)));

        let error = "host: [".parse::<Configuration>().unwrap_err();
        assert!(matches!(
            error,
            ConfigurationError::InvalidConfiguration {
                message: "failed to parse yaml",
                ..
            }
        ));
    }

    #[test]
    fn reads_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host: https://example.hasura.app/v1/graphql").unwrap();
        writeln!(file, "legacy_quoted_primary_keys: true").unwrap();
        let configuration = Configuration::from_file(file.path()).unwrap();
        assert_eq!(configuration.host, host());
        assert!(configuration.legacy_quoted_primary_keys);

        assert!(matches!(
            Configuration::from_file("/definitely/not/here.yaml"),
            Err(ConfigurationError::CannotReadFile { .. })
        ));
    }

    #[test]
    fn content_type_always_wins() {
        let configuration = Configuration::builder()
            .host(host())
            .custom_header("Content-Type", "text/plain")
            .custom_header("x-hasura-role", "editor")
            .build();
        let headers = configuration.headers().unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers["x-hasura-role"], "editor");
    }

    #[test]
    fn invalid_headers_are_rejected() {
        let configuration = Configuration::builder()
            .host(host())
            .custom_header("bad header", "x")
            .build();
        assert!(matches!(
            configuration.headers(),
            Err(ConfigurationError::InvalidHeaderName { name, .. }) if name == "bad header"
        ));

        let configuration = Configuration::builder()
            .host(host())
            .custom_header("x-ok", "line\nbreak")
            .build();
        assert!(matches!(
            configuration.headers(),
            Err(ConfigurationError::InvalidHeaderValue { name, .. }) if name == "x-ok"
        ));
    }

    #[test]
    fn schema_lists_every_option() {
        let schema = serde_json::to_value(Configuration::json_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(
            properties.keys().collect::<Vec<_>>(),
            vec!["custom_headers", "debug", "host", "legacy_quoted_primary_keys"]
        );
        assert_eq!(schema["required"], serde_json::json!(["host"]));
    }
}
