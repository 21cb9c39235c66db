//! The request dispatcher.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use http::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::Instrument;
use url::Url;

use crate::configuration::Configuration;
use crate::configuration::ConfigurationError;
use crate::diagnostics::DebugEvent;
use crate::diagnostics::DebugLog;
use crate::diagnostics::TracingDebugLog;
use crate::document;
use crate::document::AggregateCount;
use crate::document::AggregateOptions;
use crate::document::BatchSelect;
use crate::document::Document;
use crate::document::SelectOptions;
use crate::document::UpdateOptions;
use crate::error::ClientError;
use crate::filter::Where;
use crate::json_ext::Value;
use crate::schema::Entity;
use crate::schema::Fields;
use crate::schema::PrimaryKey;
use crate::selection::SelectionSet;
use crate::transport::ReqwestTransport;
use crate::transport::Transport;

/// Settings resolved once at construction.
struct Settings {
    endpoint: Url,
    headers: HeaderMap,
    debug: bool,
    legacy_quoted_primary_keys: bool,
}

/// A client for one backend.
///
/// Cheap to clone; clones share the configuration, the transport and the
/// debug log. Every operation makes exactly one transport call.
///
/// Results are narrowed to the requested fields before being deserialized
/// into `T`, so `T` only needs to describe what was asked for (or be
/// [`serde_json::Value`]).
#[derive(Clone)]
pub struct Client {
    settings: Arc<Settings>,
    transport: Arc<dyn Transport>,
    debug_log: Arc<dyn DebugLog>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.settings.endpoint.as_str())
            .field("debug", &self.settings.debug)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// A client using the default [`ReqwestTransport`].
    pub fn new(configuration: Configuration) -> Result<Self, ConfigurationError> {
        Self::with_transport(configuration, ReqwestTransport::new()?)
    }

    pub fn with_transport(
        configuration: Configuration,
        transport: impl Transport,
    ) -> Result<Self, ConfigurationError> {
        let headers = configuration.headers()?;
        Ok(Self {
            settings: Arc::new(Settings {
                endpoint: configuration.host,
                headers,
                debug: configuration.debug,
                legacy_quoted_primary_keys: configuration.legacy_quoted_primary_keys,
            }),
            transport: Arc::new(transport),
            debug_log: Arc::new(TracingDebugLog),
        })
    }

    /// Replaces where debug output goes. Only used when `debug` is set.
    pub fn with_debug_log(mut self, debug_log: impl DebugLog) -> Self {
        self.debug_log = Arc::new(debug_log);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.settings.endpoint
    }

    /// Rows of `E` matching `options`.
    pub async fn select<E: Entity, T: DeserializeOwned>(
        &self,
        fields: &Fields<E>,
        options: &SelectOptions,
    ) -> Result<Vec<T>, ClientError> {
        let document = Document::select(fields, options)?;
        let mut data = self.execute(&document).await?;
        let root_field = E::NAME;
        let rows = document::take_root(&mut data, root_field)?;
        narrow(&fields.selection_set(), rows, root_field)
    }

    /// The row of `E` with primary key `key`, if any.
    pub async fn select_by_pk<E: Entity, T: DeserializeOwned>(
        &self,
        key: &PrimaryKey<E>,
        fields: &Fields<E>,
    ) -> Result<Option<T>, ClientError> {
        let document = Document::by_pk(key, fields, self.settings.legacy_quoted_primary_keys)?;
        let mut data = self.execute(&document).await?;
        let root_field = document.root_fields();
        match document::take_root(&mut data, &root_field)? {
            Value::Null => Ok(None),
            row => narrow(&fields.selection_set(), row, &root_field).map(Some),
        }
    }

    /// Several selects in a single request. `result[i]` holds the rows of
    /// `items[i]`. An empty batch makes no request.
    pub async fn select_batch<T: DeserializeOwned>(
        &self,
        items: &[BatchSelect],
    ) -> Result<Vec<Vec<T>>, ClientError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let document = Document::select_batch(items)?;
        let mut data = self.execute(&document).await?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let alias = document::batch_alias(index);
                let rows = document::take_root(&mut data, &alias)?;
                narrow(item.selection_set(), rows, &alias)
            })
            .collect()
    }

    /// Inserts one object or a list of objects and returns the inserted rows.
    pub async fn insert<E, T, P>(
        &self,
        objects: &P,
        returning: &Fields<E>,
    ) -> Result<Vec<T>, ClientError>
    where
        E: Entity,
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let document = Document::insert(objects, returning)?;
        self.execute_mutation(&document, returning).await
    }

    /// Sets the fields of `set` on the rows matching `options` and returns
    /// the updated rows.
    pub async fn update<E, T, P>(
        &self,
        set: &P,
        returning: &Fields<E>,
        options: &UpdateOptions,
    ) -> Result<Vec<T>, ClientError>
    where
        E: Entity,
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let document = Document::update(set, returning, options)?;
        self.execute_mutation(&document, returning).await
    }

    /// Deletes the rows matching `filter` and returns them.
    pub async fn delete<E: Entity, T: DeserializeOwned>(
        &self,
        filter: &Where,
        returning: &Fields<E>,
    ) -> Result<Vec<T>, ClientError> {
        let document = Document::delete(filter, returning)?;
        self.execute_mutation(&document, returning).await
    }

    /// Counts the rows of `E` matching `options`.
    pub async fn aggregate<E: Entity>(
        &self,
        options: &AggregateOptions,
    ) -> Result<AggregateCount, ClientError> {
        let document = Document::aggregate::<E>(options)?;
        let mut data = self.execute(&document).await?;
        let root_field = document.root_fields();
        let value = document::take_root(&mut data, &root_field)?;
        document::take_count(value, &root_field)
    }

    async fn execute_mutation<E, T: DeserializeOwned>(
        &self,
        document: &Document,
        returning: &Fields<E>,
    ) -> Result<Vec<T>, ClientError> {
        let mut data = self.execute(document).await?;
        let root_field = document.root_fields();
        let value = document::take_root(&mut data, &root_field)?;
        let rows = document::take_returning(value, &root_field)?;
        narrow(&returning.selection_set(), rows, &root_field)
    }

    /// Sends `document` and returns the response's `data`.
    async fn execute(&self, document: &Document) -> Result<Value, ClientError> {
        let root_fields = document.root_fields();
        let request = document.clone().into_request();
        let settings = &self.settings;

        if settings.debug {
            self.debug_log.log(DebugEvent::Query {
                root_field: &root_fields,
                text: &request.query,
            });
        }

        let span = tracing::debug_span!(
            "hasura_request",
            operation = %document.operation_type(),
            root_fields = %root_fields,
        );
        let start = Instant::now();
        let response = self
            .transport
            .send(&settings.endpoint, &settings.headers, &request)
            .instrument(span)
            .await
            .map_err(ClientError::Transport)?;
        let elapsed = start.elapsed();
        tracing::debug!(
            root_fields = %root_fields,
            elapsed_ms = elapsed.as_millis() as u64,
            errors = response.errors.len(),
            "received response"
        );

        if settings.debug {
            self.debug_log.log(DebugEvent::Response {
                root_field: &root_fields,
                body: &response,
                elapsed,
            });
        }

        document::response_data(response, &root_fields)
    }
}

/// Narrows `value` to `selection` and deserializes it.
fn narrow<T: DeserializeOwned>(
    selection: &SelectionSet,
    value: Value,
    root_field: &str,
) -> Result<T, ClientError> {
    serde_json::from_value(selection.project(value)).map_err(|error| {
        ClientError::malformed(format!(
            "'{root_field}' does not match the requested shape: {error}"
        ))
    })
}
