//! Debug output of outgoing queries and raw responses.

use std::time::Duration;

use apollo_compiler::ast;

use crate::graphql;

/// Target of the events emitted by [`TracingDebugLog`].
pub const DEBUG_TARGET: &str = "hasura_client::debug";

/// What is reported when debug mode is on.
#[derive(Clone, Copy, Debug)]
pub enum DebugEvent<'a> {
    /// A document about to be sent.
    Query {
        root_field: &'a str,
        text: &'a str,
    },
    /// The raw response received for it.
    Response {
        root_field: &'a str,
        body: &'a graphql::Response,
        elapsed: Duration,
    },
}

/// Receives debug output. Never influences the value returned to the caller.
pub trait DebugLog: Send + Sync + 'static {
    fn log(&self, event: DebugEvent<'_>);
}

/// Forwards debug output to `tracing` at `INFO` on [`DEBUG_TARGET`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDebugLog;

impl DebugLog for TracingDebugLog {
    fn log(&self, event: DebugEvent<'_>) {
        match event {
            DebugEvent::Query { root_field, text } => {
                tracing::info!(
                    target: DEBUG_TARGET,
                    root_field,
                    "query:\n{}",
                    pretty_query(text)
                );
            }
            DebugEvent::Response {
                root_field,
                body,
                elapsed,
            } => {
                let body = serde_json::to_string_pretty(body)
                    .unwrap_or_else(|error| format!("<unserializable response: {error}>"));
                tracing::info!(
                    target: DEBUG_TARGET,
                    root_field,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "response:\n{body}"
                );
            }
        }
    }
}

/// Pretty-prints a GraphQL document. Text that does not parse is returned as is.
pub fn pretty_query(text: &str) -> String {
    match ast::Document::parse(text, "query.graphql") {
        Ok(document) => document.to_string(),
        Err(_) => text.to_string(),
    }
}
