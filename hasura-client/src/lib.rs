//! A typed GraphQL client for backends following the Hasura naming convention.
//!
//! Entities are declared once with [`entity!`]; field paths are checked
//! against them ([`path!`] and [`fields!`] at compile time,
//! [`FieldPath::parse`] at runtime). Each [`Client`] operation builds one
//! GraphQL document (`<entity>`, `<entity>_by_pk`, `<entity>_aggregate`,
//! `insert_<entity>`, `update_<entity>`, `delete_<entity>`), sends it, and
//! narrows the response to exactly the requested fields.

#![warn(unreachable_pub)]

pub mod json_ext;

mod client;
mod configuration;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod filter;
pub mod graphql;
pub mod payload;
pub mod schema;
pub mod selection;
pub mod transport;

pub use client::Client;
pub use configuration::Configuration;
pub use diagnostics::DebugLog;
pub use diagnostics::TracingDebugLog;
pub use document::AggregateCount;
pub use document::AggregateOptions;
pub use document::BatchSelect;
pub use document::SelectOptions;
pub use document::UpdateOptions;
pub use error::ClientError;
pub use error::ConfigurationError;
pub use filter::Comparison;
pub use filter::Direction;
pub use filter::OrderBy;
pub use filter::Where;
pub use schema::Entity;
pub use schema::FieldPath;
pub use schema::Fields;
pub use schema::PrimaryKey;
pub use transport::ReqwestTransport;
pub use transport::Transport;

#[doc(hidden)]
pub mod __private {
    pub use paste::paste;
}
