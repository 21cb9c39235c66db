//! Client errors.
use std::fmt;

use displaydoc::Display;
use thiserror::Error;
use tower::BoxError;

pub use crate::configuration::ConfigurationError;
use crate::graphql;
pub use crate::payload::PayloadError;
pub use crate::schema::PathError;

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Error, Display, Debug)]
#[ignore_extra_doc_attributes]
#[non_exhaustive]
pub enum ClientError {
    /// request to the backend failed: {0}
    ///
    /// note that this relates to a transport error and not a GraphQL error
    Transport(BoxError),

    /// backend rejected the operation on '{root_field}': {errors}
    Backend {
        /// The root field of the rejected operation.
        root_field: String,
        /// The errors reported by the backend.
        errors: BackendErrors,
    },

    /// response was malformed: {reason}
    MalformedResponse {
        /// Why the response could not be used.
        reason: String,
    },

    /// could not serialize the operation: {0}
    Serialization(PayloadError),

    /// invalid field path: {0}
    InvalidPath(PathError),
}

impl ClientError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ClientError::MalformedResponse {
            reason: reason.into(),
        }
    }

    /// The backend's GraphQL errors, if this is a [`ClientError::Backend`].
    pub fn graphql_errors(&self) -> &[graphql::Error] {
        match self {
            ClientError::Backend { errors, .. } => &errors.0,
            _ => &[],
        }
    }
}

impl From<BoxError> for ClientError {
    fn from(err: BoxError) -> Self {
        ClientError::Transport(err)
    }
}

impl From<PayloadError> for ClientError {
    fn from(err: PayloadError) -> Self {
        ClientError::Serialization(err)
    }
}

impl From<PathError> for ClientError {
    fn from(err: PathError) -> Self {
        ClientError::InvalidPath(err)
    }
}

/// Collection of GraphQL errors returned by the backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackendErrors(pub Vec<graphql::Error>);

impl fmt::Display for BackendErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            if let Some(code) = error.code() {
                write!(f, "[{code}] {}", error.message)?;
            } else {
                write!(f, "{}", error.message)?;
            }
        }
        Ok(())
    }
}

impl From<Vec<graphql::Error>> for BackendErrors {
    fn from(errors: Vec<graphql::Error>) -> Self {
        Self(errors)
    }
}
