use serde::Deserialize;
use serde::Serialize;

use crate::graphql::Error;
use crate::json_ext::Object;
use crate::json_ext::Value;

/// A GraphQL response as returned by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Response {
    /// The response data.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,

    /// The optional graphql errors encountered.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Error>,

    /// The optional graphql extensions.
    #[serde(skip_serializing_if = "Object::is_empty", default)]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Response {
    /// Constructor
    #[builder(visibility = "pub")]
    fn new(data: Option<Value>, errors: Vec<Error>, extensions: Option<Object>) -> Self {
        Self {
            data,
            errors,
            extensions: extensions.unwrap_or_default(),
        }
    }

    /// Parses a response body.
    pub fn from_bytes(bytes: &[u8]) -> Result<Response, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_data_and_errors() {
        let response = Response::from_bytes(
            br#"{"data":{"posts":[{"id":1}]},"errors":[{"message":"partial"}]}"#,
        )
        .unwrap();
        assert_eq!(response.data, Some(json!({ "posts": [{ "id": 1 }] })));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "partial");
    }

    #[test]
    fn missing_members_default() {
        let response = Response::from_bytes(b"{}").unwrap();
        assert_eq!(response, Response::default());
        assert!(Response::from_bytes(b"[1]").is_err());
    }
}
