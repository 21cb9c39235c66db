use serde::Deserialize;
use serde::Serialize;

use crate::json_ext::Object;

/// The body POSTed to the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Request {
    /// The GraphQL operation (query or mutation) text.
    pub query: String,

    /// The GraphQL variables referenced by `$name` in `query`.
    #[serde(skip_serializing_if = "Object::is_empty", default)]
    pub variables: Object,
}

#[buildstructor::buildstructor]
impl Request {
    #[builder(visibility = "pub")]
    fn new(query: String, variables: Option<Object>) -> Self {
        Self {
            query,
            variables: variables.unwrap_or_default(),
        }
    }
}
