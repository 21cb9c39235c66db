//! Selection sets built from dotted field paths.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::schema::PathError;
use crate::schema::is_valid_name;

/// A GraphQL selection set: an ordered tree of field names.
///
/// A field without children is selected as a leaf; a field with children is
/// selected with a nested selection set. Fields shared between several paths
/// appear exactly once, at the position of their first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    fields: IndexMap<String, SelectionSet>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection set from dotted paths, e.g. `["id", "author.name"]`
    /// becomes `{ id author { name } }`.
    ///
    /// Only the syntax of each path is checked here; use
    /// [`Fields`](crate::schema::Fields) to check paths against an entity.
    pub fn resolve<I, S>(paths: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::new();
        for path in paths {
            let path = path.as_ref();
            if path.is_empty() {
                return Err(PathError::EmptyPath);
            }
            for segment in path.split('.') {
                if segment.is_empty() {
                    return Err(PathError::EmptySegment {
                        path: path.to_string(),
                    });
                }
                if !is_valid_name(segment) {
                    return Err(PathError::InvalidName {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    });
                }
            }
            selection.insert_segments(path.split('.'));
        }
        if selection.is_empty() {
            return Err(PathError::NoFields);
        }
        Ok(selection)
    }

    /// A selection set holding `name` with `children` nested under it.
    pub fn nested(name: impl Into<String>, children: SelectionSet) -> Self {
        let mut selection = Self::new();
        selection.fields.insert(name.into(), children);
        selection
    }

    /// A selection set of leaf fields.
    pub fn leaves<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: names
                .into_iter()
                .map(|name| (name.into(), SelectionSet::new()))
                .collect(),
        }
    }

    pub(crate) fn insert_segments<'a>(&mut self, segments: impl IntoIterator<Item = &'a str>) {
        let mut current = self;
        for segment in segments {
            current = current.fields.entry(segment.to_string()).or_default();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The selected fields and their sub-selections, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SelectionSet)> {
        self.fields.iter().map(|(name, children)| (name.as_str(), children))
    }

    pub fn get(&self, name: &str) -> Option<&SelectionSet> {
        self.fields.get(name)
    }

    /// Narrows a response value to the fields selected here.
    ///
    /// Objects keep only selected keys (in selection order), lists are narrowed
    /// element by element, and scalars pass through untouched. Selected keys
    /// missing from the value stay missing.
    pub fn project(&self, value: Value) -> Value {
        if self.is_empty() {
            return value;
        }
        match value {
            Value::Object(mut object) => {
                let mut projected = serde_json::Map::with_capacity(self.fields.len());
                for (name, children) in &self.fields {
                    if let Some(field) = object.remove(name.as_str()) {
                        projected.insert(name.clone(), children.project(field));
                    }
                }
                Value::Object(projected)
            }
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|item| self.project(item)).collect())
            }
            other => other,
        }
    }
}

/// Renders as GraphQL: `{ id author { name } }`.
impl fmt::Display for SelectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (name, children) in &self.fields {
            write!(f, " {name}")?;
            if !children.is_empty() {
                write!(f, " {children}")?;
            }
        }
        f.write_str(" }")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn nests_dotted_paths() {
        let selection = SelectionSet::resolve(["id", "author.name"]).unwrap();
        assert_eq!(selection.to_string(), "{ id author { name } }");
    }

    #[test]
    fn merges_shared_prefixes_once() {
        let selection = SelectionSet::resolve([
            "author.name",
            "id",
            "author.profile.bio",
            "author.id",
            "comments.author.name",
            "comments.body",
        ])
        .unwrap();
        assert_eq!(
            selection.to_string(),
            "{ author { name profile { bio } id } id comments { author { name } body } }"
        );
    }

    #[test]
    fn duplicate_paths_collapse() {
        let selection = SelectionSet::resolve(["id", "id", "title"]).unwrap();
        assert_eq!(selection.to_string(), "{ id title }");
    }

    #[test]
    fn sub_selection_wins_over_leaf() {
        let selection = SelectionSet::resolve(["author", "author.name"]).unwrap();
        assert_eq!(selection.to_string(), "{ author { name } }");
        let selection = SelectionSet::resolve(["author.name", "author"]).unwrap();
        assert_eq!(selection.to_string(), "{ author { name } }");
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!(
            SelectionSet::resolve(Vec::<&str>::new()),
            Err(PathError::NoFields)
        );
        assert_eq!(SelectionSet::resolve([""]), Err(PathError::EmptyPath));
        assert_eq!(
            SelectionSet::resolve(["author."]),
            Err(PathError::EmptySegment {
                path: "author.".to_string()
            })
        );
        assert_eq!(
            SelectionSet::resolve(["author.first name"]),
            Err(PathError::InvalidName {
                path: "author.first name".to_string(),
                segment: "first name".to_string()
            })
        );
        assert!(SelectionSet::resolve(["id } evil { x"]).is_err());
    }

    #[test]
    fn helpers() {
        let returning = SelectionSet::nested("returning", SelectionSet::leaves(["id", "title"]));
        assert_eq!(returning.to_string(), "{ returning { id title } }");
        assert_eq!(
            SelectionSet::nested("aggregate", SelectionSet::leaves(["count"])).to_string(),
            "{ aggregate { count } }"
        );
    }

    #[test]
    fn projects_objects_and_lists() {
        let selection = SelectionSet::resolve(["id", "author.name", "comments.body"]).unwrap();
        let value = json!({
            "title": "dropped",
            "id": 1,
            "comments": [
                { "body": "first", "id": 10 },
                { "body": "second", "id": 11 }
            ],
            "author": { "name": "Ada", "id": 7 }
        });
        assert_eq!(
            selection.project(value),
            json!({
                "id": 1,
                "author": { "name": "Ada" },
                "comments": [{ "body": "first" }, { "body": "second" }]
            })
        );
    }

    #[test]
    fn projection_keeps_nulls_and_skips_missing() {
        let selection = SelectionSet::resolve(["id", "author.name"]).unwrap();
        assert_eq!(
            selection.project(json!({ "author": null })),
            json!({ "author": null })
        );
        assert_eq!(
            selection.project(json!([{ "id": 1 }, { "id": 2, "extra": true }])),
            json!([{ "id": 1 }, { "id": 2 }])
        );
    }
}
