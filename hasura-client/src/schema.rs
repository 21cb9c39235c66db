//! Entity schemas and validated field paths.
//!
//! Every entity exposed by the backend is described once by a static [`Shape`]:
//! the fields it carries and, for object and list fields, the shape they lead
//! to. Field paths such as `"author.name"` are checked against that shape.
//!
//! The check is a `const fn`, so paths written as literals through the
//! [`path!`](crate::path) and [`fields!`](crate::fields) macros are rejected at
//! build time. Paths only known at runtime go through [`FieldPath::parse`],
//! which runs the very same check and reports a [`PathError`].
//!
//! ```ignore
//! hasura_client::entity! {
//!     pub struct Author = "authors" {
//!         id: scalar,
//!         name: scalar,
//!         posts: [Post],
//!     }
//! }
//!
//! hasura_client::entity! {
//!     pub struct Post = "posts" {
//!         id: scalar,
//!         title: scalar,
//!         metadata: opaque,
//!         author: Author,
//!     }
//! }
//!
//! let fields = hasura_client::fields![Post; "id", "author.name"];
//! ```

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use displaydoc::Display;
use thiserror::Error;

use crate::selection::SelectionSet;

/// Maximum number of segments in a field path: the entity's own fields plus
/// three levels of nesting.
pub const MAX_PATH_DEPTH: usize = 4;

/// The fields of one object type.
#[derive(Debug)]
pub struct Shape {
    name: &'static str,
    fields: &'static [FieldDef],
}

/// One field of a [`Shape`].
#[derive(Debug)]
pub struct FieldDef {
    name: &'static str,
    kind: FieldKind,
}

/// What a field holds, as far as selection is concerned.
#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    /// A leaf value: numbers, strings, booleans, dates, enums, lists of those.
    Scalar,
    /// A value of unconstrained structure (e.g. a `jsonb` column). It can be
    /// selected as a whole but paths never descend into it.
    Opaque,
    /// A nested object.
    Object(&'static Shape),
    /// A list of nested objects.
    List(&'static Shape),
}

impl Shape {
    /// Declares a shape.
    ///
    /// Panics (at compile time when used in a constant) if a field name is not a
    /// valid GraphQL name.
    pub const fn new(name: &'static str, fields: &'static [FieldDef]) -> Self {
        let mut i = 0;
        while i < fields.len() {
            if !is_valid_name(fields[i].name) {
                panic!("entity field names must be valid GraphQL names");
            }
            i += 1;
        }
        Self { name, fields }
    }

    /// The type name used in diagnostics.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The declared fields, in declaration order.
    pub const fn fields(&self) -> &'static [FieldDef] {
        self.fields
    }

    /// Looks a field up by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl FieldDef {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// A type with a static [`Shape`].
pub trait HasShape {
    const SHAPE: &'static Shape;
}

/// A root entity of the backend, selectable through `<NAME>`, `<NAME>_by_pk`,
/// `<NAME>_aggregate`, and mutable through `insert_<NAME>`, `update_<NAME>`
/// and `delete_<NAME>`.
pub trait Entity: HasShape {
    const NAME: &'static str;
}

/// Result of checking a path against a shape. Segment indexes are zero-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathCheck {
    Valid,
    Empty,
    EmptySegment,
    TooDeep,
    UnknownField {
        segment: usize,
        shape: &'static str,
    },
    NotALeaf {
        segment: usize,
    },
    NoSubfields {
        segment: usize,
    },
}

/// Checks `path` against `shape`.
///
/// A path is valid when each of its non-final segments names an object or list
/// field, its final segment names a scalar or opaque field, and it has at most
/// [`MAX_PATH_DEPTH`] segments.
pub const fn check_path(shape: &'static Shape, path: &str) -> PathCheck {
    let bytes = path.as_bytes();
    if bytes.is_empty() {
        return PathCheck::Empty;
    }
    let mut current = shape;
    let mut start = 0;
    let mut segment = 0;
    loop {
        let mut end = start;
        while end < bytes.len() && bytes[end] != b'.' {
            end += 1;
        }
        if end == start {
            return PathCheck::EmptySegment;
        }
        if segment >= MAX_PATH_DEPTH {
            return PathCheck::TooDeep;
        }
        let field = match find_field(current, bytes, start, end) {
            Some(field) => field,
            None => {
                return PathCheck::UnknownField {
                    segment,
                    shape: current.name,
                };
            }
        };
        let last = end == bytes.len();
        match field.kind {
            FieldKind::Scalar | FieldKind::Opaque => {
                return if last {
                    PathCheck::Valid
                } else {
                    PathCheck::NoSubfields { segment }
                };
            }
            FieldKind::Object(nested) | FieldKind::List(nested) => {
                if last {
                    return PathCheck::NotALeaf { segment };
                }
                current = nested;
            }
        }
        start = end + 1;
        segment += 1;
    }
}

const fn find_field(
    shape: &'static Shape,
    path: &[u8],
    start: usize,
    end: usize,
) -> Option<&'static FieldDef> {
    let mut i = 0;
    while i < shape.fields.len() {
        let field = &shape.fields[i];
        let name = field.name.as_bytes();
        if name.len() == end - start {
            let mut j = 0;
            while j < name.len() && name[j] == path[start + j] {
                j += 1;
            }
            if j == name.len() {
                return Some(field);
            }
        }
        i += 1;
    }
    None
}

/// Whether `name` matches `/[_A-Za-z][_0-9A-Za-z]*/`.
pub const fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        let valid = byte == b'_'
            || byte.is_ascii_alphabetic()
            || (i > 0 && byte.is_ascii_digit());
        if !valid {
            return false;
        }
        i += 1;
    }
    true
}

/// Whether `name` is a root-level scalar field of `shape`, the only fields
/// usable as primary keys.
pub const fn is_primary_key(shape: &'static Shape, name: &str) -> bool {
    let bytes = name.as_bytes();
    match find_field(shape, bytes, 0, bytes.len()) {
        Some(field) => matches!(field.kind, FieldKind::Scalar),
        None => false,
    }
}

/// Field path errors.
#[derive(Clone, Debug, Error, Display, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathError {
    /// at least one field must be requested
    NoFields,
    /// field path is empty
    EmptyPath,
    /// field path '{path}' contains an empty segment
    EmptySegment { path: String },
    /// '{segment}' in field path '{path}' is not a valid GraphQL name
    InvalidName { path: String, segment: String },
    /// field path '{path}' is nested deeper than {max} levels
    TooDeep { path: String, max: usize },
    /// '{shape}' has no field '{segment}' (field path '{path}')
    UnknownField {
        path: String,
        segment: String,
        shape: &'static str,
    },
    /// field path '{path}' ends on '{segment}', which is an object; select one of its fields instead
    NotALeaf { path: String, segment: String },
    /// field path '{path}' descends into '{segment}', which has no sub-fields
    NoSubfields { path: String, segment: String },
    /// '{name}' is not a scalar field of '{shape}' and cannot be used as a primary key
    InvalidPrimaryKey { name: String, shape: &'static str },
}

impl PathError {
    fn from_check(check: PathCheck, path: &str) -> Option<Self> {
        let segment_at = |index: usize| path.split('.').nth(index).unwrap_or(path).to_string();
        let path_owned = path.to_string();
        Some(match check {
            PathCheck::Valid => return None,
            PathCheck::Empty => PathError::EmptyPath,
            PathCheck::EmptySegment => PathError::EmptySegment { path: path_owned },
            PathCheck::TooDeep => PathError::TooDeep {
                path: path_owned,
                max: MAX_PATH_DEPTH,
            },
            PathCheck::UnknownField { segment, shape } => PathError::UnknownField {
                segment: segment_at(segment),
                path: path_owned,
                shape,
            },
            PathCheck::NotALeaf { segment } => PathError::NotALeaf {
                segment: segment_at(segment),
                path: path_owned,
            },
            PathCheck::NoSubfields { segment } => PathError::NoSubfields {
                segment: segment_at(segment),
                path: path_owned,
            },
        })
    }
}

/// A field path known to be valid for entity `E`.
pub struct FieldPath<E> {
    path: Cow<'static, str>,
    entity: PhantomData<fn() -> E>,
}

impl<E: HasShape> FieldPath<E> {
    /// Validates a literal path during constant evaluation.
    ///
    /// Prefer the [`path!`](crate::path) macro, which forces the evaluation to
    /// happen at compile time.
    pub const fn checked(path: &'static str) -> Self {
        match check_path(E::SHAPE, path) {
            PathCheck::Valid => {}
            PathCheck::Empty => panic!("field path is empty"),
            PathCheck::EmptySegment => panic!("field path contains an empty segment"),
            PathCheck::TooDeep => panic!("field path is nested too deeply"),
            PathCheck::UnknownField { .. } => panic!("field path names an unknown field"),
            PathCheck::NotALeaf { .. } => {
                panic!("field path ends on an object; select one of its fields instead")
            }
            PathCheck::NoSubfields { .. } => {
                panic!("field path descends into a field without sub-fields")
            }
        }
        Self {
            path: Cow::Borrowed(path),
            entity: PhantomData,
        }
    }

    /// Validates a path known only at runtime.
    pub fn parse(path: impl Into<Cow<'static, str>>) -> Result<Self, PathError> {
        let path = path.into();
        match PathError::from_check(check_path(E::SHAPE, &path), &path) {
            Some(error) => Err(error),
            None => Ok(Self {
                path,
                entity: PhantomData,
            }),
        }
    }
}

impl<E> FieldPath<E> {
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The path's segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

impl<E> Clone for FieldPath<E> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            entity: PhantomData,
        }
    }
}

impl<E> PartialEq for FieldPath<E> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<E> Eq for FieldPath<E> {}

impl<E> fmt::Debug for FieldPath<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldPath").field(&self.path).finish()
    }
}

impl<E> fmt::Display for FieldPath<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A non-empty list of field paths of entity `E`.
pub struct Fields<E> {
    paths: Vec<FieldPath<E>>,
}

impl<E: HasShape> Fields<E> {
    pub fn new(first: FieldPath<E>, rest: impl IntoIterator<Item = FieldPath<E>>) -> Self {
        let mut paths = vec![first];
        paths.extend(rest);
        Self { paths }
    }

    /// Validates runtime paths. Fails on the first invalid one, or if there are none.
    pub fn parse<I, S>(paths: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        let paths = paths
            .into_iter()
            .map(FieldPath::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if paths.is_empty() {
            return Err(PathError::NoFields);
        }
        Ok(Self { paths })
    }
}

impl<E> Fields<E> {
    pub fn iter(&self) -> impl Iterator<Item = &FieldPath<E>> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false; kept for parity with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The nested selection set requesting exactly these paths.
    pub fn selection_set(&self) -> SelectionSet {
        let mut selection = SelectionSet::new();
        for path in &self.paths {
            selection.insert_segments(path.segments());
        }
        selection
    }
}

impl<E> Clone for Fields<E> {
    fn clone(&self) -> Self {
        Self {
            paths: self.paths.clone(),
        }
    }
}

impl<E> fmt::Debug for Fields<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.paths).finish()
    }
}

/// The primary key of one row of entity `E`.
pub struct PrimaryKey<E> {
    name: &'static str,
    value: KeyValue,
    entity: PhantomData<fn() -> E>,
}

/// A primary key value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyValue {
    Int(i64),
    String(String),
}

impl<E: HasShape> PrimaryKey<E> {
    /// `name` must be a root-level scalar field of `E`.
    ///
    /// Prefer the [`pk!`](crate::pk) macro for literal names, which runs the
    /// check at compile time.
    pub fn new(name: &str, value: impl Into<KeyValue>) -> Result<Self, PathError> {
        match E::SHAPE.field(name) {
            Some(field) if is_primary_key(E::SHAPE, name) => Ok(Self {
                name: field.name,
                value: value.into(),
                entity: PhantomData,
            }),
            _ => Err(PathError::InvalidPrimaryKey {
                name: name.to_string(),
                shape: E::SHAPE.name,
            }),
        }
    }

    /// Validates a literal key name during constant evaluation.
    #[doc(hidden)]
    pub const fn checked_name(name: &'static str) -> &'static str {
        if !is_primary_key(E::SHAPE, name) {
            panic!("primary key must be a root-level scalar field of the entity");
        }
        name
    }

    /// Builds a key from a name already accepted by [`Self::checked_name`].
    #[doc(hidden)]
    pub fn from_checked_name(name: &'static str, value: impl Into<KeyValue>) -> Self {
        Self {
            name,
            value: value.into(),
            entity: PhantomData,
        }
    }
}

impl<E> PrimaryKey<E> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value(&self) -> &KeyValue {
        &self.value
    }
}

impl<E> Clone for PrimaryKey<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            value: self.value.clone(),
            entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for PrimaryKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryKey")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Int(value.into())
    }
}

impl From<u32> for KeyValue {
    fn from(value: u32) -> Self {
        KeyValue::Int(value.into())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(value) => value.fmt(f),
            KeyValue::String(value) => value.fmt(f),
        }
    }
}

/// Declares an object shape, and optionally a root entity.
///
/// Field kinds are `scalar`, `opaque`, another declared type (`Author`) or a
/// list of one (`[Post]`). Giving a backend name (`= "posts"`) implements
/// [`Entity`]; without it the type is only usable nested inside others.
///
/// The shape lives in a hidden static named after the type (`__AUTHOR_SHAPE`
/// for `Author`). Nested types refer to that static, so entities may refer to
/// each other in cycles; a type declared in another module must be imported
/// together with its shape static.
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $ty:ident $(= $backend_name:literal)? {
            $($field:ident : $kind:tt),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        $vis struct $ty;

        $crate::__private::paste! {
            #[doc(hidden)]
            $vis static [<__ $ty:upper _SHAPE>]: $crate::schema::Shape = $crate::schema::Shape::new(
                stringify!($ty),
                &[$(
                    $crate::schema::FieldDef::new(
                        stringify!($field),
                        $crate::__field_kind!($kind),
                    )
                ),*],
            );

            impl $crate::schema::HasShape for $ty {
                const SHAPE: &'static $crate::schema::Shape = &[<__ $ty:upper _SHAPE>];
            }
        }

        $(
            impl $crate::schema::Entity for $ty {
                const NAME: &'static str = $backend_name;
            }
        )?
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_kind {
    (scalar) => {
        $crate::schema::FieldKind::Scalar
    };
    (opaque) => {
        $crate::schema::FieldKind::Opaque
    };
    ([$ty:ident]) => {
        $crate::schema::FieldKind::List(&$crate::__private::paste!([<__ $ty:upper _SHAPE>]))
    };
    ($ty:ident) => {
        $crate::schema::FieldKind::Object(&$crate::__private::paste!([<__ $ty:upper _SHAPE>]))
    };
}

/// A [`FieldPath`] checked at compile time: `path!(Post, "author.name")`.
#[macro_export]
macro_rules! path {
    ($entity:ty, $path:literal) => {{
        const PATH: $crate::schema::FieldPath<$entity> =
            $crate::schema::FieldPath::<$entity>::checked($path);
        PATH
    }};
}

/// Non-empty [`Fields`] checked at compile time: `fields![Post; "id", "author.name"]`.
#[macro_export]
macro_rules! fields {
    ($entity:ty; $first:literal $(, $rest:literal)* $(,)?) => {
        $crate::schema::Fields::<$entity>::new(
            $crate::path!($entity, $first),
            [$($crate::path!($entity, $rest)),*],
        )
    };
}

/// A [`PrimaryKey`] whose name is checked at compile time: `pk!(Post, "id", 42)`.
#[macro_export]
macro_rules! pk {
    ($entity:ty, $name:literal, $value:expr) => {{
        const NAME: &'static str = $crate::schema::PrimaryKey::<$entity>::checked_name($name);
        $crate::schema::PrimaryKey::<$entity>::from_checked_name(NAME, $value)
    }};
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    crate::entity! {
        pub(crate) struct Author = "authors" {
            id: scalar,
            name: scalar,
            posts: [Post],
            profile: Profile,
        }
    }

    crate::entity! {
        pub(crate) struct Profile {
            bio: scalar,
            links: opaque,
        }
    }

    crate::entity! {
        pub(crate) struct Post = "posts" {
            id: scalar,
            title: scalar,
            published_at: scalar,
            metadata: opaque,
            author: Author,
            comments: [Comment],
        }
    }

    crate::entity! {
        pub(crate) struct Comment = "comments" {
            id: scalar,
            body: scalar,
            author: Author,
        }
    }

    #[test]
    fn literal_paths_are_checked_at_compile_time() {
        let path = crate::path!(Post, "author.profile.bio");
        assert_eq!(path.as_str(), "author.profile.bio");
        let fields = crate::fields![Post; "id", "author.name", "comments.author.name"];
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn mutually_recursive_entities() {
        let fields = crate::fields![Post; "author.posts.id", "author.posts.author.name"];
        assert_eq!(
            fields.iter().map(FieldPath::as_str).collect::<Vec<_>>(),
            vec!["author.posts.id", "author.posts.author.name"]
        );
        let fields = Fields::<Author>::parse(["posts.author.posts.id"]).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(std::ptr::eq(
            Post::SHAPE,
            match Author::SHAPE.field("posts").unwrap().kind() {
                FieldKind::List(shape) => shape,
                other => panic!("unexpected kind {other:?}"),
            }
        ));
    }

    mod library {
        crate::entity! {
            pub(crate) struct Shelf = "shelves" {
                id: scalar,
                books: [Book],
            }
        }

        crate::entity! {
            pub(crate) struct Book = "books" {
                isbn: scalar,
                shelf: Shelf,
            }
        }
    }

    crate::entity! {
        pub(crate) struct Loan = "loans" {
            id: scalar,
            book: Book,
        }
    }

    use self::library::__BOOK_SHAPE;
    use self::library::Book;

    #[test]
    fn entities_from_other_modules() {
        let fields = crate::fields![Loan; "book.shelf.books.isbn"];
        assert_eq!(fields.len(), 1);
        assert_eq!(
            FieldPath::<Loan>::parse("book.title").unwrap_err(),
            PathError::UnknownField {
                path: "book.title".to_string(),
                segment: "title".to_string(),
                shape: "Book",
            }
        );
        assert_eq!(<Book as Entity>::NAME, "books");
    }

    #[test]
    fn recursive_shapes_resolve() {
        assert_eq!(
            check_path(Post::SHAPE, "author.posts.author.name"),
            PathCheck::Valid
        );
        assert_eq!(check_path(Author::SHAPE, "posts.comments.body"), PathCheck::Valid);
    }

    #[test]
    fn depth_is_capped() {
        assert_eq!(
            check_path(Post::SHAPE, "author.posts.author.posts.id"),
            PathCheck::TooDeep
        );
        assert_eq!(
            FieldPath::<Post>::parse("author.posts.author.posts.id"),
            Err(PathError::TooDeep {
                path: "author.posts.author.posts.id".to_string(),
                max: MAX_PATH_DEPTH,
            })
        );
    }

    #[test]
    fn unknown_segment_is_rejected() {
        assert_eq!(
            FieldPath::<Post>::parse("author.nickname").unwrap_err(),
            PathError::UnknownField {
                path: "author.nickname".to_string(),
                segment: "nickname".to_string(),
                shape: "Author",
            }
        );
        assert_eq!(
            FieldPath::<Post>::parse("nope").unwrap_err().to_string(),
            "'Post' has no field 'nope' (field path 'nope')"
        );
    }

    #[test]
    fn objects_are_not_leaves() {
        assert_eq!(
            FieldPath::<Post>::parse("author").unwrap_err(),
            PathError::NotALeaf {
                path: "author".to_string(),
                segment: "author".to_string(),
            }
        );
        assert_eq!(
            FieldPath::<Post>::parse("comments").unwrap_err(),
            PathError::NotALeaf {
                path: "comments".to_string(),
                segment: "comments".to_string(),
            }
        );
    }

    #[test]
    fn opaque_fields_terminate_paths() {
        assert!(FieldPath::<Post>::parse("metadata").is_ok());
        assert!(FieldPath::<Post>::parse("author.profile.links").is_ok());
        assert_eq!(
            FieldPath::<Post>::parse("metadata.tags").unwrap_err(),
            PathError::NoSubfields {
                path: "metadata.tags".to_string(),
                segment: "metadata".to_string(),
            }
        );
        assert_eq!(
            check_path(Post::SHAPE, "title.length"),
            PathCheck::NoSubfields { segment: 0 }
        );
    }

    #[test]
    fn malformed_paths() {
        assert_eq!(FieldPath::<Post>::parse("").unwrap_err(), PathError::EmptyPath);
        assert_eq!(
            FieldPath::<Post>::parse("author..name").unwrap_err(),
            PathError::EmptySegment {
                path: "author..name".to_string()
            }
        );
        assert_eq!(check_path(Post::SHAPE, "author."), PathCheck::EmptySegment);
        assert_eq!(check_path(Post::SHAPE, ".id"), PathCheck::EmptySegment);
    }

    #[test]
    fn runtime_fields_must_not_be_empty() {
        assert_eq!(
            Fields::<Post>::parse(Vec::<String>::new()).unwrap_err(),
            PathError::NoFields
        );
        let fields = Fields::<Post>::parse(["id", "author.name"]).unwrap();
        assert_eq!(
            fields.iter().map(FieldPath::as_str).collect::<Vec<_>>(),
            vec!["id", "author.name"]
        );
    }

    #[test]
    fn primary_keys_are_root_scalars() {
        let key = PrimaryKey::<Post>::new("id", 42).unwrap();
        assert_eq!(key.name(), "id");
        assert_eq!(key.value(), &KeyValue::Int(42));
        assert_eq!(
            PrimaryKey::<Post>::new("author", 1).unwrap_err(),
            PathError::InvalidPrimaryKey {
                name: "author".to_string(),
                shape: "Post",
            }
        );
        assert!(PrimaryKey::<Post>::new("author.id", 1).is_err());
        assert!(PrimaryKey::<Post>::new("metadata", "x").is_err());
    }

    #[test]
    fn literal_primary_keys_are_checked_at_compile_time() {
        let key = crate::pk!(Post, "id", 42);
        assert_eq!(key.name(), "id");
        assert_eq!(key.value(), &KeyValue::Int(42));
        let key = crate::pk!(Author, "name", "Ada");
        assert_eq!(key.value(), &KeyValue::String("Ada".to_string()));
        assert!(is_primary_key(Post::SHAPE, "title"));
        assert!(!is_primary_key(Post::SHAPE, "author"));
        assert!(!is_primary_key(Post::SHAPE, "metadata"));
        assert!(!is_primary_key(Post::SHAPE, "author.id"));
        assert!(!is_primary_key(Post::SHAPE, ""));
    }

    #[test]
    fn graphql_names() {
        assert!(is_valid_name("_and"));
        assert!(is_valid_name("published_at2"));
        assert!(!is_valid_name("2fast"));
        assert!(!is_valid_name("with-dash"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("naïve"));
    }
}
