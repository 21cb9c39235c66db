//! GraphQL operation documents following the backend's naming convention.
//!
//! Each operation is assembled as an explicit [`Document`] (operation type,
//! variable declarations, root fields with arguments and selection sets) and
//! rendered in one place. Filters, orderings and payloads are inlined as
//! literals; pagination values travel as variables.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ClientError;
use crate::filter::OrderBy;
use crate::filter::Where;
use crate::graphql;
use crate::json_ext::Object;
use crate::json_ext::Value;
use crate::json_ext::ValueExt;
use crate::payload::InputValue;
use crate::payload::PayloadError;
use crate::schema::Entity;
use crate::schema::Fields;
use crate::schema::KeyValue;
use crate::schema::PrimaryKey;
use crate::selection::SelectionSet;

const RETURNING: &str = "returning";
const AGGREGATE: &str = "aggregate";
const COUNT: &str = "count";
const BATCH_ALIAS_PREFIX: &str = "query_key_";

/// `query` or `mutation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operations the backend exposes for every entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Select,
    ByPk,
    Aggregate,
    Insert,
    Update,
    Delete,
}

impl OperationKind {
    /// The root field name of this operation on `entity`.
    pub fn root_field(self, entity: &str) -> String {
        match self {
            OperationKind::Select => entity.to_string(),
            OperationKind::ByPk => format!("{entity}_by_pk"),
            OperationKind::Aggregate => format!("{entity}_aggregate"),
            OperationKind::Insert => format!("insert_{entity}"),
            OperationKind::Update => format!("update_{entity}"),
            OperationKind::Delete => format!("delete_{entity}"),
        }
    }

    pub fn operation_type(self) -> OperationType {
        match self {
            OperationKind::Select | OperationKind::ByPk | OperationKind::Aggregate => {
                OperationType::Query
            }
            OperationKind::Insert | OperationKind::Update | OperationKind::Delete => {
                OperationType::Mutation
            }
        }
    }

    /// Whether the affected rows come back under `returning`.
    pub fn has_returning(self) -> bool {
        self.operation_type() == OperationType::Mutation
    }
}

/// A variable declaration: `$limit: Int`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableDefinition {
    name: String,
    ty: &'static str,
}

impl VariableDefinition {
    pub fn new(name: impl Into<String>, ty: &'static str) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for VariableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}: {}", self.name, self.ty)
    }
}

/// An argument of a root field, with its value already rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argument {
    name: String,
    value: String,
}

impl Argument {
    /// An inlined literal. Enum values are rendered as strings.
    pub fn literal(name: impl Into<String>, value: &InputValue) -> Result<Self, PayloadError> {
        Ok(Self {
            name: name.into(),
            value: crate::payload::serialize(value)?,
        })
    }

    /// An inlined literal whose enum values are left unquoted.
    pub fn enum_literal(name: impl Into<String>, value: &InputValue) -> Result<Self, PayloadError> {
        Ok(Self {
            name: name.into(),
            value: crate::payload::serialize_enum_payload(value)?,
        })
    }

    /// A reference to the declared variable `variable`.
    pub fn variable(name: impl Into<String>, variable: &str) -> Self {
        Self {
            name: name.into(),
            value: format!("${variable}"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rendered value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// A root field of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootField {
    alias: Option<String>,
    name: String,
    arguments: Vec<Argument>,
    selection_set: SelectionSet,
}

impl RootField {
    pub fn new(name: impl Into<String>, selection_set: SelectionSet) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            selection_set,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn selection_set(&self) -> &SelectionSet {
        &self.selection_set
    }

    /// The key under which this field's value appears in `data`.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for RootField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{alias}: ")?;
        }
        f.write_str(&self.name)?;
        if !self.arguments.is_empty() {
            f.write_str("(")?;
            for (index, argument) in self.arguments.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{argument}")?;
            }
            f.write_str(")")?;
        }
        write!(f, " {}", self.selection_set)
    }
}

/// Optional arguments of a select.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectOptions {
    /// Maximum number of rows, sent as the `$limit` variable. Must fit in a
    /// GraphQL `Int`.
    pub limit: Option<u64>,
    /// Rows to skip, sent as the `$offset` variable. Must fit in a GraphQL `Int`.
    pub offset: Option<u64>,
    #[serde(rename = "where")]
    pub filter: Option<Where>,
    pub order_by: Option<OrderBy>,
}

#[buildstructor::buildstructor]
impl SelectOptions {
    #[builder(visibility = "pub")]
    fn new(
        limit: Option<u64>,
        offset: Option<u64>,
        filter: Option<Where>,
        order_by: Option<OrderBy>,
    ) -> Self {
        Self {
            limit,
            offset,
            filter,
            order_by,
        }
    }
}

/// Optional arguments of an update. Without a filter every row is updated.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateOptions {
    #[serde(rename = "where")]
    pub filter: Option<Where>,
}

#[buildstructor::buildstructor]
impl UpdateOptions {
    #[builder(visibility = "pub")]
    fn new(filter: Option<Where>) -> Self {
        Self { filter }
    }
}

/// Optional arguments of an aggregate.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregateOptions {
    #[serde(rename = "where")]
    pub filter: Option<Where>,
}

#[buildstructor::buildstructor]
impl AggregateOptions {
    #[builder(visibility = "pub")]
    fn new(filter: Option<Where>) -> Self {
        Self { filter }
    }
}

/// The result of an aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCount {
    pub count: u64,
}

/// One select of a batch, with its entity erased so that a batch may mix
/// entities.
#[derive(Clone, Debug)]
pub struct BatchSelect {
    entity: &'static str,
    selection_set: SelectionSet,
    options: SelectOptions,
}

impl BatchSelect {
    pub fn new<E: Entity>(fields: &Fields<E>, options: SelectOptions) -> Self {
        Self {
            entity: E::NAME,
            selection_set: fields.selection_set(),
            options,
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn selection_set(&self) -> &SelectionSet {
        &self.selection_set
    }
}

/// The alias of the `index`-th select of a batch.
pub fn batch_alias(index: usize) -> String {
    format!("{BATCH_ALIAS_PREFIX}{index}")
}

/// A complete operation, ready to be sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    operation_type: OperationType,
    variable_definitions: Vec<VariableDefinition>,
    fields: Vec<RootField>,
    variables: Object,
}

impl Document {
    fn new(operation_type: OperationType) -> Self {
        Self {
            operation_type,
            variable_definitions: Vec::new(),
            fields: Vec::new(),
            variables: Object::new(),
        }
    }

    /// `query($limit: Int, $offset: Int) { <entity>(limit: $limit, offset: $offset, where: {..}, order_by: {..}) { .. } }`
    pub fn select<E: Entity>(
        fields: &Fields<E>,
        options: &SelectOptions,
    ) -> Result<Self, PayloadError> {
        let mut document = Self::new(OperationType::Query);
        let field = document.select_field(
            OperationKind::Select.root_field(E::NAME),
            fields.selection_set(),
            options,
            None,
        )?;
        document.fields.push(field);
        Ok(document)
    }

    /// `query { <entity>_by_pk(<key>: <value>) { .. } }`
    ///
    /// With `legacy_quoting` the key value is always rendered as a string.
    pub fn by_pk<E: Entity>(
        key: &PrimaryKey<E>,
        fields: &Fields<E>,
        legacy_quoting: bool,
    ) -> Result<Self, PayloadError> {
        let value = match key.value() {
            value if legacy_quoting => InputValue::String(value.to_string()),
            KeyValue::Int(value) => InputValue::Int(*value),
            KeyValue::String(value) => InputValue::String(value.clone()),
        };
        let mut document = Self::new(OperationType::Query);
        document.fields.push(
            RootField::new(OperationKind::ByPk.root_field(E::NAME), fields.selection_set())
                .with_argument(Argument::literal(key.name(), &value)?),
        );
        Ok(document)
    }

    /// Several selects in one query, aliased `query_key_<index>`, each with
    /// its own `$query_key_<index>_limit`/`$query_key_<index>_offset`.
    pub fn select_batch(items: &[BatchSelect]) -> Result<Self, PayloadError> {
        let mut document = Self::new(OperationType::Query);
        for (index, item) in items.iter().enumerate() {
            let alias = batch_alias(index);
            let field = document.select_field(
                OperationKind::Select.root_field(item.entity),
                item.selection_set.clone(),
                &item.options,
                Some(&alias),
            )?;
            document.fields.push(field.with_alias(alias));
        }
        Ok(document)
    }

    /// `mutation { insert_<entity>(objects: ..) { returning { .. } } }`
    ///
    /// `objects` must serialize to an object or a list of objects.
    pub fn insert<E: Entity, T: Serialize + ?Sized>(
        objects: &T,
        returning: &Fields<E>,
    ) -> Result<Self, PayloadError> {
        let objects = InputValue::objects_from_serialize(objects)?;
        let mut document = Self::new(OperationType::Mutation);
        document.fields.push(
            RootField::new(
                OperationKind::Insert.root_field(E::NAME),
                SelectionSet::nested(RETURNING, returning.selection_set()),
            )
            .with_argument(Argument::literal("objects", &objects)?),
        );
        Ok(document)
    }

    /// `mutation { update_<entity>(where: .., _set: ..) { returning { .. } } }`
    ///
    /// Without a filter `where: {}` is sent, which matches every row.
    pub fn update<E: Entity, T: Serialize + ?Sized>(
        set: &T,
        returning: &Fields<E>,
        options: &UpdateOptions,
    ) -> Result<Self, PayloadError> {
        let set = InputValue::object_from_serialize(set)?;
        let filter = match &options.filter {
            Some(filter) => filter.to_input_value(),
            None => InputValue::Object(Vec::new()),
        };
        let mut document = Self::new(OperationType::Mutation);
        document.fields.push(
            RootField::new(
                OperationKind::Update.root_field(E::NAME),
                SelectionSet::nested(RETURNING, returning.selection_set()),
            )
            .with_argument(Argument::literal("where", &filter)?)
            .with_argument(Argument::literal("_set", &set)?),
        );
        Ok(document)
    }

    /// `mutation { delete_<entity>(where: ..) { returning { .. } } }`
    pub fn delete<E: Entity>(filter: &Where, returning: &Fields<E>) -> Result<Self, PayloadError> {
        let mut document = Self::new(OperationType::Mutation);
        document.fields.push(
            RootField::new(
                OperationKind::Delete.root_field(E::NAME),
                SelectionSet::nested(RETURNING, returning.selection_set()),
            )
            .with_argument(Argument::literal("where", &filter.to_input_value())?),
        );
        Ok(document)
    }

    /// `query { <entity>_aggregate(where: ..) { aggregate { count } } }`
    pub fn aggregate<E: Entity>(options: &AggregateOptions) -> Result<Self, PayloadError> {
        let mut field = RootField::new(
            OperationKind::Aggregate.root_field(E::NAME),
            SelectionSet::nested(AGGREGATE, SelectionSet::leaves([COUNT])),
        );
        if let Some(filter) = &options.filter {
            field = field.with_argument(Argument::literal("where", &filter.to_input_value())?);
        }
        let mut document = Self::new(OperationType::Query);
        document.fields.push(field);
        Ok(document)
    }

    fn select_field(
        &mut self,
        name: String,
        selection_set: SelectionSet,
        options: &SelectOptions,
        variable_prefix: Option<&str>,
    ) -> Result<RootField, PayloadError> {
        let mut field = RootField::new(name, selection_set);
        let pagination = [("limit", options.limit), ("offset", options.offset)];
        for (argument, value) in pagination {
            let Some(value) = value else {
                continue;
            };
            if i32::try_from(value).is_err() {
                return Err(PayloadError::IntegerOutOfRange(value.to_string()));
            }
            let variable = match variable_prefix {
                Some(prefix) => format!("{prefix}_{argument}"),
                None => argument.to_string(),
            };
            self.variable_definitions
                .push(VariableDefinition::new(variable.clone(), "Int"));
            self.variables.insert(variable.clone(), Value::from(value));
            field = field.with_argument(Argument::variable(argument, &variable));
        }
        if let Some(filter) = &options.filter {
            field = field.with_argument(Argument::literal("where", &filter.to_input_value())?);
        }
        if let Some(order_by) = &options.order_by {
            field =
                field.with_argument(Argument::enum_literal("order_by", &order_by.to_input_value())?);
        }
        Ok(field)
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn variable_definitions(&self) -> &[VariableDefinition] {
        &self.variable_definitions
    }

    pub fn fields(&self) -> &[RootField] {
        &self.fields
    }

    /// The variable values, sent next to the query text.
    pub fn variables(&self) -> &Object {
        &self.variables
    }

    /// Names the operation in errors and logs: its root field names.
    pub fn root_fields(&self) -> String {
        self.fields
            .iter()
            .map(RootField::name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn into_request(self) -> graphql::Request {
        let query = self.to_string();
        graphql::Request::builder()
            .query(query)
            .variables(self.variables)
            .build()
    }
}

/// Renders the document on a single line.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation_type.as_str())?;
        if !self.variable_definitions.is_empty() {
            f.write_str("(")?;
            for (index, definition) in self.variable_definitions.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{definition}")?;
            }
            f.write_str(")")?;
        }
        f.write_str(" {")?;
        for field in &self.fields {
            write!(f, " {field}")?;
        }
        f.write_str(" }")
    }
}

/// Checks a response for backend errors and returns its `data`.
pub(crate) fn response_data(
    response: graphql::Response,
    root_field: &str,
) -> Result<Value, ClientError> {
    if !response.errors.is_empty() {
        return Err(ClientError::Backend {
            root_field: root_field.to_string(),
            errors: response.errors.into(),
        });
    }
    match response.data {
        Some(data @ Value::Object(_)) => Ok(data),
        Some(other) => Err(ClientError::malformed(format!(
            "expected `data` to be an object, found {}",
            other.kind()
        ))),
        None => Err(ClientError::malformed(
            "response carries neither data nor errors",
        )),
    }
}

/// Takes the value of root field `key` out of `data`.
pub(crate) fn take_root(data: &mut Value, key: &str) -> Result<Value, ClientError> {
    data.take_key(key)
        .ok_or_else(|| ClientError::malformed(format!("missing root field '{key}' in `data`")))
}

/// Takes `returning` out of a mutation's root value.
pub(crate) fn take_returning(mut value: Value, root_field: &str) -> Result<Value, ClientError> {
    value.take_key(RETURNING).ok_or_else(|| {
        ClientError::malformed(format!("missing `{RETURNING}` in '{root_field}'"))
    })
}

/// Reads `aggregate.count` out of an aggregate's root value.
pub(crate) fn take_count(mut value: Value, root_field: &str) -> Result<AggregateCount, ClientError> {
    let aggregate = value.take_key(AGGREGATE).ok_or_else(|| {
        ClientError::malformed(format!("missing `{AGGREGATE}` in '{root_field}'"))
    })?;
    serde_json::from_value(aggregate).map_err(|error| {
        ClientError::malformed(format!("invalid `{AGGREGATE}` in '{root_field}': {error}"))
    })
}
