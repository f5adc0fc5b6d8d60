//! Field schema descriptors.
//!
//! A [`Field`] describes one remote field. Its attributes (type, label,
//! properties, ...) are owned by the remote schema and kept as opaque
//! key/value pairs; only `type` is read by the record itself.

use crate::alias::deserialize_fid;
use crate::value::value_to_string;
use crate::FieldId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field types the remote store computes itself and rejects on write.
pub const COMPUTED_FIELD_TYPES: [&str; 3] = ["lookup", "summary", "formula"];

/// Schema descriptor for one remote field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Application the field's table belongs to
    #[serde(default)]
    application_id: String,
    /// Table the field belongs to
    #[serde(default)]
    table_id: String,
    /// Remote field identifier
    #[serde(deserialize_with = "deserialize_fid")]
    fid: FieldId,
    /// Attributes copied from the remote schema
    #[serde(default)]
    data: Map<String, Value>,
}

/// Transport form of a [`Field`].
pub type FieldJson = Field;

impl Field {
    /// Create a descriptor bound to a remote table.
    pub fn new(
        application_id: impl Into<String>,
        table_id: impl Into<String>,
        fid: impl Into<FieldId>,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            table_id: table_id.into(),
            fid: fid.into(),
            data: Map::new(),
        }
    }

    pub fn fid(&self) -> &str {
        &self.fid
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Read an attribute.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.data.get(attribute)
    }

    /// Overwrite an attribute.
    pub fn set(&mut self, attribute: impl Into<String>, value: Value) -> &mut Self {
        self.data.insert(attribute.into(), value);
        self
    }

    /// All attributes.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.data
    }

    /// The field's `type` attribute, if it is a string.
    pub fn field_type(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }

    /// Whether the remote store derives this field's value (lookup, summary,
    /// formula) and ignores writes to it.
    pub fn is_computed(&self) -> bool {
        self.field_type()
            .is_some_and(|t| COMPUTED_FIELD_TYPES.contains(&t))
    }

    /// Serialize into the transport form.
    pub fn to_json(&self) -> FieldJson {
        self.clone()
    }

    /// Rebuild a descriptor from its transport form.
    pub fn from_json(json: FieldJson) -> Self {
        json
    }
}

/// Read the identifier of a descriptor returned by the remote schema call.
///
/// Remote descriptors carry their identifier under `id`, as a string or a
/// number.
pub fn remote_fid(descriptor: &Map<String, Value>) -> Option<FieldId> {
    match descriptor.get("id")? {
        Value::Null => None,
        id => Some(value_to_string(id)),
    }
}
