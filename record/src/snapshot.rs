//! Transport form of a record, for persisting it or handing it to another
//! process.

use crate::alias::FieldAliases;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::field::FieldJson;
use crate::Data;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serialized record: client config, coordinates, aliases, remote record id,
/// schema descriptors and data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordJson {
    /// Remote client configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highsystems: Option<ClientConfig>,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub table_id: String,
    /// Name → identifier aliases, in insertion order
    #[serde(default)]
    pub fids: FieldAliases,
    /// Remote record id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recordid: Option<Value>,
    #[serde(default)]
    pub fields: Vec<FieldJson>,
    #[serde(default)]
    pub data: Data,
}

/// Anything a record can be restored from.
#[derive(Debug, Clone)]
pub enum RecordSource {
    /// JSON text
    Text(String),
    /// Decoded JSON
    Value(Value),
    /// Already typed
    Json(RecordJson),
}

impl RecordSource {
    /// Decode into a [`RecordJson`].
    ///
    /// Anything other than a JSON object, or an object whose members have the
    /// wrong shape, is a [`Error::TypeMismatch`].
    pub fn decode(self) -> Result<RecordJson> {
        let value = match self {
            RecordSource::Json(json) => return Ok(json),
            RecordSource::Value(value) => value,
            RecordSource::Text(text) => {
                serde_json::from_str(&text).map_err(|e| Error::TypeMismatch(e.to_string()))?
            }
        };

        if !value.is_object() {
            return Err(Error::TypeMismatch(format!(
                "expected object, got {}",
                json_type_name(&value)
            )));
        }

        serde_json::from_value(value).map_err(|e| Error::TypeMismatch(e.to_string()))
    }
}

impl From<&str> for RecordSource {
    fn from(text: &str) -> Self {
        RecordSource::Text(text.to_string())
    }
}

impl From<String> for RecordSource {
    fn from(text: String) -> Self {
        RecordSource::Text(text)
    }
}

impl From<&String> for RecordSource {
    fn from(text: &String) -> Self {
        RecordSource::Text(text.clone())
    }
}

impl From<Value> for RecordSource {
    fn from(value: Value) -> Self {
        RecordSource::Value(value)
    }
}

impl From<RecordJson> for RecordSource {
    fn from(json: RecordJson) -> Self {
        RecordSource::Json(json)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_text() {
        let json = RecordSource::from(r#"{"applicationId":"app1","fids":{"recordid":"id"}}"#)
            .decode()
            .unwrap();

        assert_eq!(json.application_id, "app1");
        assert_eq!(json.table_id, "");
        assert_eq!(json.fids.fid("recordid"), Some("id"));
        assert!(json.highsystems.is_none());
        assert!(json.fields.is_empty());
    }

    #[test]
    fn decode_rejects_non_objects() {
        for input in [json!(null), json!(3), json!("text"), json!([1, 2])] {
            let err = RecordSource::from(input.clone()).decode().unwrap_err();
            assert!(
                matches!(err, Error::TypeMismatch(_)),
                "{input} should be rejected"
            );
        }

        let err = RecordSource::from("\"just a string\"").decode().unwrap_err();
        assert_eq!(
            err.to_string(),
            "json argument must be an object or a valid JSON string: expected object, got string"
        );
    }

    #[test]
    fn decode_rejects_invalid_text() {
        let err = RecordSource::from("{not json").decode().unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn decode_rejects_wrong_member_shapes() {
        let err = RecordSource::from(json!({"fids": ["recordid"]}))
            .decode()
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));

        let err = RecordSource::from(json!({"fields": [{"label": "no fid"}]}))
            .decode()
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn serialized_layout() {
        let json = RecordJson {
            highsystems: Some(ClientConfig::new("acme")),
            application_id: "app1".into(),
            table_id: "tbl1".into(),
            fids: [("recordid", "id"), ("name", "6")].into_iter().collect(),
            recordid: Some(json!("42")),
            fields: vec![],
            data: json!({"name": "Ada"}).as_object().cloned().unwrap(),
        };

        assert_eq!(
            serde_json::to_value(&json).unwrap(),
            json!({
                "highsystems": {"instance": "acme"},
                "applicationId": "app1",
                "tableId": "tbl1",
                "fids": {"recordid": "id", "name": "6"},
                "recordid": "42",
                "fields": [],
                "data": {"name": "Ada"}
            })
        );
    }
}
