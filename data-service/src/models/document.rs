use mongodb::bson;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use service_core::error::AppError;

/// Field the store uses for its own identifier. Never returned to clients.
pub const ID_FIELD: &str = "_id";

/// One stored JSON object. The gateway never inspects its fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub Map<String, Value>);

impl Document {
    /// Drops the store-assigned identifier, if present.
    pub fn without_id(mut self) -> Self {
        self.0.remove(ID_FIELD);
        self
    }

    /// Converts to BSON through serde, so JSON values are stored as-is and
    /// `$`-prefixed keys are not interpreted as extended JSON.
    pub fn to_bson(&self) -> Result<bson::Document, AppError> {
        bson::to_document(&self.0).map_err(|e| {
            AppError::MalformedInput(anyhow::anyhow!("Document cannot be stored: {}", e))
        })
    }

    pub fn from_bson(document: bson::Document) -> Result<Self, AppError> {
        let fields: Map<String, Value> = bson::from_document(document).map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Stored document is not valid JSON: {}", e))
        })?;
        Ok(Self(fields).without_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId};
    use serde_json::json;

    fn document(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn only_json_objects_deserialize() {
        assert!(serde_json::from_value::<Document>(json!({"a": 1})).is_ok());
        assert!(serde_json::from_value::<Document>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<Document>(json!("text")).is_err());
        assert!(serde_json::from_value::<Document>(Value::Null).is_err());
    }

    #[test]
    fn serializes_as_plain_object() {
        let doc = document(json!({"name": "a", "value": 1}));
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"name": "a", "value": 1})
        );
    }

    #[test]
    fn bson_conversion_preserves_every_json_kind() {
        let original = document(json!({
            "string": "text",
            "int": 1,
            "negative": -42,
            "float": 2.5,
            "bool": true,
            "null": null,
            "nested": {"inner": [1, "two", {"three": 3.0}]},
            "empty_array": [],
            "empty_object": {}
        }));

        let stored = original.to_bson().unwrap();
        let restored = Document::from_bson(stored).unwrap();

        assert_eq!(restored, original);
    }

    #[test]
    fn dollar_keys_are_not_treated_as_extended_json() {
        let original = document(json!({"when": {"$date": "2024-01-01"}}));
        let stored = original.to_bson().unwrap();
        assert_eq!(
            stored.get_document("when").unwrap().get_str("$date").unwrap(),
            "2024-01-01"
        );
    }

    #[test]
    fn from_bson_strips_identifier() {
        let stored = doc! { "_id": ObjectId::new(), "name": "a", "value": 1 };
        let restored = Document::from_bson(stored).unwrap();
        assert_eq!(restored, document(json!({"name": "a", "value": 1})));
    }

    #[test]
    fn integers_beyond_i64_are_rejected() {
        let original = document(json!({"big": u64::MAX}));
        assert!(matches!(
            original.to_bson(),
            Err(AppError::MalformedInput(_))
        ));
    }
}
