//! Schema-less documents at the HTTP boundary.
//!
//! Request bodies arrive as arbitrary JSON objects and are stored as BSON
//! without any per-collection typing. Responses go the other way.

use mongodb::bson::{self, doc, Bson, Document};
use serde_json::{Map, Value};

use crate::errors::Result;

pub type Fields = Map<String, Value>;

pub const IMAGE_PATH_FIELD: &str = "imagePath";
pub const ADDITIONAL_DATA_FIELD: &str = "additionalData";

pub fn from_fields(fields: &Fields) -> Result<Document> {
    Ok(bson::to_document(fields)?)
}

/// The submitted fields are nested under `additionalData`, next to the
/// object store URL. They are not merged into the top level.
pub fn image_document(secure_url: &str, fields: &Fields) -> Result<Document> {
    Ok(doc! {
        IMAGE_PATH_FIELD: secure_url,
        ADDITIONAL_DATA_FIELD: from_fields(fields)?,
    })
}

pub fn to_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, to_json_value(value)))
            .collect(),
    )
}

/// Object ids become their hex string and dates an RFC 3339 string, the way
/// they render in the stores' own JSON tooling. Everything else is relaxed
/// extended JSON.
pub fn to_json_value(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(date) => match date.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Bson::DateTime(date).into_relaxed_extjson(),
        },
        Bson::Document(document) => to_json(document),
        Bson::Array(values) => Value::Array(values.into_iter().map(to_json_value).collect()),
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    use super::*;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn image_document_nests_submitted_fields() {
        let document =
            image_document("https://cdn.test/a.png", &fields(json!({ "a": 1, "b": 2 }))).unwrap();

        assert_eq!(
            to_json(document),
            json!({
                "imagePath": "https://cdn.test/a.png",
                "additionalData": { "a": 1, "b": 2 }
            })
        );
    }

    #[test]
    fn stored_ids_render_as_hex_strings() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "title": "hello",
            "tags": ["x", { "ref": id }],
            "count": 3,
            "ratio": 0.5,
            "missing": Bson::Null,
        };

        assert_eq!(
            to_json(document),
            json!({
                "_id": id.to_hex(),
                "title": "hello",
                "tags": ["x", { "ref": id.to_hex() }],
                "count": 3,
                "ratio": 0.5,
                "missing": null,
            })
        );
    }

    #[test]
    fn nested_values_survive_a_store_round_trip() {
        let input = fields(json!({
            "name": "Widget",
            "active": true,
            "dims": { "w": 2, "h": 3.5 },
            "list": [1, "two", null]
        }));
        let stored = from_fields(&input).unwrap();
        assert_eq!(to_json(stored), Value::Object(input));
    }
}
