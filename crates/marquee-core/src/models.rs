//! Domain models shared by the stages.

use serde_json::Value;

/// Catalog entity identifier (a TMDB movie id).
pub type EntityId = u64;

/// An opaque JSON record as returned by the API.
///
/// Detail and credits documents are stored exactly as received; the only
/// field the harvester relies on is the numeric `id`.
pub type Document = Value;

/// Reads the numeric `id` field of a stored document.
///
/// Returns `None` for documents without an `id` or with a non-integer one,
/// such as the empty objects older runs wrote for failed fetches.
///
/// # Examples
///
/// ```
/// use marquee_core::models::document_id;
/// use serde_json::json;
///
/// assert_eq!(document_id(&json!({"id": 603, "title": "The Matrix"})), Some(603));
/// assert_eq!(document_id(&json!({})), None);
/// assert_eq!(document_id(&json!({"id": "603"})), None);
/// ```
pub fn document_id(document: &Document) -> Option<EntityId> {
    document.get("id").and_then(Value::as_u64)
}

/// Builds the record appended in place of a failed fetch.
pub fn placeholder(id: EntityId) -> Document {
    serde_json::json!({ "id": id })
}

/// Key under which a conflicting upstream `id` is kept.
pub const UPSTREAM_ID_KEY: &str = "upstream_id";

/// Ensures a fetched document carries the id it was requested for.
///
/// Objects without an `id` get one inserted. An object whose `id` differs
/// from the requested one has it replaced, and the upstream value moves to
/// [`UPSTREAM_ID_KEY`]; otherwise the requested id would never be marked as
/// stored. Anything that is not an object is wrapped.
///
/// # Examples
///
/// ```
/// use marquee_core::models::stamp_id;
/// use serde_json::json;
///
/// let doc = stamp_id(json!({"id": 11, "title": "Redirected"}), 10);
/// assert_eq!(doc, json!({"id": 10, "upstream_id": 11, "title": "Redirected"}));
/// ```
pub fn stamp_id(document: Document, id: EntityId) -> Document {
    match document {
        Value::Object(mut map) => {
            if let Some(upstream) = map.insert("id".to_string(), Value::from(id)) {
                if upstream.as_u64() != Some(id) {
                    map.insert(UPSTREAM_ID_KEY.to_string(), upstream);
                }
            }
            Value::Object(map)
        }
        other => serde_json::json!({ "id": id, "body": other }),
    }
}
