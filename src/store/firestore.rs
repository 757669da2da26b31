//! REST adapter for the hosted document database.
//!
//! Documents travel in the store's tagged value encoding
//! (`{"stringValue": ..}`, `{"mapValue": {"fields": ..}}`, ...). The
//! codec at the bottom of this file converts between that encoding and
//! plain JSON so the models can stay ordinary serde types.

use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::{self, RawlineConfig};
use crate::error::{RawlineError, Result};
use crate::models::{ContentPatch, Item, ItemPatch, NewItem, SiteContent};
use crate::store::{sort_newest_first, RemoteStore};

/// Blocking REST client for the pieces collection and the settings
/// document.
pub struct FirestoreStore {
    client: Client,
    documents_url: String,
    api_key: String,
    token: Option<String>,
}

impl FirestoreStore {
    /// Build a store for the project in `config`.
    ///
    /// `timeout` of `None` leaves the transport's default in place.
    pub fn new(config: &RawlineConfig, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            documents_url: config.documents_url(),
            api_key: config.firebase_api_key.clone(),
            token: None,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, id)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let mut request = request.query(&[("key", self.api_key.as_str())]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        check_status(request.send()?)
    }
}

impl RemoteStore for FirestoreStore {
    fn list_items(&self) -> Result<Vec<Item>> {
        let url = self.collection_url(config::PIECES_COLLECTION);
        let page_size = config::LIST_PAGE_SIZE.to_string();
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("pageSize", page_size.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: Value = self.send(request)?.json()?;

            if let Some(Value::Array(docs)) = page.get("documents") {
                for doc in docs {
                    match decode_item(doc) {
                        Ok(item) => items.push(item),
                        Err(e) => warn!(
                            "Skipping malformed piece {}: {}",
                            doc.get("name").and_then(Value::as_str).unwrap_or("?"),
                            e
                        ),
                    }
                }
            }

            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        debug!("Listed {} pieces", items.len());
        sort_newest_first(&mut items);
        Ok(items)
    }

    fn create_item(&self, item: &NewItem) -> Result<Item> {
        item.validate()?;
        let body = json!({ "fields": encode_fields(item)? });
        let request = self
            .client
            .post(self.collection_url(config::PIECES_COLLECTION))
            .json(&body);
        let doc: Value = self.send(request)?.json()?;
        decode_item(&doc)
    }

    fn update_item(&self, id: &str, patch: &ItemPatch) -> Result<()> {
        patch.validate()?;
        let mut params: Vec<(&str, &str)> = patch
            .field_paths()
            .into_iter()
            .map(|path| ("updateMask.fieldPaths", path))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let request = self
            .client
            .patch(self.document_url(config::PIECES_COLLECTION, id))
            .query(&params)
            .json(&json!({ "fields": encode_fields(patch)? }));
        self.send(request).map_err(|e| match e {
            RawlineError::NotFound(_) => RawlineError::NotFound(format!("piece {}", id)),
            other => other,
        })?;
        Ok(())
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.document_url(config::PIECES_COLLECTION, id));
        self.send(request)?;
        Ok(())
    }

    fn get_site_content(&self) -> Result<Option<ContentPatch>> {
        let request = self.client.get(self.document_url(
            config::SETTINGS_COLLECTION,
            config::CONTENT_DOC_ID,
        ));
        let doc: Value = match self.send(request) {
            Ok(resp) => resp.json()?,
            Err(RawlineError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(decode_document(&doc)?))
    }

    fn save_site_content(&self, content: &SiteContent) -> Result<()> {
        // No update mask: the stored document is replaced wholesale.
        let request = self
            .client
            .patch(self.document_url(
                config::SETTINGS_COLLECTION,
                config::CONTENT_DOC_ID,
            ))
            .json(&json!({ "fields": encode_fields(content)? }));
        self.send(request)?;
        Ok(())
    }

    fn authorize(&mut self, token: Option<&str>) {
        self.token = token.map(str::to_string);
    }
}

/// Turn a non-success response into the matching error variant.
fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body: Value = resp.json().unwrap_or(Value::Null);
    let message = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
        .to_string();

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RawlineError::Permission(message),
        StatusCode::NOT_FOUND => RawlineError::NotFound(message),
        _ => RawlineError::Remote {
            status: status.as_u16(),
            message,
        },
    })
}

// ---------------------------------------------------------------------------
// Document decoding
// ---------------------------------------------------------------------------

/// Last path segment of a document resource name.
fn document_id(doc: &Value) -> Option<&str> {
    doc.get("name")
        .and_then(Value::as_str)
        .and_then(|name| name.rsplit('/').next())
}

fn decode_document<T: DeserializeOwned>(doc: &Value) -> Result<T> {
    let fields = match doc.get("fields") {
        Some(f) => decode_map(f)?,
        None => Map::new(),
    };
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Decode a piece. The id comes from the resource name; a missing
/// `createdAt` field falls back to the server's `createTime`.
pub fn decode_item(doc: &Value) -> Result<Item> {
    let id = document_id(doc)
        .ok_or_else(|| RawlineError::InvalidArgument("document without a name".into()))?;
    let mut fields = match doc.get("fields") {
        Some(f) => decode_map(f)?,
        None => Map::new(),
    };
    fields.insert("id".to_string(), Value::String(id.to_string()));
    if !fields.contains_key("createdAt") {
        if let Some(create_time) = doc.get("createTime") {
            fields.insert("createdAt".to_string(), create_time.clone());
        }
    }
    Ok(serde_json::from_value(Value::Object(fields))?)
}

// ---------------------------------------------------------------------------
// Value codec
// ---------------------------------------------------------------------------

/// Serialize `value` and encode it as a document `fields` map.
pub fn encode_fields<T: Serialize>(value: &T) -> Result<Value> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect(),
        )),
        other => Err(RawlineError::InvalidArgument(format!(
            "expected an object to encode, got {}",
            other
        ))),
    }
}

/// Plain JSON to the tagged encoding.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => json!({
            "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({
            "mapValue": {
                "fields": map
                    .iter()
                    .map(|(k, v)| (k.clone(), encode_value(v)))
                    .collect::<Map<String, Value>>()
            }
        }),
    }
}

fn decode_map(fields: &Value) -> Result<Map<String, Value>> {
    let Some(fields) = fields.as_object() else {
        return Err(RawlineError::InvalidArgument(
            "document fields must be an object".into(),
        ));
    };
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}

/// Tagged encoding back to plain JSON. Timestamps, references and bytes
/// decode to their string form.
pub fn decode_value(value: &Value) -> Result<Value> {
    let Some((tag, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Err(RawlineError::InvalidArgument(format!(
            "untagged document value: {}",
            value
        )));
    };

    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            Ok(inner.clone())
        }
        "integerValue" => {
            // Sent as a decimal string to keep 64-bit precision.
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed.map(Value::from).ok_or_else(|| {
                RawlineError::InvalidArgument(format!("bad integerValue: {}", inner))
            })
        }
        "doubleValue" => Ok(match inner {
            Value::Number(_) => inner.clone(),
            // NaN and infinities arrive as strings and have no JSON form.
            _ => Value::Null,
        }),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|vs| vs.iter().map(decode_value).collect::<Result<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        "mapValue" => match inner.get("fields") {
            Some(fields) => Ok(Value::Object(decode_map(fields)?)),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(RawlineError::InvalidArgument(format!(
            "unsupported document value type: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ItemStatus};

    #[test]
    fn values_survive_the_tagged_encoding() {
        let plain = json!({
            "code": "RL-ARCH-0007",
            "price": 75.5,
            "count": 3,
            "flag": true,
            "none": null,
            "gallery": ["a", "b"],
            "nested": { "title": "fit" }
        });
        let encoded = encode_value(&plain);
        assert_eq!(encoded["mapValue"]["fields"]["count"], json!({"integerValue": "3"}));
        assert_eq!(
            encoded["mapValue"]["fields"]["gallery"]["arrayValue"]["values"][1],
            json!({"stringValue": "b"})
        );
        assert_eq!(decode_value(&encoded).unwrap(), plain);
    }

    #[test]
    fn empty_array_and_map_decode() {
        assert_eq!(decode_value(&json!({"arrayValue": {}})).unwrap(), json!([]));
        assert_eq!(decode_value(&json!({"mapValue": {}})).unwrap(), json!({}));
        assert!(decode_value(&json!({"mysteryValue": 1})).is_err());
    }

    #[test]
    fn item_decoding_uses_name_and_create_time() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/pieces/AbC123",
            "createTime": "2024-05-01T10:00:00.123456Z",
            "fields": {
                "code": {"stringValue": "RL-ARCH-0001"},
                "era": {"stringValue": "Indica"},
                "status": {"stringValue": "IN_STOCK"},
                "imageUrl": {"stringValue": "https://res.cloudinary.com/x/image/upload/a.jpg"},
                "classification": {"stringValue": "Flower"},
                "price": {"integerValue": "45"}
            }
        });
        let item = decode_item(&doc).unwrap();
        assert_eq!(item.id, "AbC123");
        assert_eq!(item.status, ItemStatus::InStock);
        assert_eq!(item.category, Some(Category::Flower));
        assert_eq!(item.price, Some(45.0));
        assert_eq!(
            item.created_at.unwrap().to_rfc3339(),
            "2024-05-01T10:00:00.123456+00:00"
        );
    }

    #[test]
    fn explicit_created_at_wins_over_create_time() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/pieces/x",
            "createTime": "2024-05-01T10:00:00Z",
            "fields": {
                "code": {"stringValue": "c"},
                "status": {"stringValue": "ARCHIVED"},
                "imageUrl": {"stringValue": "u"},
                "createdAt": {"timestampValue": "2023-01-01T00:00:00Z"}
            }
        });
        let item = decode_item(&doc).unwrap();
        assert_eq!(item.created_at.unwrap().to_rfc3339(), "2023-01-01T00:00:00+00:00");
    }

    #[test]
    fn patch_encodes_only_set_fields() {
        let patch = ItemPatch::default().price(75.0);
        let fields = encode_fields(&patch).unwrap();
        assert_eq!(fields, json!({"price": {"doubleValue": 75.0}}));
    }
}
