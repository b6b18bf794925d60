//! Data model shared by the client, the storage layer and the views.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The credential pair persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub api_key: String,
    pub user_id: String,
}

/// One QR code record as returned by the list endpoint.
///
/// Wire names are upper-case. Text fields tolerate numbers and `null`;
/// `PARAMS` tolerates the empty array some backends send instead of `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCode {
    #[serde(rename = "ID", default, deserialize_with = "de_text")]
    pub id: String,
    #[serde(rename = "NAME", default, deserialize_with = "de_text")]
    pub name: String,
    #[serde(rename = "TYPE", default, deserialize_with = "de_text")]
    pub kind: String,
    #[serde(rename = "CONTENT", default, deserialize_with = "de_text")]
    pub content: String,
    #[serde(
        rename = "QR_IMAGE",
        default,
        deserialize_with = "de_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub qr_image: Option<String>,
    #[serde(
        rename = "SHORT_LINK",
        default,
        deserialize_with = "de_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub short_link: Option<String>,
    #[serde(
        rename = "PARAMS",
        default,
        deserialize_with = "de_params",
        skip_serializing_if = "Map::is_empty"
    )]
    pub params: Map<String, Value>,
}

impl QrCode {
    /// Absolute image URL: server-relative paths are resolved against `base_url`.
    pub fn image_url(&self, base_url: &str) -> Option<String> {
        let image = self.qr_image.as_deref()?;
        if image.starts_with("http://") || image.starts_with("https://") {
            return Some(image.to_string());
        }
        let base = base_url.trim_end_matches('/');
        if image.starts_with('/') {
            Some(format!("{base}{image}"))
        } else {
            Some(format!("{base}/{image}"))
        }
    }

    /// Parameters as a compact JSON object, or `None` when there are none.
    pub fn params_json(&self) -> Option<String> {
        if self.params.is_empty() {
            return None;
        }
        serde_json::to_string(&self.params).ok()
    }
}

/// Converts a scalar JSON value to display text. `null` yields `None`.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).unwrap_or_default())
}

fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).filter(|s| !s.is_empty()))
}

/// Values keep their JSON type so `params_json` prints `300`, not `"300"`.
fn de_params<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let params = match value {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    };
    Ok(params)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_minimal_record() {
        let qr: QrCode = serde_json::from_value(
            json!({"ID": 1, "NAME": "x", "TYPE": "url", "CONTENT": "http://e"}),
        )
        .unwrap();

        assert_eq!(qr.id, "1");
        assert_eq!(qr.name, "x");
        assert_eq!(qr.kind, "url");
        assert_eq!(qr.content, "http://e");
        assert!(qr.qr_image.is_none());
        assert!(qr.short_link.is_none());
        assert!(qr.params.is_empty());
        assert!(qr.params_json().is_none());
    }

    #[test]
    fn test_full_record() {
        let qr: QrCode = serde_json::from_value(json!({
            "ID": "17",
            "NAME": "Menu",
            "TYPE": "url",
            "CONTENT": "https://cafe.example/menu",
            "QR_IMAGE": "/upload/qr/17.png",
            "SHORT_LINK": "https://g-qr.ru/s/abc",
            "PARAMS": {"utm_source": "table", "size": 300}
        }))
        .unwrap();

        assert_eq!(qr.id, "17");
        assert_eq!(
            qr.image_url("https://g-qr.ru/").as_deref(),
            Some("https://g-qr.ru/upload/qr/17.png")
        );
        assert_eq!(qr.short_link.as_deref(), Some("https://g-qr.ru/s/abc"));
        assert_eq!(
            qr.params_json().as_deref(),
            Some(r#"{"size":300,"utm_source":"table"}"#)
        );
    }

    #[test]
    fn test_empty_array_params_and_blank_optionals() {
        let qr: QrCode = serde_json::from_value(json!({
            "ID": 2, "NAME": null, "TYPE": "text", "CONTENT": "hello",
            "QR_IMAGE": "", "SHORT_LINK": null, "PARAMS": []
        }))
        .unwrap();

        assert_eq!(qr.name, "");
        assert!(qr.qr_image.is_none());
        assert!(qr.short_link.is_none());
        assert!(qr.params.is_empty());
    }

    #[test]
    fn test_params_keep_json_types() {
        let qr: QrCode = serde_json::from_value(json!({
            "ID": 3, "NAME": "p", "TYPE": "url", "CONTENT": "c",
            "PARAMS": {"size": 300, "logo": true, "color": "black", "margin": null}
        }))
        .unwrap();

        assert_eq!(qr.params["size"], json!(300));
        assert_eq!(
            qr.params_json().as_deref(),
            Some(r#"{"color":"black","logo":true,"margin":null,"size":300}"#)
        );
    }

    #[test]
    fn test_absolute_image_url_is_kept() {
        let qr = QrCode {
            id: "1".into(),
            name: "n".into(),
            kind: "url".into(),
            content: "c".into(),
            qr_image: Some("https://cdn.example/q.png".into()),
            short_link: None,
            params: Map::new(),
        };
        assert_eq!(
            qr.image_url("https://g-qr.ru").as_deref(),
            Some("https://cdn.example/q.png")
        );
    }
}
