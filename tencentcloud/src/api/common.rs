//! Common types and utilities for the Tencent Cloud API

use super::error::ApiError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// A versioned product API, e.g. `cdb` at `2017-03-20`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    pub name: &'static str,
    pub version: &'static str,
}

impl Service {
    pub const fn new(name: &'static str, version: &'static str) -> Self {
        Self { name, version }
    }

    pub fn default_host(&self) -> String {
        format!("{}.tencentcloudapi.com", self.name)
    }
}

/// Every response is wrapped as `{"Response": {...}}`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VendorErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

/// Unwraps the response envelope of `action`, turning an embedded `Error`
/// object into [`ApiError::Vendor`].
pub fn parse_envelope<T: DeserializeOwned>(action: &str, text: &str) -> Result<T, ApiError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(|e| {
        ApiError::ParseError(format!("{} returned a body without Response: {}", action, e))
    })?;
    let mut response = envelope.response;

    let request_id = response
        .get("RequestId")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    if let Some(error) = response.as_object_mut().and_then(|o| o.remove("Error")) {
        let body: VendorErrorBody = serde_json::from_value(error)
            .map_err(|e| ApiError::ParseError(format!("malformed Error object: {}", e)))?;
        return Err(ApiError::Vendor {
            code: body.code,
            message: body.message,
            request_id,
        });
    }

    serde_json::from_value(response)
        .map_err(|e| ApiError::ParseError(format!("unexpected {} response: {}", action, e)))
}

/// Reads an identifier that the API returns either as a string or a number
pub fn handle_from_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deserialize a field that some API versions send as a string and others
/// as a number
pub fn deserialize_string_or_number_option<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Int(i64),
        Float(f64),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Int(i) => i.to_string(),
            StringOrNumber::Float(f) => f.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Flow {
        flow_id: i64,
    }

    #[test]
    fn parses_successful_envelope() {
        let flow: Flow = parse_envelope(
            "ModifyDatabaseCT",
            r#"{"Response":{"FlowId":1024,"RequestId":"r-1"}}"#,
        )
        .unwrap();
        assert_eq!(flow.flow_id, 1024);
    }

    #[test]
    fn embedded_error_becomes_vendor_error() {
        let err = parse_envelope::<Flow>(
            "ModifyDatabaseCT",
            r#"{"Response":{"Error":{"Code":"InvalidParameter","Message":"bad db"},"RequestId":"r-2"}}"#,
        )
        .unwrap_err();

        match err {
            ApiError::Vendor {
                code,
                message,
                request_id,
            } => {
                assert_eq!(code, "InvalidParameter");
                assert_eq!(message, "bad db");
                assert_eq!(request_id, "r-2");
            }
            other => panic!("expected vendor error, got {:?}", other),
        }
    }

    #[test]
    fn body_without_envelope_is_a_parse_error() {
        let err = parse_envelope::<Flow>("ModifyDatabaseCT", r#"{"FlowId":1}"#).unwrap_err();
        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[test]
    fn handles_accept_strings_and_numbers() {
        assert_eq!(handle_from_value(&json!("as-123")), Some("as-123".to_string()));
        assert_eq!(handle_from_value(&json!(42)), Some("42".to_string()));
        assert_eq!(handle_from_value(&json!("")), None);
        assert_eq!(handle_from_value(&json!(null)), None);
    }

    #[test]
    fn string_or_number_fields_normalize_to_strings() {
        #[derive(Deserialize)]
        struct Db {
            #[serde(default, deserialize_with = "deserialize_string_or_number_option")]
            retention: Option<String>,
        }

        let a: Db = serde_json::from_value(json!({"retention": "7"})).unwrap();
        let b: Db = serde_json::from_value(json!({"retention": 7})).unwrap();
        let c: Db = serde_json::from_value(json!({})).unwrap();
        assert_eq!(a.retention.as_deref(), Some("7"));
        assert_eq!(b.retention.as_deref(), Some("7"));
        assert!(c.retention.is_none());
    }
}
