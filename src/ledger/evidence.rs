//! Evidence payload construction
//!
//! Turns a free-form evidence record into the payload stored on the chain:
//! case metadata, a content hash, per-attachment hashes and a signature record.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::ledger::block::{block_timestamp, canonical_json, sha256_hex, Evidence};

pub const DEFAULT_EVIDENCE_TYPE: &str = "Digital Threat Intelligence";
pub const DEFAULT_SEVERITY: &str = "UNKNOWN";
pub const DEFAULT_LOCATION: &str = "Unknown";
pub const DEFAULT_ATTACHMENT_TYPE: &str = "text/plain";

/// Label carried by every signature record. The record is a plain digest,
/// not an asymmetric signature, and proves nothing about who produced it.
pub const SIGNATURE_METHOD: &str = "SHA256-DIGEST (placeholder, not legally binding)";

/// Deterministic stand-in for a digital signature over the raw evidence.
///
/// `signature` is `sha256(canonical(evidence) ‖ "|" ‖ signing_authority)`.
/// Anyone can recompute it, so it only detects accidental changes to the
/// submitted record; it does not authenticate the signer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalSignature {
    pub signature_method: String,
    pub signature: String,
    pub signing_authority: String,
    pub timestamp_signed: String,
    pub public_key: Option<String>,
}

impl DigitalSignature {
    pub fn create(evidence_data: &Evidence, signing_authority: &str) -> Self {
        Self {
            signature_method: SIGNATURE_METHOD.to_string(),
            signature: signature_digest(evidence_data, signing_authority),
            signing_authority: signing_authority.to_string(),
            timestamp_signed: block_timestamp().to_rfc3339_opts(SecondsFormat::Micros, true),
            public_key: None,
        }
    }

    /// Recompute the digest for `evidence_data` and compare
    pub fn matches(&self, evidence_data: &Evidence) -> bool {
        self.signature == signature_digest(evidence_data, &self.signing_authority)
    }
}

fn signature_digest(evidence_data: &Evidence, signing_authority: &str) -> String {
    let preimage = format!(
        "{}|{}",
        canonical_json(&Value::Object(evidence_data.clone())),
        signing_authority
    );
    sha256_hex(preimage.as_bytes())
}

/// Hash of the evidence content, independent of the block hash.
///
/// Covers `text`, `metadata`, `timestamp` and `source` of the raw record.
pub fn content_hash(evidence_data: &Evidence) -> String {
    let content = json!({
        "text_content": field_or(evidence_data, "text", json!("")),
        "metadata": field_or(evidence_data, "metadata", json!({})),
        "timestamp": field_or(evidence_data, "timestamp", json!("")),
        "source": field_or(evidence_data, "source", json!("")),
    });
    sha256_hex(canonical_json(&content).as_bytes())
}

/// Hash of a single attachment's content
pub fn attachment_hash(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => sha256_hex(text.as_bytes()),
        Some(other) => sha256_hex(canonical_json(other).as_bytes()),
        None => sha256_hex(b""),
    }
}

/// Convert any serializable record into an evidence object.
///
/// Fails instead of dropping data when the value is not a JSON object or
/// cannot be serialized (e.g. maps with non-string keys, NaN or infinite floats).
pub fn to_evidence<T: Serialize + ?Sized>(value: &T) -> Result<Evidence> {
    let map = match serde_json::to_value(value)? {
        Value::Object(map) => map,
        other => {
            return Err(LedgerError::Serialization(format!(
                "evidence must serialize to a JSON object, got {}",
                value_kind(&other)
            )))
        }
    };

    // serde_json writes non-finite floats as null; the YAML data model keeps them.
    let mirror = serde_yaml::to_value(value)
        .map_err(|e| LedgerError::Serialization(format!("YAML mirror of evidence: {}", e)))?;
    if contains_non_finite(&mirror) {
        return Err(LedgerError::Serialization(
            "evidence contains a NaN or infinite number, which JSON cannot represent".to_string(),
        ));
    }

    Ok(map)
}

fn contains_non_finite(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Number(n) => n.is_nan() || n.is_infinite(),
        serde_yaml::Value::Sequence(items) => items.iter().any(contains_non_finite),
        serde_yaml::Value::Mapping(map) => map
            .iter()
            .any(|(k, v)| contains_non_finite(k) || contains_non_finite(v)),
        serde_yaml::Value::Tagged(tagged) => contains_non_finite(&tagged.value),
        _ => false,
    }
}

/// Build the stored payload for a new block
pub fn build_evidence_payload(
    evidence_data: &Evidence,
    case_id: &str,
    agency: &str,
    config: &LedgerConfig,
) -> Result<Evidence> {
    if case_id.trim().is_empty() {
        return Err(LedgerError::empty_field("case_id"));
    }
    if agency.trim().is_empty() {
        return Err(LedgerError::empty_field("agency"));
    }

    let now = block_timestamp().to_rfc3339_opts(SecondsFormat::Micros, true);
    let signature = DigitalSignature::create(evidence_data, &config.signing_authority);

    let mut payload = Evidence::new();
    payload.insert("case_id".into(), json!(case_id));
    payload.insert("agency".into(), json!(agency));
    payload.insert(
        "timestamp_collected".into(),
        field_or(evidence_data, "timestamp", json!(now)),
    );
    payload.insert(
        "evidence_type".into(),
        field_or(evidence_data, "type", json!(DEFAULT_EVIDENCE_TYPE)),
    );
    payload.insert(
        "severity".into(),
        field_or(evidence_data, "threat_level", json!(DEFAULT_SEVERITY)),
    );
    payload.insert(
        "location".into(),
        field_or(evidence_data, "location", json!(DEFAULT_LOCATION)),
    );
    payload.insert(
        "description".into(),
        field_or(evidence_data, "description", json!("")),
    );
    payload.insert("digital_signature".into(), serde_json::to_value(&signature)?);
    payload.insert(
        "witnesses".into(),
        field_or(evidence_data, "witnesses", json!([])),
    );
    payload.insert(
        "collecting_officer".into(),
        field_or(
            evidence_data,
            "collecting_officer",
            json!(config.collecting_officer),
        ),
    );
    payload.insert("hash_evidence".into(), json!(content_hash(evidence_data)));

    if let Some(attachments) = evidence_data.get("attachments") {
        payload.insert("attachments".into(), hash_attachments(attachments)?);
    }

    Ok(payload)
}

fn hash_attachments(attachments: &Value) -> Result<Value> {
    let items = attachments.as_array().ok_or_else(|| {
        LedgerError::InvalidInput(format!(
            "attachments must be a list, got {}",
            value_kind(attachments)
        ))
    })?;

    let hashed = items
        .iter()
        .enumerate()
        .map(|(i, attachment)| {
            let attachment = attachment.as_object().ok_or_else(|| {
                LedgerError::InvalidInput(format!("attachment {} must be an object", i))
            })?;
            Ok(json!({
                "filename": attachment.get("filename").cloned().unwrap_or(Value::Null),
                "hash": attachment_hash(attachment.get("content")),
                "type": field_or(attachment, "type", json!(DEFAULT_ATTACHMENT_TYPE)),
            }))
        })
        .collect::<Result<Vec<Value>>>()?;

    Ok(Value::Array(hashed))
}

fn field_or(map: &Evidence, key: &str, default: Value) -> Value {
    map.get(key).cloned().unwrap_or(default)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
