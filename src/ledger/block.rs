//! Evidence Block
//!
//! Defines the hash-linked block stored in the evidence chain and the
//! canonical serialization used to compute its digest.

use chrono::{DateTime, SecondsFormat, SubsecRound, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Evidence payload carried by a block. Hashed through [`canonical_json`],
/// so field insertion order never affects the digest.
pub type Evidence = Map<String, Value>;

/// `previous_hash` of the genesis block: a zero digest of the same hex length as every block hash.
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Hex length of a SHA-256 digest
pub const HASH_HEX_LEN: usize = 64;

/// One entry of the evidence chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub evidence: Evidence,
    pub previous_hash: String,
    pub hash: String,
}

impl Block {
    /// Create a block stamped with the current time and compute its hash
    pub fn new(index: u64, evidence: Evidence, previous_hash: String) -> Self {
        Self::with_timestamp(index, block_timestamp(), evidence, previous_hash)
    }

    /// `timestamp` is truncated to microseconds, the precision the hash covers
    pub fn with_timestamp(
        index: u64,
        timestamp: DateTime<Utc>,
        evidence: Evidence,
        previous_hash: String,
    ) -> Self {
        let timestamp = timestamp.trunc_subsecs(6);
        let hash = compute_hash(index, &timestamp, &evidence, &previous_hash);
        Self {
            index,
            timestamp,
            evidence,
            previous_hash,
            hash,
        }
    }

    /// Recompute the digest from the stored fields
    pub fn calculate_hash(&self) -> String {
        compute_hash(self.index, &self.timestamp, &self.evidence, &self.previous_hash)
    }

    /// Check the stored hash against the recomputed one.
    ///
    /// A timestamp carrying sub-microsecond digits was not what got hashed,
    /// so it fails too.
    pub fn verify_hash(&self) -> bool {
        self.has_hashable_timestamp() && self.hash == self.calculate_hash()
    }

    fn has_hashable_timestamp(&self) -> bool {
        self.timestamp.nanosecond() % 1_000 == 0
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    pub fn case_id(&self) -> Option<&str> {
        self.evidence_str("case_id")
    }

    pub fn evidence_str(&self, key: &str) -> Option<&str> {
        self.evidence.get(key).and_then(Value::as_str)
    }

    /// First 16 hex characters of the hash, for log lines
    pub fn short_hash(&self) -> &str {
        self.hash.get(..16).unwrap_or(&self.hash)
    }

    pub fn summary(&self) -> String {
        format!(
            "Block #{} [{}] case {} ({}...)",
            self.index,
            format_timestamp(&self.timestamp),
            self.case_id().unwrap_or("-"),
            self.short_hash()
        )
    }
}

/// Digest over `index ‖ timestamp ‖ canonical(evidence) ‖ previous_hash`.
///
/// The algorithm is fixed to SHA-256 for every block of every chain.
pub fn compute_hash(
    index: u64,
    timestamp: &DateTime<Utc>,
    evidence: &Evidence,
    previous_hash: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(format_timestamp(timestamp).as_bytes());
    hasher.update(canonical_evidence(evidence).as_bytes());
    hasher.update(previous_hash.as_bytes());
    hex::encode(hasher.finalize())
}

/// SHA-256 of raw bytes as lowercase hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Fixed-format timestamp used inside the hash preimage
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time truncated to the precision that [`format_timestamp`] keeps
pub fn block_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn canonical_evidence(evidence: &Evidence) -> String {
    let mut out = String::new();
    write_object(evidence, &mut out);
    out
}

/// Compact JSON with object keys sorted at every depth
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_object(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_object(map: &Map<String, Value>, out: &mut String) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_canonical(value, out);
    }
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 9, 26, 53).unwrap()
    }

    fn evidence(value: Value) -> Evidence {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_sentinel_matches_digest_length() {
        assert_eq!(GENESIS_PREVIOUS_HASH.len(), HASH_HEX_LEN);
        assert!(GENESIS_PREVIOUS_HASH.chars().all(|c| c == '0'));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let ev = evidence(json!({"case_id": "A", "severity": "HIGH"}));
        let hash1 = compute_hash(3, &fixed_time(), &ev, GENESIS_PREVIOUS_HASH);
        let hash2 = compute_hash(3, &fixed_time(), &ev, GENESIS_PREVIOUS_HASH);
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), HASH_HEX_LEN);
        assert!(hash1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_ignores_insertion_order() {
        let mut forward = Evidence::new();
        forward.insert("case_id".into(), json!("A"));
        forward.insert("agency".into(), json!("CERT"));
        forward.insert("meta".into(), json!({"z": 1, "a": [ {"y": 2, "b": 3} ]}));

        let mut reverse = Evidence::new();
        reverse.insert("meta".into(), json!({"a": [ {"b": 3, "y": 2} ], "z": 1}));
        reverse.insert("agency".into(), json!("CERT"));
        reverse.insert("case_id".into(), json!("A"));

        assert_eq!(canonical_evidence(&forward), canonical_evidence(&reverse));
        assert_eq!(
            compute_hash(1, &fixed_time(), &forward, "ab"),
            compute_hash(1, &fixed_time(), &reverse, "ab")
        );
    }

    #[test]
    fn test_hash_is_sensitive_to_each_field() {
        let ev = evidence(json!({"case_id": "A", "description": "leaked memo"}));
        let base = compute_hash(1, &fixed_time(), &ev, GENESIS_PREVIOUS_HASH);

        let changed_evidence = evidence(json!({"case_id": "A", "description": "leaked mema"}));
        assert_ne!(base, compute_hash(1, &fixed_time(), &changed_evidence, GENESIS_PREVIOUS_HASH));

        let changed_case = evidence(json!({"case_id": "B", "description": "leaked memo"}));
        assert_ne!(base, compute_hash(1, &fixed_time(), &changed_case, GENESIS_PREVIOUS_HASH));

        let mut previous = GENESIS_PREVIOUS_HASH.to_string();
        previous.replace_range(63..64, "1");
        assert_ne!(base, compute_hash(1, &fixed_time(), &ev, &previous));

        assert_ne!(base, compute_hash(2, &fixed_time(), &ev, GENESIS_PREVIOUS_HASH));

        let later = fixed_time() + chrono::Duration::microseconds(1);
        assert_ne!(base, compute_hash(1, &later, &ev, GENESIS_PREVIOUS_HASH));
    }

    #[test]
    fn test_canonical_json_format() {
        let value = json!({"b": [1, "two", null], "a": {"d": true, "c": 1.5}});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"c":1.5,"d":true},"b":[1,"two",null]}"#
        );
    }

    #[test]
    fn test_block_verify_hash_detects_mutation() {
        let mut block = Block::new(
            1,
            evidence(json!({"case_id": "A"})),
            GENESIS_PREVIOUS_HASH.to_string(),
        );
        assert!(block.verify_hash());

        block.evidence.insert("case_id".into(), json!("B"));
        assert!(!block.verify_hash());
    }

    #[test]
    fn test_with_timestamp_truncates_to_hashed_precision() {
        let precise = fixed_time() + chrono::Duration::nanoseconds(1_234_567);
        let block = Block::with_timestamp(
            1,
            precise,
            Evidence::new(),
            GENESIS_PREVIOUS_HASH.to_string(),
        );
        assert_eq!(block.timestamp.nanosecond(), 1_234_000);
        assert!(block.verify_hash());
    }

    #[test]
    fn test_block_timestamp_round_trips_through_json() {
        let block = Block::new(1, Evidence::new(), GENESIS_PREVIOUS_HASH.to_string());
        let json = serde_json::to_string(&block).unwrap();
        let restored: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, block);
        assert!(restored.verify_hash());
    }
}
