#![allow(dead_code)]

use evidence_ledger::ledger::Evidence;
use evidence_ledger::{EvidenceLedger, LedgerConfig};
use serde_json::{json, Value};

/// Convert a `json!` object literal into an evidence record
pub fn record(value: Value) -> Evidence {
    value
        .as_object()
        .cloned()
        .expect("test evidence must be a JSON object")
}

/// A realistic social-media finding
pub fn sample_finding(text: &str, severity: &str) -> Evidence {
    record(json!({
        "type": "Social Media Post",
        "text": text,
        "threat_level": severity,
        "location": "New Delhi",
        "source": "twitter",
        "metadata": {"followers": 1200, "language": "hi"},
        "witnesses": ["analyst-3"],
        "attachments": [
            {"filename": "post.txt", "content": text},
        ],
    }))
}

/// Ledger with one block per case id, appended in order
pub fn ledger_with_cases(case_ids: &[&str]) -> EvidenceLedger {
    let ledger = EvidenceLedger::new(LedgerConfig::default());
    for (i, case_id) in case_ids.iter().enumerate() {
        ledger
            .add_evidence(
                &sample_finding(&format!("finding {}", i), "HIGH"),
                case_id,
                "Cyber Crime Cell",
            )
            .expect("append should succeed");
    }
    ledger
}
