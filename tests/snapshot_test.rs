use evidence_ledger::ledger::{merkle_root, verify_chain, ChainStatus, LedgerSnapshot};
use evidence_ledger::reports::{export_case, CaseExport, ChainStatistics, ExportFormat};
use evidence_ledger::snapshot::{read_snapshot, verify_snapshot_file, write_snapshot};
use evidence_ledger::{EvidenceLedger, LedgerConfig};
use serde_json::json;
use tempfile::tempdir;

mod common;
use common::*;

#[test]
fn test_five_block_snapshot_verifies_without_ledger() {
    let json = {
        let ledger = ledger_with_cases(&["A", "B", "C", "D"]);
        assert_eq!(ledger.len(), 5);
        serde_json::to_string(&ledger.snapshot()).unwrap()
    };

    let snapshot: LedgerSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot.len(), 5);
    let result = snapshot.verify();
    assert_eq!(result.status, ChainStatus::Valid);
    assert_eq!(result.total_blocks, Some(5));
}

#[test]
fn test_snapshot_file_round_trip_and_tamper() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("evidence.jsonl");

    let ledger = ledger_with_cases(&["A", "B", "C", "D"]);
    write_snapshot(&path, &ledger.snapshot().blocks).unwrap();
    drop(ledger);

    assert!(verify_snapshot_file(&path).unwrap().is_valid());

    let mut blocks = read_snapshot(&path).unwrap();
    blocks[3].evidence.insert("severity".into(), json!("LOW"));
    write_snapshot(&path, &blocks).unwrap();

    let result = verify_snapshot_file(&path).unwrap();
    assert_eq!(result.status, ChainStatus::Compromised);
    assert_eq!(result.compromised_block, Some(3));
}

#[test]
fn test_restored_ledger_continues_chain() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("evidence.jsonl");

    let ledger = ledger_with_cases(&["A", "B"]);
    let root_before = ledger.snapshot().merkle_root();
    write_snapshot(&path, &ledger.snapshot().blocks).unwrap();

    let restored =
        EvidenceLedger::from_blocks(LedgerConfig::default(), read_snapshot(&path).unwrap()).unwrap();
    assert_eq!(restored.snapshot().merkle_root(), root_before);

    restored
        .add_evidence(&sample_finding("follow-up", "LOW"), "A", "NIA")
        .unwrap();
    let blocks = restored.snapshot().blocks;
    assert!(verify_chain(&blocks).is_valid());
    assert_ne!(merkle_root(&blocks), root_before);
}

#[test]
fn test_reports_do_not_mutate_chain() {
    let ledger = ledger_with_cases(&["A", "A", "B"]);
    let before = ledger.snapshot();

    let stats = ledger.with_blocks(ChainStatistics::collect).unwrap();
    assert_eq!(stats.total_blocks, 4);
    assert_eq!(stats.total_cases, 2);
    assert_eq!(stats.evidence_types["Social Media Post"], 3);

    let export = ledger
        .with_blocks(|blocks| export_case(blocks, "A", ExportFormat::Package))
        .unwrap();
    match export {
        CaseExport::Package(package) => {
            assert_eq!(package.total_evidence_blocks, 2);
            assert_eq!(package.key_findings.len(), 2);
        }
        other => panic!("unexpected export: {:?}", other),
    }

    assert_eq!(ledger.snapshot(), before);
}
