use evidence_ledger::ledger::ChainStatus;
use evidence_ledger::{EvidenceLedger, LedgerConfig};
use std::collections::HashSet;

mod common;
use common::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_are_serialized() {
    let ledger = EvidenceLedger::new(LedgerConfig::default());
    let mut handles = Vec::new();

    for worker in 0..8 {
        let ledger = ledger.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            for i in 0..10 {
                ledger
                    .add_evidence(
                        &sample_finding(&format!("worker {} item {}", worker, i), "MEDIUM"),
                        &format!("CASE-{}", worker),
                        "Joint Task Force",
                    )
                    .unwrap();
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let result = ledger.verify_chain();
    assert_eq!(result.status, ChainStatus::Valid);
    assert_eq!(result.total_blocks, Some(81));

    let blocks = ledger.snapshot().blocks;
    let previous_hashes: HashSet<_> = blocks.iter().map(|b| b.previous_hash.clone()).collect();
    assert_eq!(previous_hashes.len(), blocks.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_consistent_snapshots() {
    let ledger = EvidenceLedger::new(LedgerConfig::default());

    let writer = {
        let ledger = ledger.clone();
        tokio::task::spawn_blocking(move || {
            for i in 0..50 {
                ledger
                    .add_evidence(&sample_finding(&format!("item {}", i), "LOW"), "CASE-1", "NIA")
                    .unwrap();
            }
        })
    };

    let reader = {
        let ledger = ledger.clone();
        tokio::task::spawn_blocking(move || {
            for _ in 0..50 {
                assert!(ledger.snapshot().verify().is_valid());
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
    assert_eq!(ledger.len(), 51);
}
