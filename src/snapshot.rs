//! Snapshot persistence
//!
//! Stores a block sequence as JSON lines (one block per line) and verifies
//! stored snapshots without a live ledger.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::ledger::{verify_block, verify_chain, Block, ChainVerification};

/// Write blocks to `path`, replacing any previous content.
///
/// The new content goes to a temporary file in the same directory, which is
/// then renamed over `path`; a failed write leaves the old snapshot intact.
pub fn write_snapshot(path: &Path, blocks: &[Block]) -> Result<()> {
    let dir = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| {
        LedgerError::Storage(format!("Failed to create snapshot directory: {}", e))
    })?;

    let tmp = NamedTempFile::new_in(dir).map_err(|e| {
        LedgerError::Storage(format!("Failed to create temp file in {:?}: {}", dir, e))
    })?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        for block in blocks {
            write_line(&mut writer, block, path)?;
        }
        writer
            .flush()
            .map_err(|e| LedgerError::Storage(format!("Failed to flush {:?}: {}", path, e)))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| LedgerError::Storage(format!("Failed to sync {:?}: {}", path, e)))?;

    tmp.persist(path)
        .map_err(|e| LedgerError::Storage(format!("Failed to replace {:?}: {}", path, e.error)))?;

    debug!("Wrote {} blocks to {:?}", blocks.len(), path);
    Ok(())
}

/// Append one block to an existing snapshot.
///
/// The block must extend the block currently stored last, otherwise the
/// file is left untouched and an integrity error is returned.
pub fn append_block(path: &Path, block: &Block) -> Result<()> {
    let stored = read_snapshot(path)?;
    let tail = stored.last().ok_or_else(|| {
        LedgerError::Integrity(format!("Snapshot {:?} has no genesis block", path))
    })?;

    if !verify_block(block, tail) {
        return Err(LedgerError::Integrity(format!(
            "Block #{} does not extend block #{} stored in {:?}",
            block.index, tail.index, path
        )));
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| LedgerError::Storage(format!("Failed to open {:?}: {}", path, e)))?;

    write_line(&mut file, block, path)?;
    file.sync_data()
        .map_err(|e| LedgerError::Storage(format!("Failed to sync {:?}: {}", path, e)))?;

    debug!("Appended block #{} to {:?}", block.index, path);
    Ok(())
}

fn write_line(writer: &mut impl Write, block: &Block, path: &Path) -> Result<()> {
    let line = serde_json::to_string(block)?;
    writeln!(writer, "{}", line)
        .map_err(|e| LedgerError::Storage(format!("Failed to write {:?}: {}", path, e)))
}

/// Load blocks from a JSON-lines snapshot
pub fn read_snapshot(path: &Path) -> Result<Vec<Block>> {
    let file = File::open(path)
        .map_err(|e| LedgerError::Storage(format!("Failed to open {:?}: {}", path, e)))?;

    let reader = BufReader::new(file);
    let mut blocks = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            LedgerError::Storage(format!("Failed to read line {}: {}", line_num + 1, e))
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let block: Block = serde_json::from_str(&line).map_err(|e| {
            LedgerError::Storage(format!(
                "Failed to parse block at line {}: {}",
                line_num + 1,
                e
            ))
        })?;

        blocks.push(block);
    }

    debug!("Loaded {} blocks from {:?}", blocks.len(), path);
    Ok(blocks)
}

/// Load and verify a stored snapshot
pub fn verify_snapshot_file(path: &Path) -> Result<ChainVerification> {
    info!("Verifying evidence snapshot: {:?}", path);

    if !path.exists() {
        return Err(LedgerError::Storage(format!(
            "Snapshot file does not exist: {:?}",
            path
        )));
    }

    let blocks = read_snapshot(path)?;
    Ok(verify_chain(&blocks))
}
