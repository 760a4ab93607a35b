//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the node begins
//! processing blocks.

use heed::types::Bytes;
use heed::Database;

use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check table sizes against each other and against the stored counters.
///
/// Every primary table must match its index, and the incremental stats must
/// match the actual record counts. Findings are collected in the report
/// rather than failing the call.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;
    let meta = env.read_meta(&rtxn)?;

    let tables: [(&str, &Database<Bytes, Bytes>); 9] = [
        ("edges", &env.edges_db),
        ("edges_in", &env.edges_in_db),
        ("votes", &env.votes_db),
        ("votes_by_target", &env.votes_by_target_db),
        ("bonds", &env.bonds_db),
        ("bonds_due", &env.bonds_due_db),
        ("reputation", &env.reputation_db),
        ("undo", &env.undo_db),
        ("meta", &env.meta_db),
    ];
    let mut counts = std::collections::BTreeMap::new();
    for (name, db) in tables {
        match db.len(&rtxn) {
            Ok(count) => {
                report.databases_checked += 1;
                report.total_entries += count;
                counts.insert(name, count);
            }
            Err(e) => report
                .errors
                .push(format!("failed to read database '{}': {}", name, e)),
        }
    }

    let mut expect_equal = |what: &str, left: Option<&u64>, right: Option<&u64>| {
        if let (Some(l), Some(r)) = (left, right) {
            if l != r {
                report.errors.push(format!("{what}: {l} != {r}"));
            }
        }
    };
    expect_equal("edges vs edges_in", counts.get("edges"), counts.get("edges_in"));
    expect_equal("votes vs votes_by_target", counts.get("votes"), counts.get("votes_by_target"));
    expect_equal("edges vs edge_count", counts.get("edges"), Some(&meta.stats.edge_count));
    expect_equal("votes vs vote_count", counts.get("votes"), Some(&meta.stats.vote_count));
    expect_equal("votes vs next_vote_seq", counts.get("votes"), Some(&meta.next_vote_seq));

    Ok(report)
}
