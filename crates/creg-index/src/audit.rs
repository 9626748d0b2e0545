//! Rebuilding and auditing the index against the ledger.
//!
//! The ledger is the source of truth. [`rebuild`] regenerates the index
//! from it; [`audit`] compares the two without changing either.

use std::collections::HashSet;

use creg_ledger::CertificateLedger;
use creg_types::CertificateId;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::IndexResult;
use crate::traits::StudentIndex;

/// An index entry whose id the ledger does not hold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingRef {
    pub student_id: String,
    pub id: CertificateId,
}

/// Differences between a student index and its ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Index entries pointing at ids absent from the ledger.
    pub dangling: Vec<DanglingRef>,
    /// Ledger records missing from their student's index entry.
    pub unindexed: Vec<CertificateId>,
    /// Ids filed under a student other than the record's holder.
    pub misfiled: Vec<DanglingRef>,
    /// Number of ledger records examined.
    pub records_checked: usize,
}

impl ConsistencyReport {
    /// Returns `true` if index and ledger agree.
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty() && self.unindexed.is_empty() && self.misfiled.is_empty()
    }

    /// Total number of problems found.
    pub fn issue_count(&self) -> usize {
        self.dangling.len() + self.unindexed.len() + self.misfiled.len()
    }
}

/// Clear `index` and re-append every ledger record in insertion order.
///
/// Returns the number of entries written. Run at startup or while no
/// issuance is in flight; concurrent readers may briefly see an empty list.
pub fn rebuild<L, I>(ledger: &L, index: &I) -> IndexResult<usize>
where
    L: CertificateLedger + ?Sized,
    I: StudentIndex + ?Sized,
{
    let records = ledger.records()?;
    index.clear()?;
    for record in &records {
        index.append(&record.student_id, record.id)?;
    }
    info!(entries = records.len(), "student index rebuilt from ledger");
    Ok(records.len())
}

/// Compare `index` against `ledger`.
pub fn audit<L, I>(ledger: &L, index: &I) -> IndexResult<ConsistencyReport>
where
    L: CertificateLedger + ?Sized,
    I: StudentIndex + ?Sized,
{
    let mut report = ConsistencyReport::default();
    let mut indexed = HashSet::new();

    for student_id in index.students()? {
        for id in index.list(&student_id)? {
            match ledger.get(&id)? {
                None => report.dangling.push(DanglingRef {
                    student_id: student_id.clone(),
                    id,
                }),
                Some(record) if record.student_id != student_id => {
                    report.misfiled.push(DanglingRef {
                        student_id: student_id.clone(),
                        id,
                    })
                }
                Some(_) => {
                    indexed.insert(id);
                }
            }
        }
    }

    let records = ledger.records()?;
    report.records_checked = records.len();
    report.unindexed = records
        .iter()
        .map(|r| r.id)
        .filter(|id| !indexed.contains(id))
        .collect();

    if report.is_consistent() {
        info!(records = report.records_checked, "student index consistent with ledger");
    } else {
        warn!(
            dangling = report.dangling.len(),
            unindexed = report.unindexed.len(),
            misfiled = report.misfiled.len(),
            "student index diverged from ledger"
        );
    }
    Ok(report)
}
