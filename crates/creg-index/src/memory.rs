use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use creg_types::CertificateId;
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::traits::StudentIndex;

/// One student's ids in append order, with a set for the duplicate check.
#[derive(Default)]
struct StudentEntries {
    ids: Vec<CertificateId>,
    seen: HashSet<CertificateId>,
}

/// `HashMap`-backed student index.
pub struct InMemoryStudentIndex {
    entries: RwLock<HashMap<String, StudentEntries>>,
}

impl InMemoryStudentIndex {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of ids across all students.
    pub fn total_entries(&self) -> usize {
        self.entries
            .read()
            .map(|m| m.values().map(|e| e.ids.len()).sum())
            .unwrap_or(0)
    }
}

impl Default for InMemoryStudentIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> IndexError {
    IndexError::Unavailable("index lock poisoned".into())
}

impl StudentIndex for InMemoryStudentIndex {
    fn append(&self, student_id: &str, id: CertificateId) -> IndexResult<()> {
        if student_id.is_empty() {
            return Err(IndexError::EmptyStudentId);
        }
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let student = entries.entry(student_id.to_string()).or_default();
        if !student.seen.insert(id) {
            debug!(student = student_id, id = %id.short_id(), "index entry already present");
            return Ok(());
        }
        student.ids.push(id);
        Ok(())
    }

    fn list(&self, student_id: &str) -> IndexResult<Vec<CertificateId>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .get(student_id)
            .map(|e| e.ids.clone())
            .unwrap_or_default())
    }

    fn students(&self) -> IndexResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        let mut students: Vec<String> = entries.keys().cloned().collect();
        students.sort();
        Ok(students)
    }

    fn clear(&self) -> IndexResult<()> {
        self.entries.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStudentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStudentIndex")
            .field("entries", &self.total_entries())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> CertificateId {
        CertificateId::from_hash([n; 32])
    }

    #[test]
    fn unknown_student_lists_empty() {
        let index = InMemoryStudentIndex::new();
        assert!(index.list("nobody").unwrap().is_empty());
    }

    #[test]
    fn append_preserves_order() {
        let index = InMemoryStudentIndex::new();
        index.append("ST1", id(3)).unwrap();
        index.append("ST1", id(1)).unwrap();
        index.append("ST1", id(2)).unwrap();
        assert_eq!(index.list("ST1").unwrap(), vec![id(3), id(1), id(2)]);
    }

    #[test]
    fn append_is_idempotent() {
        let index = InMemoryStudentIndex::new();
        index.append("ST1", id(1)).unwrap();
        index.append("ST1", id(1)).unwrap();
        assert_eq!(index.list("ST1").unwrap(), vec![id(1)]);
        assert_eq!(index.total_entries(), 1);
    }

    #[test]
    fn long_history_stays_ordered_and_deduplicated() {
        let index = InMemoryStudentIndex::new();
        let ids: Vec<CertificateId> = (0..=255u8).map(id).collect();
        for &cert in ids.iter().chain(ids.iter().rev()) {
            index.append("ST1", cert).unwrap();
        }
        assert_eq!(index.list("ST1").unwrap(), ids);
        assert_eq!(index.total_entries(), 256);
    }

    #[test]
    fn students_are_isolated() {
        let index = InMemoryStudentIndex::new();
        index.append("ST1", id(1)).unwrap();
        index.append("ST2", id(2)).unwrap();
        assert_eq!(index.list("ST1").unwrap(), vec![id(1)]);
        assert_eq!(index.list("ST2").unwrap(), vec![id(2)]);
        assert_eq!(index.students().unwrap(), vec!["ST1", "ST2"]);
    }

    #[test]
    fn empty_student_id_rejected() {
        let index = InMemoryStudentIndex::new();
        assert!(matches!(
            index.append("", id(1)),
            Err(IndexError::EmptyStudentId)
        ));
    }

    #[test]
    fn clear_drops_everything() {
        let index = InMemoryStudentIndex::new();
        index.append("ST1", id(1)).unwrap();
        index.clear().unwrap();
        assert!(index.students().unwrap().is_empty());
        assert_eq!(index.total_entries(), 0);
    }
}
