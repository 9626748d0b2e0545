use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use creg_types::{CertificateId, CertificateRecord};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::memory::LedgerState;
use crate::traits::CertificateLedger;

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Upper bound on a single encoded record. Inserts above it are refused;
/// replay treats a larger frame as corruption.
pub const MAX_RECORD_LEN: u32 = 1024 * 1024;

/// Flush/sync strategy for ledger appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` after every insert. A successful insert survives power loss.
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

/// Configuration for a [`WalLedger`].
#[derive(Clone, Debug, Default)]
pub struct WalConfig {
    pub sync_mode: SyncMode,
}

struct WalWriter {
    file: File,
    /// End of the last complete frame.
    offset: u64,
}

/// Durable ledger backed by an append-only log.
///
/// On-disk format, one frame per record:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized CertificateRecord)]
/// ```
///
/// The full log is replayed into memory on [`open`](Self::open). A torn
/// final frame (crash mid-append) is truncated away; damage anywhere else,
/// or a repeated id, is reported as [`LedgerError::Corrupt`].
///
/// Inserts hold the writer mutex across the duplicate check, the append,
/// and the in-memory publish. Readers only take the state read lock, so
/// they never wait on disk I/O.
pub struct WalLedger {
    path: PathBuf,
    config: WalConfig,
    writer: Mutex<WalWriter>,
    state: RwLock<LedgerState>,
}

impl WalLedger {
    /// Open (or create) a ledger log at `path` and replay it.
    pub fn open(path: &Path, config: WalConfig) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let (state, good_len) = replay(&bytes)?;
        if good_len < bytes.len() as u64 {
            warn!(
                path = %path.display(),
                discarded = bytes.len() as u64 - good_len,
                "torn ledger tail; truncating"
            );
            file.set_len(good_len)?;
            file.sync_all()?;
        }

        info!(path = %path.display(), records = state.len(), "ledger log replayed");
        Ok(Self {
            path: path.to_path_buf(),
            config,
            writer: Mutex::new(WalWriter {
                file,
                offset: good_len,
            }),
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte length of the committed log.
    pub fn offset(&self) -> LedgerResult<u64> {
        Ok(self.writer.lock().map_err(|_| LedgerError::Poisoned)?.offset)
    }

    fn append_frame(&self, w: &mut WalWriter, payload: &[u8]) -> LedgerResult<()> {
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len <= MAX_RECORD_LEN)
            .ok_or(LedgerError::RecordTooLarge {
                len: payload.len(),
                limit: MAX_RECORD_LEN as usize,
            })?;
        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
        frame.extend_from_slice(payload);

        let written = w.file.write_all(&frame).and_then(|()| {
            if self.config.sync_mode == SyncMode::EveryWrite {
                w.file.sync_data()
            } else {
                Ok(())
            }
        });

        if let Err(e) = written {
            // Drop whatever part of the frame made it out so the next append
            // does not land behind garbage.
            if let Err(trunc) = w.file.set_len(w.offset) {
                warn!(error = %trunc, "failed to roll back partial ledger frame");
            }
            return Err(e.into());
        }

        w.offset += frame.len() as u64;
        Ok(())
    }
}

/// Decode every complete frame. Returns the state and the byte length of
/// the valid prefix.
fn replay(bytes: &[u8]) -> LedgerResult<(LedgerState, u64)> {
    let mut state = LedgerState::default();
    let len = bytes.len();
    let mut offset = 0usize;

    while offset < len {
        if offset + HEADER_SIZE > len {
            break;
        }
        let header = &bytes[offset..offset + HEADER_SIZE];
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length == 0 || length > MAX_RECORD_LEN {
            return Err(LedgerError::Corrupt {
                offset: offset as u64,
                reason: format!("invalid frame length {length}"),
            });
        }

        let end = offset + HEADER_SIZE + length as usize;
        if end > len {
            break;
        }

        let payload = &bytes[offset + HEADER_SIZE..end];
        if crc32fast::hash(payload) != expected_crc {
            if end == len {
                // Last frame, partially persisted.
                break;
            }
            return Err(LedgerError::Corrupt {
                offset: offset as u64,
                reason: "CRC mismatch".into(),
            });
        }

        let record: CertificateRecord =
            bincode::deserialize(payload).map_err(|e| LedgerError::Corrupt {
                offset: offset as u64,
                reason: format!("undecodable record: {e}"),
            })?;
        state.insert(record).map_err(|e| LedgerError::Corrupt {
            offset: offset as u64,
            reason: e.to_string(),
        })?;

        offset = end;
    }

    debug!(recovered = state.len(), valid_bytes = offset, "ledger replay complete");
    Ok((state, offset as u64))
}

impl CertificateLedger for WalLedger {
    fn insert(&self, record: CertificateRecord) -> LedgerResult<()> {
        let mut w = self.writer.lock().map_err(|_| LedgerError::Poisoned)?;

        if self.contains(&record.id)? {
            return Err(LedgerError::DuplicateId(record.id));
        }

        let payload =
            bincode::serialize(&record).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let id = record.id;
        self.append_frame(&mut w, &payload)?;

        let mut state = self.state.write().map_err(|_| LedgerError::Poisoned)?;
        state.insert(record)?;
        debug!(id = %id.short_id(), offset = w.offset, "certificate appended to ledger log");
        Ok(())
    }

    fn get(&self, id: &CertificateId) -> LedgerResult<Option<CertificateRecord>> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.get(id))
    }

    fn contains(&self, id: &CertificateId) -> LedgerResult<bool> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.contains(id))
    }

    fn len(&self) -> LedgerResult<usize> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.len())
    }

    fn records(&self) -> LedgerResult<Vec<CertificateRecord>> {
        let state = self.state.read().map_err(|_| LedgerError::Poisoned)?;
        Ok(state.records())
    }
}

impl std::fmt::Debug for WalLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalLedger")
            .field("path", &self.path)
            .field("record_count", &self.len().unwrap_or(0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use creg_types::{BlobRef, IssueRequest, IssuedAt};
    use std::sync::Arc;
    use std::thread;

    fn record(student: &str, millis: u64) -> CertificateRecord {
        let at = IssuedAt::from_millis(millis);
        IssueRequest::new(student, "Computer Science")
            .with_student_name("John Doe")
            .with_grade("A")
            .with_issuer("0xABC")
            .into_record(
                creg_crypto::derive(student, "Computer Science", at),
                BlobRef::new("blob-ref"),
                at,
            )
    }

    fn open(path: &Path) -> WalLedger {
        WalLedger::open(path, WalConfig::default()).unwrap()
    }

    #[test]
    fn insert_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let a = record("ST1", 1);
        let b = record("ST2", 2);
        {
            let ledger = open(&path);
            ledger.insert(a.clone()).unwrap();
            ledger.insert(b.clone()).unwrap();
        }

        let reopened = open(&path);
        assert_eq!(reopened.len().unwrap(), 2);
        assert_eq!(reopened.get(&a.id).unwrap(), Some(a.clone()));
        assert_eq!(reopened.records().unwrap(), vec![a, b]);
    }

    #[test]
    fn duplicate_rejected_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let rec = record("ST1", 1);
        open(&path).insert(rec.clone()).unwrap();

        let reopened = open(&path);
        let before = reopened.offset().unwrap();
        assert_eq!(
            reopened.insert(rec.clone()),
            Err(LedgerError::DuplicateId(rec.id))
        );
        assert_eq!(reopened.offset().unwrap(), before);
    }

    #[test]
    fn oversized_record_refused_and_log_stays_openable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let ok = record("ST1", 1);
        let mut big = record("ST2", 2);
        big.course = "x".repeat(2 * MAX_RECORD_LEN as usize);
        {
            let ledger = open(&path);
            ledger.insert(ok.clone()).unwrap();
            let before = ledger.offset().unwrap();
            assert!(matches!(
                ledger.insert(big.clone()),
                Err(LedgerError::RecordTooLarge { limit, .. }) if limit == MAX_RECORD_LEN as usize
            ));
            assert_eq!(ledger.offset().unwrap(), before);
            assert!(!ledger.contains(&big.id).unwrap());
        }

        let reopened = open(&path);
        assert_eq!(reopened.records().unwrap(), vec![ok]);
    }

    #[test]
    fn torn_tail_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let good = record("ST1", 1);
        open(&path).insert(good.clone()).unwrap();
        let good_len = fs::metadata(&path).unwrap().len();

        // Half a frame: header claims 200 bytes, only 10 follow.
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(&200u32.to_le_bytes()).unwrap();
        f.write_all(&0u32.to_le_bytes()).unwrap();
        f.write_all(&[0xAB; 10]).unwrap();
        drop(f);

        let ledger = open(&path);
        assert_eq!(ledger.len().unwrap(), 1);
        assert_eq!(fs::metadata(&path).unwrap().len(), good_len);

        let next = record("ST2", 2);
        ledger.insert(next.clone()).unwrap();
        drop(ledger);
        assert_eq!(open(&path).records().unwrap(), vec![good, next]);
    }

    #[test]
    fn bad_crc_on_last_frame_is_treated_as_torn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let ledger = open(&path);
        ledger.insert(record("ST1", 1)).unwrap();
        let first_len = ledger.offset().unwrap();
        ledger.insert(record("ST2", 2)).unwrap();
        drop(ledger);

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        let ledger = open(&path);
        assert_eq!(ledger.len().unwrap(), 1);
        assert_eq!(ledger.offset().unwrap(), first_len);
    }

    #[test]
    fn damage_before_the_tail_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let ledger = open(&path);
        ledger.insert(record("ST1", 1)).unwrap();
        ledger.insert(record("ST2", 2)).unwrap();
        drop(ledger);

        let mut bytes = fs::read(&path).unwrap();
        bytes[HEADER_SIZE + 1] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            WalLedger::open(&path, WalConfig::default()),
            Err(LedgerError::Corrupt { offset: 0, .. })
        ));
    }

    #[test]
    fn repeated_id_in_log_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let ledger = open(&path);
        ledger.insert(record("ST1", 1)).unwrap();
        drop(ledger);

        let mut bytes = fs::read(&path).unwrap();
        let frame = bytes.clone();
        bytes.extend_from_slice(&frame);
        fs::write(&path, &bytes).unwrap();

        let err = WalLedger::open(&path, WalConfig::default()).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { .. }));
    }

    #[test]
    fn concurrent_duplicate_inserts_admit_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let ledger = Arc::new(
            WalLedger::open(
                &path,
                WalConfig {
                    sync_mode: SyncMode::OsDefault,
                },
            )
            .unwrap(),
        );
        let rec = record("ST1", 42);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let rec = rec.clone();
                thread::spawn(move || ledger.insert(rec))
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == LedgerError::DuplicateId(rec.id)));
        drop(ledger);

        assert_eq!(open(&path).len().unwrap(), 1);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/ledger.wal");
        let ledger = open(&path);
        assert!(ledger.is_empty().unwrap());
        assert!(path.exists());
    }
}
