//! LMDB environment setup and shared helpers.

use std::fs;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::keys::prefix_bounds;
use crate::LmdbError;

/// Number of named databases opened below.
const MAX_DBS: u32 = 8;

/// Default map size: 256 MiB is plenty for attempts, users and holdings.
pub const DEFAULT_MAP_SIZE: usize = 256 * 1024 * 1024;

/// The LMDB environment and every database handle the gate uses.
///
/// Cheap to clone; all clones share one environment.
#[derive(Clone)]
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    /// `attempt id (u64 BE)` -> bincode `VerificationAttempt`
    pub(crate) attempts_db: Database<Bytes, Bytes>,
    /// `len ++ subject ++ attempt id` -> empty (per-subject index)
    pub(crate) attempts_by_subject_db: Database<Bytes, Bytes>,
    /// `subject` -> bincode `User`
    pub(crate) users_db: Database<Bytes, Bytes>,
    /// `len ++ owner ++ collection ++ token` -> bincode `NftHolding`
    pub(crate) holdings_db: Database<Bytes, Bytes>,
    /// counters and settings
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create an LMDB environment in `path`.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        fs::create_dir_all(path).map_err(|e| LmdbError::Heed(e.to_string()))?;

        // SAFETY: the environment is opened once per process and per path; the
        // node never opens the same directory twice concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let attempts_db = env.create_database(&mut wtxn, Some("attempts"))?;
        let attempts_by_subject_db = env.create_database(&mut wtxn, Some("attempts_by_subject"))?;
        let users_db = env.create_database(&mut wtxn, Some("users"))?;
        let holdings_db = env.create_database(&mut wtxn, Some("holdings"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), "opened LMDB holdings store");

        Ok(Self {
            env: Arc::new(env),
            attempts_db,
            attempts_by_subject_db,
            users_db,
            holdings_db,
            meta_db,
        })
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

fn borrow_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(v) => Bound::Included(v.as_slice()),
        Bound::Excluded(v) => Bound::Excluded(v.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Prefix range-scan: collect every `(key, value)` whose key starts with `prefix`,
/// in key order.
pub(crate) fn scan_prefix(
    db: &Database<Bytes, Bytes>,
    rtxn: &RoTxn,
    prefix: &[u8],
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LmdbError> {
    let (lower, upper) = prefix_bounds(prefix);
    let bounds = (borrow_bound(&lower), borrow_bound(&upper));
    let mut results = Vec::new();
    for entry in db.range(rtxn, &bounds)? {
        let (key, val) = entry?;
        results.push((key.to_vec(), val.to_vec()));
    }
    Ok(results)
}
