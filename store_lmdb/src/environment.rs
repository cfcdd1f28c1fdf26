//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use tradepost_store::{ExchangeStore, StoreError, WriteTxn};

use crate::write_txn::LmdbWriteTxn;
use crate::LmdbError;

/// Number of named databases the environment creates.
pub const DATABASE_COUNT: u32 = 7;

/// Default memory map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    path: PathBuf,
    /// handle -> bincode(Identity)
    pub(crate) identities_db: Database<Bytes, Bytes>,
    /// asset_be(4) -> handle
    pub(crate) asset_owners_db: Database<Bytes, Bytes>,
    /// nonce(16) -> bincode(NonceRecord)
    pub(crate) nonces_db: Database<Bytes, Bytes>,
    /// expiry_be(8) ++ nonce(16) -> ()
    pub(crate) nonce_expiry_db: Database<Bytes, Bytes>,
    /// trade_id_be(8) -> bincode(TradeEntry)
    pub(crate) trades_db: Database<Bytes, Bytes>,
    /// handle ++ 0x00 ++ trade_id_be(8) -> ()
    pub(crate) participant_trades_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// The directory is created if missing. All databases are created inside
    /// one write transaction so a crash mid-open leaves nothing behind.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("create {}: {e}", path.display())))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(DATABASE_COUNT))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let identities_db = env.create_database(&mut wtxn, Some("identities"))?;
        let asset_owners_db = env.create_database(&mut wtxn, Some("asset_owners"))?;
        let nonces_db = env.create_database(&mut wtxn, Some("nonces"))?;
        let nonce_expiry_db = env.create_database(&mut wtxn, Some("nonce_expiry"))?;
        let trades_db = env.create_database(&mut wtxn, Some("trades"))?;
        let participant_trades_db =
            env.create_database(&mut wtxn, Some("participant_trades"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
            identities_db,
            asset_owners_db,
            nonces_db,
            nonce_expiry_db,
            trades_db,
            participant_trades_db,
            meta_db,
        })
    }

    /// Open with the default map size.
    pub fn open_default(path: &Path) -> Result<Self, LmdbError> {
        Self::open(path, DATABASE_COUNT, DEFAULT_MAP_SIZE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw heed environment, for integrity checks.
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Begin a concrete write transaction.
    pub fn begin_write(&self) -> Result<LmdbWriteTxn<'_>, StoreError> {
        LmdbWriteTxn::new(self)
    }

    /// Flush the memory map to disk.
    pub fn sync(&self) -> Result<(), StoreError> {
        self.env.force_sync().map_err(LmdbError::from)?;
        Ok(())
    }
}

impl ExchangeStore for LmdbEnvironment {
    fn write_txn(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError> {
        Ok(Box::new(self.begin_write()?))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Open a temporary LMDB environment.
    pub fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), DATABASE_COUNT, 10 * 1024 * 1024)
            .expect("failed to open env");
        (dir, env)
    }
}
