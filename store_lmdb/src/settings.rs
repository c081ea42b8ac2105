//! LMDB implementation of SettingsStore.

use unqgate_store::{GateSettings, SettingsStore, StoreError};

use crate::environment::{decode, encode};
use crate::{LmdbError, LmdbStore};

const SETTINGS_KEY: &[u8] = b"settings";

impl SettingsStore for LmdbStore {
    fn load_settings(&self) -> Result<GateSettings, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .meta_db
            .get(&rtxn, SETTINGS_KEY)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(decode(bytes)?),
            None => Ok(GateSettings::default()),
        }
    }

    fn save_settings(&self, settings: &GateSettings) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, SETTINGS_KEY, &encode(settings)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
