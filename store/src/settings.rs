//! Runtime settings storage.
//!
//! Settings changed by operators at runtime (the verification role) are
//! persisted here and read per request instead of living in process state.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use unqgate_types::RoleId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSettings {
    /// Role granted to every verified subject.
    #[serde(default)]
    pub verification_role: Option<RoleId>,
}

pub trait SettingsStore {
    /// Current settings; defaults when nothing has been saved yet.
    fn load_settings(&self) -> Result<GateSettings, StoreError>;

    fn save_settings(&self, settings: &GateSettings) -> Result<(), StoreError>;
}
