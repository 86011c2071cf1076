use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use super::builder::{build_table, RemapKey};
use super::table::RemapTable;
use crate::config::CompilerConfig;
use crate::diagnostics::Diagnostics;
use crate::error::CompileError;
use crate::rig::RigCatalog;

type Slot = Arc<OnceLock<Arc<RemapTable>>>;

/// Remap-table memo that can be shared between worker threads.
///
/// A caller first claims the slot for its key under the map lock, then builds
/// outside the lock; concurrent callers for the same key wait on the slot, so
/// each key is built at most once.
#[derive(Debug, Default)]
pub struct SharedRemapCache {
    config: CompilerConfig,
    slots: Mutex<HashMap<RemapKey, Slot>>,
}

impl SharedRemapCache {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Table for `key`, building it if no thread has yet.
    ///
    /// Diagnostics from the build go to the caller that performed it.
    pub fn get_or_build(
        &self,
        catalog: &RigCatalog,
        key: RemapKey,
        diagnostics: &mut Diagnostics,
    ) -> Result<Arc<RemapTable>, CompileError> {
        // Check the rigs before claiming, so a bad key never leaves a slot behind
        let source = catalog.get(key.source)?;
        let destination = catalog.get(key.destination)?;

        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(slots.entry(key).or_default())
        };

        let table = slot.get_or_init(|| {
            Arc::new(build_table(
                source,
                destination,
                key.mirror,
                &self.config,
                diagnostics,
            ))
        });
        Ok(Arc::clone(table))
    }

    /// Number of keys claimed so far
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
