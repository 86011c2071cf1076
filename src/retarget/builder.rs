use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::correspondence::CorrespondenceResolver;
use super::offset::OffsetCalculator;
use super::table::RemapTable;
use crate::config::CompilerConfig;
use crate::diagnostics::Diagnostics;
use crate::error::CompileError;
use crate::rig::{Rig, RigCatalog, RigIndex, HUMAN_BONE_NAMES};

/// Identity of a remap table within a compile session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RemapKey {
    pub mirror: bool,
    pub source: RigIndex,
    pub destination: RigIndex,
}

impl RemapKey {
    pub fn new(source: RigIndex, destination: RigIndex, mirror: bool) -> Self {
        Self {
            mirror,
            source,
            destination,
        }
    }
}

impl fmt::Display for RemapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}{}",
            self.source,
            self.destination,
            if self.mirror { " (mirrored)" } else { "" }
        )
    }
}

/// Index of a table in [`RemapTableBuilder::tables`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RemapHandle(pub u32);

impl RemapHandle {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Destination bones in build order: the root, the canonical humanoid bones
/// in canonical order, then every remaining bone by index.
pub fn traversal_order(destination: &Rig) -> Vec<usize> {
    let count = destination.skeleton.len();
    let mut order = Vec::with_capacity(count);
    order.push(0);
    order.extend(
        HUMAN_BONE_NAMES
            .iter()
            .filter_map(|name| destination.human_bone(name)),
    );
    order.extend(1..count);
    order
}

/// Build one table from scratch
pub fn build_table(
    source: &Rig,
    destination: &Rig,
    mirror: bool,
    config: &CompilerConfig,
    diagnostics: &mut Diagnostics,
) -> RemapTable {
    let resolver = CorrespondenceResolver::new(source, destination, mirror, config);
    let calculator = OffsetCalculator::new(&source.skeleton, &destination.skeleton, mirror, config);

    let mut table = RemapTable::new();
    for pair in resolver.resolve_all(traversal_order(destination), diagnostics) {
        let offset = calculator.compute(pair);
        table.push(pair, offset, config.identity_tolerance);
    }

    log::debug!(
        "Built remap {} -> {}{}: {} channels, {} offsets",
        source.id,
        destination.id,
        if mirror { " (mirrored)" } else { "" },
        table.channel_count(),
        table.translation_offsets.len() + table.rotation_offsets.len()
    );
    table
}

/// Memoizing table builder for one compile session.
///
/// Each [`RemapKey`] is built at most once; tables with identical content are
/// stored once and shared by every key producing them.
#[derive(Debug)]
pub struct RemapTableBuilder {
    config: CompilerConfig,
    memo: HashMap<RemapKey, RemapHandle>,
    tables: Vec<RemapTable>,
    by_content: HashMap<u64, Vec<RemapHandle>>,
    builds: usize,
}

impl RemapTableBuilder {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            memo: HashMap::new(),
            tables: Vec::new(),
            by_content: HashMap::new(),
            builds: 0,
        }
    }

    /// Handle of the table for `key`, building it on first use.
    ///
    /// Fails only when either rig is missing from `catalog`.
    pub fn get_or_build(
        &mut self,
        catalog: &RigCatalog,
        key: RemapKey,
        diagnostics: &mut Diagnostics,
    ) -> Result<RemapHandle, CompileError> {
        if let Some(handle) = self.memo.get(&key) {
            return Ok(*handle);
        }

        let source = catalog.get(key.source)?;
        let destination = catalog.get(key.destination)?;
        let table = build_table(source, destination, key.mirror, &self.config, diagnostics);
        self.builds += 1;

        let handle = self.store(table);
        self.memo.insert(key, handle);
        Ok(handle)
    }

    fn store(&mut self, table: RemapTable) -> RemapHandle {
        let hash = table.content_hash();
        if self.config.dedup_tables {
            if let Some(existing) = self
                .by_content
                .get(&hash)
                .and_then(|bucket| bucket.iter().find(|h| self.tables[h.index()] == table))
            {
                return *existing;
            }
        }

        let handle = RemapHandle(self.tables.len() as u32);
        self.tables.push(table);
        self.by_content.entry(hash).or_default().push(handle);
        handle
    }

    pub fn table(&self, handle: RemapHandle) -> Option<&RemapTable> {
        self.tables.get(handle.index())
    }

    pub fn tables(&self) -> &[RemapTable] {
        &self.tables
    }

    /// Every memoized key with its handle, sorted by key
    pub fn keys(&self) -> Vec<(RemapKey, RemapHandle)> {
        let mut keys: Vec<_> = self.memo.iter().map(|(k, h)| (*k, *h)).collect();
        keys.sort();
        keys
    }

    /// Number of tables actually computed (memo hits excluded)
    pub fn build_count(&self) -> usize {
        self.builds
    }

    pub fn into_tables(self) -> Vec<RemapTable> {
        self.tables
    }
}
