//! Content-addressed, append-only snapshot history.
//!
//! ## Layout
//!
//! - `blobs/<sha256>`: gzip JSON of a [`MapState`], written once and shared by
//!   every record with the same content
//! - `maps/<map_id>/v<version>`: JSON [`SnapshotRecord`], one per version
//!
//! Versions start at 1 and increase by one per map. A writer presents the version
//! it last saw as the parent of the new record. Records are inserted with
//! insert-if-absent, so two writers racing for the same version cannot both win.

pub mod backend;
pub mod codec;
pub mod diff;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{ErrorKind, MapError, Result};
use crate::maps::{Map, MapState};
use crate::settings::{EngineSettings, SnapshotSettings};

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use diff::{AxisDelta, CellDelta, MapDiff};

const BLOB_PREFIX: &str = "blobs/";
const MAP_PREFIX: &str = "maps/";

/// Metadata of one saved version
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub map_id: Uuid,
    pub vehicle_id: String,
    pub version: u64,
    pub content_hash: String,
    pub parent_version: Option<u64>,
    #[serde(default)]
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// A verified snapshot: record plus decoded state
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub record: SnapshotRecord,
    pub state: MapState,
}

impl Snapshot {
    pub fn version(&self) -> u64 {
        self.record.version
    }

    /// Rebuild the map as it was at this version
    pub fn to_map(&self) -> Result<Map> {
        Map::from_state(
            self.record.map_id,
            self.record.vehicle_id.clone(),
            self.state.clone(),
            self.record.version,
        )
    }
}

fn blob_key(hash: &str) -> String {
    format!("{}{}", BLOB_PREFIX, hash)
}

fn history_prefix(map_id: Uuid) -> String {
    format!("{}{}/", MAP_PREFIX, map_id)
}

// Zero padding keeps lexicographic key order equal to version order
fn record_key(map_id: Uuid, version: u64) -> String {
    format!("{}v{:020}", history_prefix(map_id), version)
}

/// Snapshot store over any [`KvBackend`]
#[derive(Debug)]
pub struct SnapshotStore<B: KvBackend> {
    backend: B,
    compression_level: u32,
}

impl SnapshotStore<MemoryBackend> {
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new(), &SnapshotSettings::default())
    }
}

impl SnapshotStore<FileBackend> {
    /// File-backed store in the configured snapshot directory
    pub fn open(settings: &EngineSettings) -> Result<Self> {
        let dir = settings.snapshot_dir().ok_or_else(|| {
            MapError::Storage("Could not determine snapshot directory".to_string())
        })?;
        Ok(Self::new(FileBackend::open(dir)?, &settings.snapshot))
    }
}

impl<B: KvBackend> SnapshotStore<B> {
    pub fn new(backend: B, settings: &SnapshotSettings) -> Self {
        Self {
            backend,
            compression_level: settings.compression_level.min(9),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    fn read_record(&self, key: &str, map_id: Uuid, version: u64) -> Result<Option<SnapshotRecord>> {
        let Some(bytes) = self.backend.get(key)? else {
            return Ok(None);
        };
        let record: SnapshotRecord =
            serde_json::from_slice(&bytes).map_err(|e| MapError::Corruption {
                map_id: map_id.to_string(),
                version,
                reason: format!("record does not decode: {}", e),
            })?;
        if record.map_id != map_id || record.version != version {
            return Err(MapError::Corruption {
                map_id: map_id.to_string(),
                version,
                reason: format!(
                    "record claims {} v{}",
                    record.map_id, record.version
                ),
            });
        }
        Ok(Some(record))
    }

    fn version_from_key(key: &str) -> Option<u64> {
        key.rsplit('/').next()?.strip_prefix('v')?.parse().ok()
    }

    /// All readable records of a map, oldest first.
    ///
    /// A record that fails to decode is logged and left out; reading that
    /// version directly still reports the corruption.
    pub fn history(&self, map_id: Uuid) -> Result<Vec<SnapshotRecord>> {
        let mut records = Vec::new();
        for key in self.backend.list_prefix(&history_prefix(map_id))? {
            let Some(version) = Self::version_from_key(&key) else {
                tracing::warn!(%key, "skipping unrecognised key in snapshot history");
                continue;
            };
            match self.read_record(&key, map_id, version) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) if e.kind() == ErrorKind::Corruption => {
                    tracing::warn!(%map_id, version, error = %e, "skipping corrupt snapshot record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Latest record of a map, if it was ever saved
    pub fn head(&self, map_id: Uuid) -> Result<Option<SnapshotRecord>> {
        let keys = self.backend.list_prefix(&history_prefix(map_id))?;
        match keys.iter().rev().find_map(|k| Self::version_from_key(k)) {
            Some(version) => self.read_record(&record_key(map_id, version), map_id, version),
            None => Ok(None),
        }
    }

    /// Highest stored version, taken from the keys so a damaged head record
    /// cannot block new commits
    fn head_version(&self, map_id: Uuid) -> Result<u64> {
        let keys = self.backend.list_prefix(&history_prefix(map_id))?;
        Ok(keys
            .iter()
            .filter_map(|k| Self::version_from_key(k))
            .max()
            .unwrap_or(0))
    }

    /// Ids of every map with at least one snapshot
    pub fn maps(&self) -> Result<Vec<Uuid>> {
        let ids: BTreeSet<Uuid> = self
            .backend
            .list_prefix(MAP_PREFIX)?
            .iter()
            .filter_map(|k| k.strip_prefix(MAP_PREFIX)?.split('/').next()?.parse().ok())
            .collect();
        Ok(ids.into_iter().collect())
    }

    /// Read one version, verifying its payload against the recorded hash
    pub fn snapshot(&self, map_id: Uuid, version: u64) -> Result<Snapshot> {
        let record = self
            .read_record(&record_key(map_id, version), map_id, version)?
            .ok_or_else(|| {
                MapError::Validation(format!("map {} has no version {}", map_id, version))
            })?;
        let corruption = |reason: String| {
            tracing::warn!(%map_id, version, %reason, "snapshot failed verification");
            MapError::Corruption {
                map_id: map_id.to_string(),
                version,
                reason,
            }
        };
        let payload = self
            .backend
            .get(&blob_key(&record.content_hash))?
            .ok_or_else(|| corruption(format!("payload {} is missing", record.content_hash)))?;
        let state = codec::decode(&payload, &record.content_hash).map_err(corruption)?;
        Ok(Snapshot { record, state })
    }

    /// Rebuild the map as it was at `version`
    pub fn restore(&self, map_id: Uuid, version: u64) -> Result<Map> {
        self.snapshot(map_id, version)?.to_map()
    }

    /// Differences from `version_a` to `version_b`
    pub fn diff(&self, map_id: Uuid, version_a: u64, version_b: u64) -> Result<MapDiff> {
        let a = self.snapshot(map_id, version_a)?;
        let b = self.snapshot(map_id, version_b)?;
        Ok(diff::diff_states(version_a, &a.state, version_b, &b.state))
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    fn append(
        &self,
        map_id: Uuid,
        vehicle_id: &str,
        state: MapState,
        parent: u64,
        note: &str,
    ) -> Result<Snapshot> {
        let head = self.head_version(map_id)?;
        if head != parent {
            return Err(MapError::Conflict {
                map_id: map_id.to_string(),
                expected: parent,
                actual: head,
            });
        }

        let (hash, payload) = codec::encode(&state, self.compression_level)?;
        if self.backend.insert_new(&blob_key(&hash), &payload)? {
            tracing::debug!(%hash, bytes = payload.len(), "stored new payload blob");
        }

        let version = parent + 1;
        let record = SnapshotRecord {
            map_id,
            vehicle_id: vehicle_id.to_string(),
            version,
            content_hash: hash,
            parent_version: (parent > 0).then_some(parent),
            note: note.to_string(),
            created_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&record)?;
        if !self.backend.insert_new(&record_key(map_id, version), &bytes)? {
            return Err(MapError::Conflict {
                map_id: map_id.to_string(),
                expected: parent,
                actual: version,
            });
        }
        tracing::info!(%map_id, version, hash = %record.content_hash, "created snapshot");
        Ok(Snapshot { record, state })
    }

    /// Save the current state of `map` as the next version.
    ///
    /// `map.version` must equal the current head (0 for a never-saved map),
    /// otherwise this fails with a conflict.
    pub fn create_snapshot(&self, map: &Map, note: &str) -> Result<Snapshot> {
        self.append(map.id(), map.vehicle_id(), map.state(), map.version, note)
    }

    /// Create a snapshot and advance `map.version` to it
    pub fn commit(&self, map: &mut Map, note: &str) -> Result<Snapshot> {
        let snapshot = self.create_snapshot(map, note)?;
        map.version = snapshot.version();
        Ok(snapshot)
    }

    /// Restore `version` by appending it as a new head; history is never rewritten
    pub fn rollback(&self, map_id: Uuid, version: u64) -> Result<Map> {
        let target = self.snapshot(map_id, version)?;
        let head = self.head_version(map_id)?;
        let snapshot = self.append(
            map_id,
            &target.record.vehicle_id,
            target.state,
            head,
            &format!("rollback to v{}", version),
        )?;
        snapshot.to_map()
    }
}
