//! Shipment storage
//!
//! Keeps every shipment in memory and persists the whole collection to a
//! single JSON file (`shipments.json` in the data directory).
//!
//! Writes are all-or-nothing: the new collection is written to a temporary
//! file and renamed over the old one, and the in-memory copy is only replaced
//! once that succeeds. Each committed write bumps the shipment's `version`;
//! [`ShipmentStore::commit`] refuses a snapshot whose version is stale.

use crate::error::{Error, Result};
use crate::shipment::{normalize_tracking_id, Shipment};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Outcome of [`ShipmentStore::commit_many`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchCommit {
    /// Tracking IDs written
    pub committed: Vec<String>,
    /// Tracking IDs skipped because the stored copy changed (or vanished)
    pub conflicts: Vec<String>,
}

/// JSON-file shipment store
#[derive(Debug)]
pub struct ShipmentStore {
    path: PathBuf,
    shipments: RwLock<Vec<Shipment>>,
}

impl ShipmentStore {
    /// Open the store at `path`; a missing file is an empty store
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let shipments: Vec<Shipment> = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::Store(format!("Failed to parse {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(Error::Store(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let shipments = shipments
            .into_iter()
            .map(|mut s| {
                s.tracking_id = normalize_tracking_id(&s.tracking_id);
                s
            })
            .collect::<Vec<_>>();

        debug!("Loaded {} shipments from {}", shipments.len(), path.display());
        Ok(Self {
            path,
            shipments: RwLock::new(shipments),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of every shipment
    pub async fn list(&self) -> Vec<Shipment> {
        self.shipments.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.shipments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.shipments.read().await.is_empty()
    }

    /// Snapshot of one shipment (tracking IDs are case-insensitive)
    pub async fn get(&self, tracking_id: &str) -> Option<Shipment> {
        let wanted = normalize_tracking_id(tracking_id);
        self.shipments
            .read()
            .await
            .iter()
            .find(|s| s.tracking_id == wanted)
            .cloned()
    }

    /// Add a new shipment
    pub async fn insert(&self, mut shipment: Shipment) -> Result<Shipment> {
        shipment.tracking_id = normalize_tracking_id(&shipment.tracking_id);
        let mut guard = self.shipments.write().await;

        if guard.iter().any(|s| s.tracking_id == shipment.tracking_id) {
            return Err(Error::Conflict(format!(
                "Tracking ID {} already exists",
                shipment.tracking_id
            )));
        }

        shipment.version = 1;
        let mut next = guard.clone();
        next.push(shipment.clone());
        self.persist(&next).await?;
        *guard = next;
        Ok(shipment)
    }

    /// Read-modify-write one shipment under the store lock
    ///
    /// `f` works on a copy; nothing changes if it fails or the write fails.
    pub async fn update<F>(&self, tracking_id: &str, f: F) -> Result<Shipment>
    where
        F: FnOnce(&mut Shipment) -> Result<()>,
    {
        let wanted = normalize_tracking_id(tracking_id);
        let mut guard = self.shipments.write().await;

        let idx = guard
            .iter()
            .position(|s| s.tracking_id == wanted)
            .ok_or_else(|| Error::NotFound(wanted.clone()))?;

        let mut updated = guard[idx].clone();
        f(&mut updated)?;
        updated.tracking_id = wanted;
        updated.version = guard[idx].version + 1;

        let mut next = guard.clone();
        next[idx] = updated.clone();
        self.persist(&next).await?;
        *guard = next;
        Ok(updated)
    }

    /// Write back a snapshot taken earlier with [`get`](Self::get) or
    /// [`list`](Self::list)
    ///
    /// Fails with [`Error::Conflict`] if the stored shipment changed since the
    /// snapshot was taken.
    pub async fn commit(&self, mut shipment: Shipment) -> Result<Shipment> {
        shipment.tracking_id = normalize_tracking_id(&shipment.tracking_id);
        let mut guard = self.shipments.write().await;

        let idx = guard
            .iter()
            .position(|s| s.tracking_id == shipment.tracking_id)
            .ok_or_else(|| Error::NotFound(shipment.tracking_id.clone()))?;

        let stored = guard[idx].version;
        if stored != shipment.version {
            return Err(Error::Conflict(format!(
                "{} is at version {}, snapshot is at {}",
                shipment.tracking_id, stored, shipment.version
            )));
        }

        shipment.version = stored + 1;
        let mut next = guard.clone();
        next[idx] = shipment.clone();
        self.persist(&next).await?;
        *guard = next;
        Ok(shipment)
    }

    /// Write back several snapshots with a single file write
    ///
    /// Each snapshot gets the same version check as [`commit`](Self::commit);
    /// stale ones are skipped and reported. Nothing is written when no
    /// snapshot is current, and nothing changes if the write fails.
    pub async fn commit_many(&self, shipments: Vec<Shipment>) -> Result<BatchCommit> {
        let mut outcome = BatchCommit::default();
        if shipments.is_empty() {
            return Ok(outcome);
        }

        let mut guard = self.shipments.write().await;
        let mut next = guard.clone();

        for mut shipment in shipments {
            shipment.tracking_id = normalize_tracking_id(&shipment.tracking_id);
            let current = next
                .iter()
                .position(|s| s.tracking_id == shipment.tracking_id)
                .filter(|&idx| next[idx].version == shipment.version);

            match current {
                Some(idx) => {
                    shipment.version += 1;
                    outcome.committed.push(shipment.tracking_id.clone());
                    next[idx] = shipment;
                }
                None => outcome.conflicts.push(shipment.tracking_id),
            }
        }

        if !outcome.committed.is_empty() {
            self.persist(&next).await?;
            *guard = next;
        }
        Ok(outcome)
    }

    /// Write the collection to a temporary file, then rename it into place
    async fn persist(&self, shipments: &[Shipment]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::Store(format!("Failed to create data directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(shipments)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, content).await.map_err(|e| {
            Error::Store(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            Error::Store(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!("Saved {} shipments to {}", shipments.len(), self.path.display());
        Ok(())
    }
}
