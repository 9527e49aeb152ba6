//! # Persistence Contract
//!
//! The registry persists through this capability trait, keeping the
//! orchestration core independent of storage technology. An in-memory
//! implementation lives here; the API crate layers Postgres behind the
//! same contract.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::device::{Device, DeviceState};

/// Storage failure surfaced by a repository implementation.
///
/// Deliberately opaque: the registry maps it to an unclassified internal
/// failure without inspecting backend detail.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Persistence capability consumed by [`crate::registry::DeviceRegistry`].
///
/// `save` is an upsert keyed by `device.id`. `list_by_brand` matches
/// case-insensitively and returns an empty vec (not an error) when
/// nothing matches. Implementations must make each call atomic with
/// respect to concurrent writes to the same device id.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Fetch a device by id, or `None` if it does not exist.
    async fn load(&self, id: Uuid) -> Result<Option<Device>, RepositoryError>;

    /// Insert or overwrite the record for `device.id`.
    async fn save(&self, device: &Device) -> Result<(), RepositoryError>;

    /// Remove the record for `device.id`.
    async fn delete(&self, device: &Device) -> Result<(), RepositoryError>;

    /// Every persisted device, in no guaranteed order.
    async fn list_all(&self) -> Result<Vec<Device>, RepositoryError>;

    /// Devices whose brand equals `brand`, ignoring case.
    async fn list_by_brand(&self, brand: &str) -> Result<Vec<Device>, RepositoryError>;

    /// Devices currently in `state`.
    async fn list_by_state(&self, state: DeviceState) -> Result<Vec<Device>, RepositoryError>;
}

/// Thread-safe, clone-shared in-memory repository.
///
/// The RwLock is `parking_lot`, not `tokio::sync`: no lock is held
/// across an `.await` point and a panicking writer cannot poison the map.
/// Clones share the same underlying data.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    data: Arc<RwLock<HashMap<Uuid, Device>>>,
}

impl Clone for InMemoryRepository {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored devices.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the repository holds no devices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DeviceRepository for InMemoryRepository {
    async fn load(&self, id: Uuid) -> Result<Option<Device>, RepositoryError> {
        Ok(self.data.read().get(&id).cloned())
    }

    async fn save(&self, device: &Device) -> Result<(), RepositoryError> {
        self.data.write().insert(device.id, device.clone());
        Ok(())
    }

    async fn delete(&self, device: &Device) -> Result<(), RepositoryError> {
        self.data.write().remove(&device.id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Device>, RepositoryError> {
        Ok(self.data.read().values().cloned().collect())
    }

    async fn list_by_brand(&self, brand: &str) -> Result<Vec<Device>, RepositoryError> {
        let needle = brand.to_lowercase();
        Ok(self
            .data
            .read()
            .values()
            .filter(|d| d.brand.to_lowercase() == needle)
            .cloned()
            .collect())
    }

    async fn list_by_state(&self, state: DeviceState) -> Result<Vec<Device>, RepositoryError> {
        Ok(self
            .data
            .read()
            .values()
            .filter(|d| d.state == state)
            .cloned()
            .collect())
    }
}
