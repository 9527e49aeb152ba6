//! # Application State
//!
//! Shared state for the Axum application, passed to every route handler
//! via the `State` extractor. Holds the device registry over a
//! [`DeviceStore`]: an in-memory repository serving all reads, with
//! write-through to Postgres when a pool is configured. The in-memory
//! side is hydrated from the database once at startup.

use async_trait::async_trait;
use devicehub_core::{
    Device, DeviceRegistry, DeviceRepository, DeviceState, InMemoryRepository, RepositoryError,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// The API's repository: in-memory authoritative reads, write-through
/// persistence to Postgres when configured.
///
/// Writes hit the database first so a failed write leaves the in-memory
/// view unchanged; reads never touch the database after hydration.
#[derive(Debug, Clone)]
pub struct DeviceStore {
    mem: InMemoryRepository,
    pool: Option<PgPool>,
}

impl DeviceStore {
    /// Create a store, in-memory-only when `pool` is `None`.
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            mem: InMemoryRepository::new(),
            pool,
        }
    }

    /// The configured database pool, if any.
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Insert a device into the in-memory side only. Used for startup
    /// hydration of rows already persisted in the database.
    pub async fn seed(&self, device: Device) -> Result<(), RepositoryError> {
        self.mem.save(&device).await
    }
}

#[async_trait]
impl DeviceRepository for DeviceStore {
    async fn load(&self, id: Uuid) -> Result<Option<Device>, RepositoryError> {
        self.mem.load(id).await
    }

    async fn save(&self, device: &Device) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            crate::db::devices::upsert(pool, device)
                .await
                .map_err(|e| RepositoryError::Backend(e.to_string()))?;
        }
        self.mem.save(device).await
    }

    async fn delete(&self, device: &Device) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            crate::db::devices::delete(pool, device.id)
                .await
                .map_err(|e| RepositoryError::Backend(e.to_string()))?;
        }
        self.mem.delete(device).await
    }

    async fn list_all(&self) -> Result<Vec<Device>, RepositoryError> {
        self.mem.list_all().await
    }

    async fn list_by_brand(&self, brand: &str) -> Result<Vec<Device>, RepositoryError> {
        self.mem.list_by_brand(brand).await
    }

    async fn list_by_state(&self, state: DeviceState) -> Result<Vec<Device>, RepositoryError> {
        self.mem.list_by_state(state).await
    }
}

/// Shared application state accessible to all route handlers.
/// Clone-friendly via `Arc` internals in the store.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: DeviceRegistry<DeviceStore>,
    pub config: AppConfig,
}

impl AppState {
    /// Create state with default configuration and no database pool.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create state with the given configuration and optional pool.
    pub fn with_config(config: AppConfig, pool: Option<PgPool>) -> Self {
        Self {
            registry: DeviceRegistry::new(DeviceStore::new(pool)),
            config,
        }
    }

    /// Load every persisted device into the in-memory store.
    ///
    /// Called once on startup when a database pool is available, so that
    /// reads stay fast and never block on the database.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let store = self.registry.repository();
        let pool = match store.pool() {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let devices = crate::db::devices::load_all(pool)
            .await
            .map_err(|e| format!("failed to load devices: {e}"))?;
        let count = devices.len();
        for device in devices {
            store
                .seed(device)
                .await
                .map_err(|e| format!("failed to seed device store: {e}"))?;
        }

        tracing::info!(devices = count, "hydrated in-memory store from database");
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_state_new_uses_default_config() {
        let state = AppState::new();
        assert_eq!(state.config.port, 8080);
        assert!(state.registry.repository().pool().is_none());
    }

    #[test]
    fn with_config_applies_custom_port() {
        let state = AppState::with_config(AppConfig { port: 3000 }, None);
        assert_eq!(state.config.port, 3000);
    }

    #[tokio::test]
    async fn store_without_pool_behaves_as_in_memory_repository() {
        let store = DeviceStore::new(None);
        let device = Device::new("MacBook Pro", "Apple", DeviceState::Available).unwrap();

        store.save(&device).await.unwrap();
        assert_eq!(store.load(device.id).await.unwrap().unwrap(), device);

        store.delete(&device).await.unwrap();
        assert!(store.load(device.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seed_populates_reads() {
        let store = DeviceStore::new(None);
        let device = Device::new("ThinkPad X1", "Lenovo", DeviceState::Inactive).unwrap();

        store.seed(device.clone()).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
        assert_eq!(store.load(device.id).await.unwrap().unwrap(), device);
    }

    #[tokio::test]
    async fn hydrate_without_pool_is_a_noop() {
        let state = AppState::new();
        state.hydrate_from_db().await.unwrap();
        assert!(state.registry.list_all().await.unwrap().is_empty());
    }
}
