//! # Device Registry
//!
//! Orchestrates every mutating and point-read operation: load the
//! entity, run the lifecycle rules against the proposed change set,
//! mutate, persist. The registry is the sole writer of persisted state
//! and holds no domain state of its own between calls.
//!
//! Existence is always verified before business rules, so `NotFound`
//! and `Rule` are ordered, never ambiguous, outcomes.
//!
//! Mutating operations are serialized through an async write gate held
//! across the whole load → validate → persist sequence, so a concurrent
//! write cannot commit between a rule check and the persist that relies
//! on it.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::device::{require_non_blank, Device, DeviceState, ValidationError};
use crate::lifecycle::{self, ProposedChange, RuleViolation};
use crate::repository::{DeviceRepository, RepositoryError};

/// Typed failure for registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The requested device id does not exist. Definitive, never retried.
    #[error("Device not found with id: {0}")]
    NotFound(Uuid),

    /// The requested mutation conflicts with the current lifecycle state.
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    /// A required field was blank.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unclassified persistence failure. Surfaced opaquely.
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Full-update input. Every field is supplied and overwrites the current
/// value; `creation_time` is deliberately absent — it cannot be updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
}

/// Partial-update input. Absent fields are left untouched; an all-absent
/// patch is a no-op returning the unchanged snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub state: Option<DeviceState>,
}

/// The registry core. Generic over the injected persistence capability;
/// clone-friendly when the repository is. Clones share one write gate.
#[derive(Debug, Clone)]
pub struct DeviceRegistry<R> {
    repo: R,
    /// Serializes mutating operations. `tokio::sync::Mutex` because the
    /// guard is held across the `.await` points between load and persist.
    write_gate: Arc<Mutex<()>>,
}

impl<R: DeviceRepository> DeviceRegistry<R> {
    /// Create a registry over the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Access the underlying repository (hydration, health checks).
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Construct and persist a new device. Rejects blank name/brand.
    pub async fn create(
        &self,
        name: impl Into<String>,
        brand: impl Into<String>,
        state: DeviceState,
    ) -> Result<Device, RegistryError> {
        let device = Device::new(name, brand, state)?;
        let _gate = self.write_gate.lock().await;
        self.repo.save(&device).await?;
        tracing::info!(id = %device.id, state = %device.state, "device created");
        Ok(device)
    }

    /// Fetch a device snapshot by id.
    pub async fn get(&self, id: Uuid) -> Result<Device, RegistryError> {
        self.load(id).await
    }

    /// Full update: all three mutable fields are overwritten with the
    /// supplied values. `creation_time` is left untouched.
    pub async fn update(&self, id: Uuid, update: DeviceUpdate) -> Result<Device, RegistryError> {
        require_non_blank(&update.name, ValidationError::BlankName)?;
        require_non_blank(&update.brand, ValidationError::BlankBrand)?;

        let _gate = self.write_gate.lock().await;
        let mut device = self.load(id).await?;
        let change = ProposedChange::full(&device, &update.name, &update.brand);
        self.check_update(&device, change)?;

        device.name = update.name;
        device.brand = update.brand;
        device.state = update.state;
        self.repo.save(&device).await?;
        tracing::info!(id = %id, state = %device.state, "device updated");
        Ok(device)
    }

    /// Partial update: only the supplied fields are overwritten.
    pub async fn update_partial(
        &self,
        id: Uuid,
        patch: DevicePatch,
    ) -> Result<Device, RegistryError> {
        if let Some(name) = &patch.name {
            require_non_blank(name, ValidationError::BlankName)?;
        }
        if let Some(brand) = &patch.brand {
            require_non_blank(brand, ValidationError::BlankBrand)?;
        }

        let _gate = self.write_gate.lock().await;
        let mut device = self.load(id).await?;
        let change = ProposedChange::partial(&device, patch.name.as_deref(), patch.brand.as_deref());
        self.check_update(&device, change)?;

        if let Some(name) = patch.name {
            device.name = name;
        }
        if let Some(brand) = patch.brand {
            device.brand = brand;
        }
        if let Some(state) = patch.state {
            device.state = state;
        }
        self.repo.save(&device).await?;
        tracing::info!(id = %id, state = %device.state, "device partially updated");
        Ok(device)
    }

    /// Delete a device. In-use devices are protected.
    pub async fn delete(&self, id: Uuid) -> Result<(), RegistryError> {
        let _gate = self.write_gate.lock().await;
        let device = self.load(id).await?;
        if let Err(violation) = lifecycle::check_delete(device.state) {
            tracing::warn!(id = %id, state = %device.state, "delete blocked: {violation}");
            return Err(violation.into());
        }
        self.repo.delete(&device).await?;
        tracing::info!(id = %id, "device deleted");
        Ok(())
    }

    /// Every registered device.
    pub async fn list_all(&self) -> Result<Vec<Device>, RegistryError> {
        Ok(self.repo.list_all().await?)
    }

    /// Devices matching `brand`, ignoring case. Empty when none match.
    pub async fn list_by_brand(&self, brand: &str) -> Result<Vec<Device>, RegistryError> {
        Ok(self.repo.list_by_brand(brand).await?)
    }

    /// Devices currently in `state`. Empty when none match.
    pub async fn list_by_state(&self, state: DeviceState) -> Result<Vec<Device>, RegistryError> {
        Ok(self.repo.list_by_state(state).await?)
    }

    async fn load(&self, id: Uuid) -> Result<Device, RegistryError> {
        match self.repo.load(id).await? {
            Some(device) => Ok(device),
            None => {
                tracing::warn!(id = %id, "device not found");
                Err(RegistryError::NotFound(id))
            }
        }
    }

    fn check_update(&self, device: &Device, change: ProposedChange) -> Result<(), RuleViolation> {
        if let Err(violation) = lifecycle::check_update(device.state, change) {
            tracing::warn!(
                id = %device.id,
                state = %device.state,
                "update blocked: {violation}"
            );
            return Err(violation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn registry() -> DeviceRegistry<InMemoryRepository> {
        DeviceRegistry::new(InMemoryRepository::new())
    }

    /// Repository whose `delete` parks mid-flight until released,
    /// holding a mutating operation open between its lifecycle check and
    /// its persist.
    struct GatedRepository {
        inner: InMemoryRepository,
        delete_entered: Arc<Notify>,
        delete_release: Arc<Notify>,
    }

    #[async_trait]
    impl DeviceRepository for GatedRepository {
        async fn load(&self, id: Uuid) -> Result<Option<Device>, RepositoryError> {
            self.inner.load(id).await
        }

        async fn save(&self, device: &Device) -> Result<(), RepositoryError> {
            self.inner.save(device).await
        }

        async fn delete(&self, device: &Device) -> Result<(), RepositoryError> {
            self.delete_entered.notify_one();
            self.delete_release.notified().await;
            self.inner.delete(device).await
        }

        async fn list_all(&self) -> Result<Vec<Device>, RepositoryError> {
            self.inner.list_all().await
        }

        async fn list_by_brand(&self, brand: &str) -> Result<Vec<Device>, RepositoryError> {
            self.inner.list_by_brand(brand).await
        }

        async fn list_by_state(&self, state: DeviceState) -> Result<Vec<Device>, RepositoryError> {
            self.inner.list_by_state(state).await
        }
    }

    fn full(name: &str, brand: &str, state: DeviceState) -> DeviceUpdate {
        DeviceUpdate {
            name: name.to_string(),
            brand: brand.to_string(),
            state,
        }
    }

    #[tokio::test]
    async fn create_persists_and_returns_snapshot() {
        let registry = registry();
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::Available)
            .await
            .unwrap();

        let fetched = registry.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let registry = registry();
        assert!(matches!(
            registry.create("", "Apple", DeviceState::Available).await,
            Err(RegistryError::Validation(ValidationError::BlankName))
        ));
        assert!(matches!(
            registry.create("MacBook", "  ", DeviceState::Available).await,
            Err(RegistryError::Validation(ValidationError::BlankBrand))
        ));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let registry = registry();
        let id = Uuid::new_v4();
        let err = registry.get(id).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(missing) if missing == id));
        assert_eq!(err.to_string(), format!("Device not found with id: {id}"));
    }

    #[tokio::test]
    async fn full_update_overwrites_all_mutable_fields() {
        let registry = registry();
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::Available)
            .await
            .unwrap();

        let updated = registry
            .update(created.id, full("ThinkPad X1", "Lenovo", DeviceState::Inactive))
            .await
            .unwrap();

        assert_eq!(updated.name, "ThinkPad X1");
        assert_eq!(updated.brand, "Lenovo");
        assert_eq!(updated.state, DeviceState::Inactive);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.creation_time, created.creation_time);
    }

    #[tokio::test]
    async fn creation_time_survives_every_update_path() {
        let registry = registry();
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::Available)
            .await
            .unwrap();

        let after_full = registry
            .update(created.id, full("MacBook Pro 14", "Apple", DeviceState::InUse))
            .await
            .unwrap();
        assert_eq!(after_full.creation_time, created.creation_time);

        let after_patch = registry
            .update_partial(
                created.id,
                DevicePatch {
                    state: Some(DeviceState::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(after_patch.creation_time, created.creation_time);
    }

    #[tokio::test]
    async fn in_use_rejects_name_and_brand_edits() {
        let registry = registry();
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::InUse)
            .await
            .unwrap();

        let err = registry
            .update(created.id, full("MacBook Pro 14", "Apple", DeviceState::InUse))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Rule(RuleViolation::InUseFieldsLocked)
        ));

        let err = registry
            .update_partial(
                created.id,
                DevicePatch {
                    brand: Some("Lenovo".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Rule(RuleViolation::InUseFieldsLocked)
        ));

        // The stored record is untouched after both denials.
        let fetched = registry.get(created.id).await.unwrap();
        assert_eq!(fetched.name, "MacBook Pro 16");
        assert_eq!(fetched.brand, "Apple");
    }

    #[tokio::test]
    async fn in_use_accepts_identical_values_and_state_changes() {
        let registry = registry();
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::InUse)
            .await
            .unwrap();

        // Re-supplying identical name/brand is not a change.
        let same = registry
            .update(created.id, full("MacBook Pro 16", "Apple", DeviceState::InUse))
            .await
            .unwrap();
        assert_eq!(same.state, DeviceState::InUse);

        // IN_USE may leave for any other state.
        let released = registry
            .update(created.id, full("MacBook Pro 16", "Apple", DeviceState::Available))
            .await
            .unwrap();
        assert_eq!(released.state, DeviceState::Available);
    }

    #[tokio::test]
    async fn empty_patch_is_a_noop() {
        let registry = registry();
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::InUse)
            .await
            .unwrap();

        let unchanged = registry
            .update_partial(created.id, DevicePatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged, created);
    }

    #[tokio::test]
    async fn patch_rejects_present_but_blank_fields() {
        let registry = registry();
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::Available)
            .await
            .unwrap();

        let err = registry
            .update_partial(
                created.id,
                DevicePatch {
                    name: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::BlankName)
        ));
    }

    #[tokio::test]
    async fn not_found_is_checked_before_business_rules() {
        let registry = registry();
        let id = Uuid::new_v4();

        // A name change that would violate IN_USE rules still reports
        // NotFound for a missing id.
        let err = registry
            .update(id, full("New Name", "New Brand", DeviceState::InUse))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));

        let err = registry.delete(id).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_blocked_for_in_use_and_leaves_device_persisted() {
        let registry = registry();
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::InUse)
            .await
            .unwrap();

        let err = registry.delete(created.id).await.unwrap_err();
        assert!(matches!(err, RegistryError::Rule(RuleViolation::InUseDelete)));
        assert_eq!(err.to_string(), "Cannot delete device with state IN_USE");

        assert_eq!(registry.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn delete_removes_then_get_is_not_found() {
        let registry = registry();
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::Inactive)
            .await
            .unwrap();

        registry.delete(created.id).await.unwrap();
        assert!(matches!(
            registry.get(created.id).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_by_brand_is_case_insensitive() {
        let registry = registry();
        registry
            .create("MacBook Pro 16", "Apple", DeviceState::Available)
            .await
            .unwrap();
        registry
            .create("ThinkPad X1", "Lenovo", DeviceState::Available)
            .await
            .unwrap();

        let apple = registry.list_by_brand("apple").await.unwrap();
        let upper = registry.list_by_brand("APPLE").await.unwrap();
        let exact = registry.list_by_brand("Apple").await.unwrap();
        assert_eq!(apple.len(), 1);
        assert_eq!(apple[0].id, upper[0].id);
        assert_eq!(apple[0].id, exact[0].id);
    }

    #[tokio::test]
    async fn concurrent_update_cannot_commit_inside_an_in_flight_delete() {
        let delete_entered = Arc::new(Notify::new());
        let delete_release = Arc::new(Notify::new());
        let registry = Arc::new(DeviceRegistry::new(GatedRepository {
            inner: InMemoryRepository::new(),
            delete_entered: Arc::clone(&delete_entered),
            delete_release: Arc::clone(&delete_release),
        }));

        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::Available)
            .await
            .unwrap();
        let id = created.id;

        // Start a delete and park it after its lifecycle check, before
        // the removal persists.
        let delete_registry = Arc::clone(&registry);
        let delete_task = tokio::spawn(async move { delete_registry.delete(id).await });
        delete_entered.notified().await;

        // An update racing the parked delete must wait for it, not slip
        // the device into IN_USE after the delete already validated.
        let update_registry = Arc::clone(&registry);
        let mut update_task = tokio::spawn(async move {
            update_registry
                .update(id, full("MacBook Pro 16", "Apple", DeviceState::InUse))
                .await
        });
        let raced = tokio::time::timeout(Duration::from_millis(50), &mut update_task).await;
        assert!(
            raced.is_err(),
            "update committed while a delete was between validate and persist"
        );

        delete_release.notify_one();
        delete_task.await.unwrap().unwrap();

        // The update runs only after the delete completed, so it
        // observes the removal instead of resurrecting the device.
        let err = update_task.await.unwrap().unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
        assert!(matches!(
            registry.get(id).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn lifecycle_scenario_end_to_end() {
        let registry = registry();

        // create AVAILABLE
        let created = registry
            .create("MacBook Pro 16", "Apple", DeviceState::Available)
            .await
            .unwrap();

        // take into use
        let in_use = registry
            .update(created.id, full("MacBook Pro 16", "Apple", DeviceState::InUse))
            .await
            .unwrap();
        assert_eq!(in_use.state, DeviceState::InUse);

        // rename while IN_USE: denied
        let err = registry
            .update(created.id, full("MacBook Pro 14", "Apple", DeviceState::InUse))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Rule(_)));

        // delete while IN_USE: denied
        let err = registry.delete(created.id).await.unwrap_err();
        assert!(matches!(err, RegistryError::Rule(_)));

        // retire via patch: allowed, name untouched
        let retired = registry
            .update_partial(
                created.id,
                DevicePatch {
                    state: Some(DeviceState::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(retired.state, DeviceState::Inactive);
        assert_eq!(retired.name, "MacBook Pro 16");

        // delete now succeeds, then the id is gone
        registry.delete(created.id).await.unwrap();
        assert!(matches!(
            registry.get(created.id).await,
            Err(RegistryError::NotFound(_))
        ));
    }
}
