//! # devicehub-core — Device Lifecycle & Registry Core
//!
//! The domain core of the device hub: the device record and its
//! construction invariants, the lifecycle rules deciding which mutations
//! are permitted in which state, the persistence contract, and the
//! registry that orchestrates load → validate → mutate → persist for
//! every operation.
//!
//! All durable state lives behind [`repository::DeviceRepository`], and
//! each mutating registry operation is one atomic
//! load-validate-mutate-persist unit: the registry serializes them
//! through an async write gate so concurrent callers cannot interleave
//! between a rule check and the persist that relies on it.

pub mod device;
pub mod lifecycle;
pub mod registry;
pub mod repository;

pub use device::{Device, DeviceState, ValidationError};
pub use lifecycle::{ProposedChange, RuleViolation};
pub use registry::{DevicePatch, DeviceRegistry, DeviceUpdate, RegistryError};
pub use repository::{DeviceRepository, InMemoryRepository, RepositoryError};
