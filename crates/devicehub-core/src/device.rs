//! # Device Entity Model
//!
//! The device record and its invariants. `name` and `brand` are rejected
//! when blank before a [`Device`] can exist, and `id` and `creation_time`
//! are assigned exactly once in [`Device::new`] — no mutator for either
//! is exposed past construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The lifecycle state of a device.
///
/// Uses `SCREAMING_SNAKE_CASE` for serialization to match the API
/// contract (`AVAILABLE`, `IN_USE`, `INACTIVE`) and prevent invalid
/// string values from being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    /// Device is registered and free to be taken into use.
    Available,
    /// Device is currently assigned. Name and brand are locked.
    InUse,
    /// Device is registered but out of rotation.
    Inactive,
}

impl DeviceState {
    /// Return the string representation of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::InUse => "IN_USE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown state string encountered while decoding persisted data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown device state: {0}")]
pub struct UnknownStateError(pub String);

impl std::str::FromStr for DeviceState {
    type Err = UnknownStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(Self::Available),
            "IN_USE" => Ok(Self::InUse),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(UnknownStateError(other.to_string())),
        }
    }
}

/// Per-field validation failure for required device fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `name` was absent, empty, or whitespace-only.
    #[error("name must not be blank")]
    BlankName,
    /// `brand` was absent, empty, or whitespace-only.
    #[error("brand must not be blank")]
    BlankBrand,
}

impl ValidationError {
    /// The offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::BlankName => "name",
            Self::BlankBrand => "brand",
        }
    }
}

/// Reject blank values for a required text field.
pub(crate) fn require_non_blank(value: &str, err: ValidationError) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(err)
    } else {
        Ok(())
    }
}

/// A registered device.
///
/// Fields are public for read access and persistence mapping.
/// Construction goes through [`Device::new`], the only place `id` and
/// `creation_time` are assigned; the registry never rewrites either on
/// any update path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique identifier, minted at construction. Never reassigned.
    pub id: Uuid,
    /// Non-blank display name.
    pub name: String,
    /// Non-blank brand, filtered case-insensitively.
    pub brand: String,
    /// Current lifecycle state.
    pub state: DeviceState,
    /// Set exactly once at construction. Never mutated afterwards.
    pub creation_time: DateTime<Utc>,
}

impl Device {
    /// Construct a new device, enforcing the non-blank invariants.
    pub fn new(
        name: impl Into<String>,
        brand: impl Into<String>,
        state: DeviceState,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let brand = brand.into();
        require_non_blank(&name, ValidationError::BlankName)?;
        require_non_blank(&brand, ValidationError::BlankBrand)?;

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            brand,
            state,
            creation_time: Utc::now(),
        })
    }
}
