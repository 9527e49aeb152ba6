//! Device persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `devices` table.
//! Lifecycle constraints are enforced at the registry layer, not in SQL.

use chrono::{DateTime, Utc};
use devicehub_core::{Device, DeviceState};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

/// Insert or update a device record.
///
/// `creation_time` is never part of the update set: on conflict the
/// existing value stands, matching the entity's immutability invariant.
pub async fn upsert(pool: &PgPool, device: &Device) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO devices (id, name, brand, state, creation_time)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE SET name = $2, brand = $3, state = $4",
    )
    .bind(device.id)
    .bind(&device.name)
    .bind(&device.brand)
    .bind(device.state.as_str())
    .bind(device.creation_time)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a device row. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM devices WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load every device, oldest first. Used for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Device>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DeviceRow>(
        "SELECT id, name, brand, state, creation_time FROM devices ORDER BY creation_time",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DeviceRow::into_device).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct DeviceRow {
    id: Uuid,
    name: String,
    brand: String,
    state: String,
    creation_time: DateTime<Utc>,
}

impl DeviceRow {
    /// Decode the persisted state string. An unknown value is surfaced
    /// as a decode error rather than defaulted — silently downgrading a
    /// state would drop the IN_USE mutation protection.
    fn into_device(self) -> Result<Device, sqlx::Error> {
        let state = DeviceState::from_str(&self.state).map_err(|e| {
            tracing::error!(id = %self.id, state = %self.state, "unknown device state in database");
            sqlx::Error::Decode(Box::new(e))
        })?;

        Ok(Device {
            id: self.id,
            name: self.name,
            brand: self.brand,
            state,
            creation_time: self.creation_time,
        })
    }
}
