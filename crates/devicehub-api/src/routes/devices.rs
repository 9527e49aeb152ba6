//! # Device Routes
//!
//! CRUD surface for the device registry under `/api/devices`.
//!
//! | Method | Path               | Purpose                           |
//! |--------|--------------------|-----------------------------------|
//! | POST   | /api/devices       | Create a device                   |
//! | GET    | /api/devices       | List devices (brand/state filter) |
//! | GET    | /api/devices/:id   | Fetch one device                  |
//! | PUT    | /api/devices/:id   | Full update                       |
//! | PATCH  | /api/devices/:id   | Partial update                    |
//! | DELETE | /api/devices/:id   | Delete                            |

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use devicehub_core::{Device, DevicePatch, DeviceState, DeviceUpdate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Request body for creating a device.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDeviceRequest {
    #[schema(example = "MacBook Pro 16")]
    pub name: String,
    #[schema(example = "Apple")]
    pub brand: String,
    #[schema(value_type = String, example = "AVAILABLE")]
    pub state: DeviceState,
}

impl Validate for CreateDeviceRequest {
    fn validate(&self) -> Result<(), AppError> {
        require_non_blank(&self.name, "name")?;
        require_non_blank(&self.brand, "brand")
    }
}

/// Request body for a full update. Every field is required; the stored
/// device is overwritten with exactly these values.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDeviceRequest {
    pub name: String,
    pub brand: String,
    #[schema(value_type = String, example = "IN_USE")]
    pub state: DeviceState,
}

impl Validate for UpdateDeviceRequest {
    fn validate(&self) -> Result<(), AppError> {
        require_non_blank(&self.name, "name")?;
        require_non_blank(&self.brand, "brand")
    }
}

/// Request body for a partial update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchDeviceRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    #[schema(value_type = Option<String>, example = "INACTIVE")]
    pub state: Option<DeviceState>,
}

impl Validate for PatchDeviceRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_non_blank(name, "name")?;
        }
        if let Some(brand) = &self.brand {
            require_non_blank(brand, "brand")?;
        }
        Ok(())
    }
}

fn require_non_blank(value: &str, field: &'static str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        Err(AppError::validation(
            format!("{field} must not be blank"),
            Some(field),
        ))
    } else {
        Ok(())
    }
}

/// A device as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceResponse {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    #[schema(value_type = String, example = "AVAILABLE")]
    pub state: DeviceState,
    #[serde(rename = "creationTime")]
    pub creation_time: DateTime<Utc>,
}

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            name: device.name,
            brand: device.brand,
            state: device.state,
            creation_time: device.creation_time,
        }
    }
}

/// Query parameters for the list endpoint.
///
/// `brand` takes precedence when both filters are supplied.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDevicesParams {
    /// Case-insensitive brand filter.
    pub brand: Option<String>,
    /// Lifecycle state filter.
    #[param(value_type = Option<String>, example = "IN_USE")]
    pub state: Option<DeviceState>,
}

/// Create a new device.
#[utoipa::path(
    post,
    path = "/api/devices",
    tag = "devices",
    request_body = CreateDeviceRequest,
    responses(
        (status = 201, description = "Device created", body = DeviceResponse),
        (status = 422, description = "Validation failed", body = ErrorBody),
    )
)]
pub async fn create_device(
    State(state): State<AppState>,
    payload: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = extract_validated_json(payload)?;
    let device = state
        .registry
        .create(req.name, req.brand, req.state)
        .await?;

    tracing::info!(id = %device.id, "device created");
    let location = format!("/api/devices/{}", device.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(DeviceResponse::from(device)),
    ))
}

/// List devices, optionally filtered by brand or state.
#[utoipa::path(
    get,
    path = "/api/devices",
    tag = "devices",
    params(ListDevicesParams),
    responses(
        (status = 200, description = "Matching devices", body = [DeviceResponse]),
    )
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(params): Query<ListDevicesParams>,
) -> Result<Json<Vec<DeviceResponse>>, AppError> {
    let devices = if let Some(brand) = &params.brand {
        state.registry.list_by_brand(brand).await?
    } else if let Some(device_state) = params.state {
        state.registry.list_by_state(device_state).await?
    } else {
        state.registry.list_all().await?
    };

    Ok(Json(devices.into_iter().map(DeviceResponse::from).collect()))
}

/// Fetch a single device by id.
#[utoipa::path(
    get,
    path = "/api/devices/{id}",
    tag = "devices",
    params(("id" = Uuid, Path, description = "Device id")),
    responses(
        (status = 200, description = "The device", body = DeviceResponse),
        (status = 404, description = "No such device", body = ErrorBody),
    )
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeviceResponse>, AppError> {
    let device = state.registry.get(id).await?;
    Ok(Json(DeviceResponse::from(device)))
}

/// Fully replace a device's mutable fields.
#[utoipa::path(
    put,
    path = "/api/devices/{id}",
    tag = "devices",
    params(("id" = Uuid, Path, description = "Device id")),
    request_body = UpdateDeviceRequest,
    responses(
        (status = 200, description = "Updated device", body = DeviceResponse),
        (status = 404, description = "No such device", body = ErrorBody),
        (status = 409, description = "Blocked by lifecycle state", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    )
)]
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateDeviceRequest>, JsonRejection>,
) -> Result<Json<DeviceResponse>, AppError> {
    let req = extract_validated_json(payload)?;
    let update = DeviceUpdate {
        name: req.name,
        brand: req.brand,
        state: req.state,
    };
    let device = state.registry.update(id, update).await?;

    tracing::info!(id = %device.id, "device updated");
    Ok(Json(DeviceResponse::from(device)))
}

/// Apply a partial update to a device.
#[utoipa::path(
    patch,
    path = "/api/devices/{id}",
    tag = "devices",
    params(("id" = Uuid, Path, description = "Device id")),
    request_body = PatchDeviceRequest,
    responses(
        (status = 200, description = "Updated device", body = DeviceResponse),
        (status = 404, description = "No such device", body = ErrorBody),
        (status = 409, description = "Blocked by lifecycle state", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    )
)]
pub async fn patch_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<PatchDeviceRequest>, JsonRejection>,
) -> Result<Json<DeviceResponse>, AppError> {
    let req = extract_validated_json(payload)?;
    let patch = DevicePatch {
        name: req.name,
        brand: req.brand,
        state: req.state,
    };
    let device = state.registry.update_partial(id, patch).await?;

    tracing::info!(id = %device.id, "device patched");
    Ok(Json(DeviceResponse::from(device)))
}

/// Delete a device.
#[utoipa::path(
    delete,
    path = "/api/devices/{id}",
    tag = "devices",
    params(("id" = Uuid, Path, description = "Device id")),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 404, description = "No such device", body = ErrorBody),
        (status = 409, description = "Blocked by lifecycle state", body = ErrorBody),
    )
)]
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.registry.delete(id).await?;

    tracing::info!(%id, "device deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Device routes under `/api/devices`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/devices", get(list_devices).post(create_device))
        .route(
            "/api/devices/:id",
            get(get_device)
                .put(update_device)
                .patch(patch_device)
                .delete(delete_device),
        )
}
