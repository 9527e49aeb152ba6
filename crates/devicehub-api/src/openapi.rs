//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "DeviceHub API",
        version = "0.1.0",
        description = "Device registry with lifecycle-aware CRUD operations.",
        license(name = "MIT")
    ),
    paths(
        crate::routes::devices::create_device,
        crate::routes::devices::list_devices,
        crate::routes::devices::get_device,
        crate::routes::devices::update_device,
        crate::routes::devices::patch_device,
        crate::routes::devices::delete_device,
    ),
    components(schemas(
        crate::routes::devices::DeviceResponse,
        crate::routes::devices::CreateDeviceRequest,
        crate::routes::devices::UpdateDeviceRequest,
        crate::routes::devices::PatchDeviceRequest,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "devices", description = "Device registry CRUD API"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
///
/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_contains_all_device_paths() {
        let spec = ApiDoc::openapi();
        let paths = &spec.paths.paths;
        assert!(paths.contains_key("/api/devices"));
        assert!(paths.contains_key("/api/devices/{id}"));
    }
}
