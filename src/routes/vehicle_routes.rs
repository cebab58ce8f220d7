//! Rutas HTTP para el aggregate Vehicle
//!
//! Adaptador fino sobre los servicios: aquí solo se parsean parámetros
//! y headers y se formatean respuestas. Toda decisión vive en el core.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::models::criteria::SearchCriteria;
use crate::models::pageable::{Pageable, Slice};
use crate::models::vehicle::{CreateVehicleRequest, UpdateVehicleRequest, VehicleResponse};
use crate::models::vehicle_file::AttachedFileResponse;
use crate::services::vehicle_read_service::VehicleReadService;
use crate::services::vehicle_write_service::VehicleWriteService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vehicle).get(find_vehicles))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/:id/file", get(download_file).put(upload_file))
}

#[derive(Debug, serde::Deserialize)]
struct FindByIdQuery {
    mit_reperaturen: Option<bool>,
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FindByIdQuery>,
) -> Result<Response, AppError> {
    let service = VehicleReadService::new(state.pool.clone());
    let vehicle = service
        .find_by_id(id, query.mit_reperaturen.unwrap_or(false))
        .await?;

    let etag = format!("\"{}\"", vehicle.version);
    Ok((
        [(header::ETAG, etag)],
        Json(VehicleResponse::from(vehicle)),
    )
        .into_response())
}

async fn find_vehicles(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Slice<VehicleResponse>>, AppError> {
    let mut params = params;
    // size y number pertenecen al descriptor de paginación, no a los criterios
    let size = take_page_param(&mut params, "size")?;
    let number = take_page_param(&mut params, "number")?;
    let pageable = Pageable::new(size, number);

    let criteria = if params.is_empty() {
        None
    } else {
        Some(SearchCriteria::new(params))
    };

    let service = VehicleReadService::new(state.pool.clone());
    let slice = service.find(criteria, pageable).await?;
    Ok(Json(Slice {
        content: slice
            .content
            .into_iter()
            .map(VehicleResponse::from)
            .collect(),
        total_elements: slice.total_elements,
    }))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Response, AppError> {
    request.validate()?;

    let service = VehicleWriteService::new(state.pool.clone(), state.mail.clone());
    let id = service.create(request).await?;

    let location = format!("/api/vehicles/{}", id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(json!({ "id": id })),
    )
        .into_response())
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Response, AppError> {
    request.validate()?;

    let version = headers
        .get(header::IF_MATCH)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("If-Match header is required".to_string()))?;

    let service = VehicleWriteService::new(state.pool.clone(), state.mail.clone());
    let new_version = service.update(Some(id), request, version).await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(header::ETAG, format!("\"{}\"", new_version))],
    )
        .into_response())
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let service = VehicleWriteService::new(state.pool.clone(), state.mail.clone());
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, serde::Deserialize)]
struct UploadFileQuery {
    filename: Option<String>,
}

async fn upload_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UploadFileQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AttachedFileResponse>, AppError> {
    let mimetype = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let filename = query.filename.unwrap_or_else(|| "datei.bin".to_string());

    let service = VehicleWriteService::new(state.pool.clone(), state.mail.clone());
    let file = service.add_file(id, body.to_vec(), filename, mimetype).await?;
    Ok(Json(AttachedFileResponse::from(&file)))
}

async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let service = VehicleReadService::new(state.pool.clone());
    let file = service
        .find_file(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("There is no file for vehicle {}", id)))?;

    Ok(([(header::CONTENT_TYPE, file.mimetype.clone())], file.data).into_response())
}

/// Extraer un parámetro de paginación del query string.
fn take_page_param(
    params: &mut BTreeMap<String, String>,
    key: &str,
) -> Result<Option<u32>, AppError> {
    match params.remove(key) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative number", key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_page_param() {
        let mut params: BTreeMap<String, String> = [
            ("size".to_string(), "2".to_string()),
            ("marke".to_string(), "BMW".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(take_page_param(&mut params, "size").unwrap(), Some(2));
        assert_eq!(take_page_param(&mut params, "number").unwrap(), None);
        // los criterios no se consumen
        assert!(params.contains_key("marke"));
    }

    #[test]
    fn test_take_page_param_rejects_garbage() {
        let mut params: BTreeMap<String, String> =
            [("size".to_string(), "dos".to_string())].into_iter().collect();
        assert!(take_page_param(&mut params, "size").is_err());
    }
}
