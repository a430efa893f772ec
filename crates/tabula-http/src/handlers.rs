//! Request handlers for one resource.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, Uri};
use serde_json::Value;

use tabula_core::{EntityService, Error, Mode, Record, RecordId};

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::router::RunMode;

/// Shared state for the routes of one resource.
#[derive(Debug)]
pub(crate) struct ResourceState {
    pub service: EntityService,
    pub mode: RunMode,
}

impl ResourceState {
    fn label(&self) -> &str {
        self.service.schema().label()
    }

    fn fail(&self, err: Error) -> ApiError {
        ApiError::from_service(err, self.label(), self.mode)
    }

    fn parse_id(&self, raw: &str) -> Result<RecordId, ApiError> {
        raw.parse::<RecordId>().map_err(|e| self.fail(e))
    }
}

type Shared = State<Arc<ResourceState>>;
type ApiResult<T> = Result<Envelope<T>, ApiError>;

/// `GET /<resource>`
pub(crate) async fn list_records(State(state): Shared) -> ApiResult<Vec<Record>> {
    let records = state.service.list().await.map_err(|e| state.fail(e))?;
    let message = format!(
        "Retrieved {} {}",
        records.len(),
        state.service.schema().resource()
    );
    Ok(Envelope::ok(records, message))
}

/// `GET /<resource>/:id`
pub(crate) async fn get_record(State(state): Shared, Path(id): Path<String>) -> ApiResult<Record> {
    let id = state.parse_id(&id)?;
    let record = state.service.get(&id).await.map_err(|e| state.fail(e))?;
    Ok(Envelope::ok(record, format!("{} found", state.label())))
}

/// `POST /<resource>`
pub(crate) async fn create_record(
    State(state): Shared,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Record> {
    let Json(body) = body?;
    state
        .service
        .validate(&body, Mode::Create)
        .map_err(|e| state.fail(e))?;
    let record = state.service.create(&body).await.map_err(|e| state.fail(e))?;
    Ok(Envelope::created(
        record,
        format!("{} created successfully", state.label()),
    ))
}

/// `PUT /<resource>/:id`
pub(crate) async fn update_record(
    State(state): Shared,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Record> {
    let id = state.parse_id(&id)?;
    let Json(body) = body?;
    // Unknown ids are reported before any payload problem.
    state.service.get(&id).await.map_err(|e| state.fail(e))?;
    state
        .service
        .validate(&body, Mode::Update)
        .map_err(|e| state.fail(e))?;
    let record = state
        .service
        .update(&id, &body)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Envelope::ok(
        record,
        format!("{} updated successfully", state.label()),
    ))
}

/// `DELETE /<resource>/:id`
pub(crate) async fn delete_record(
    State(state): Shared,
    Path(id): Path<String>,
) -> ApiResult<Record> {
    let id = state.parse_id(&id)?;
    let record = state.service.delete(&id).await.map_err(|e| state.fail(e))?;
    Ok(Envelope::ok(
        record,
        format!("{} deleted successfully", state.label()),
    ))
}

/// Unsupported method on an existing route.
pub(crate) async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

/// No route matched.
pub(crate) async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound {
        method: method.to_string(),
        path: uri.to_string(),
    }
}
