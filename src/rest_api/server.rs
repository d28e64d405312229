//! # REST API Routes
//!
//! Axum handlers mounting the record controller under `/rest/v1`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use super::controller::RecordController;
use super::errors::{RestError, RestResult};
use super::parser::{ParseMode, QuerySpec};

/// REST API state
pub struct RestServer {
    controller: RecordController,
    mode: ParseMode,
}

impl RestServer {
    pub fn new(controller: RecordController, mode: ParseMode) -> Self {
        Self { controller, mode }
    }

    /// Build the Axum router
    pub fn router(self) -> Router {
        let state = Arc::new(self);

        Router::new()
            .route("/rest/v1/:table", get(list_handler).post(insert_handler))
            .route(
                "/rest/v1/:table/:id",
                get(get_handler).patch(update_handler).delete(delete_handler),
            )
            .with_state(state)
    }
}

/// Shared state type
type ServerState = Arc<RestServer>;

/// Unwrap an extracted JSON body, turning every rejection into a 400
fn request_body(body: Result<Json<Value>, JsonRejection>) -> RestResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| RestError::InvalidBody(rejection.body_text()))
}

/// List records handler
async fn list_handler(
    State(server): State<ServerState>,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> RestResult<Json<Vec<Value>>> {
    // an unknown table answers 404 before the query string is judged
    server.controller.require_table(&table)?;
    let query = QuerySpec::parse_with_mode(params, server.mode)?;
    let rows = server.controller.list(&table, &query)?;
    Ok(Json(rows))
}

/// Get single record handler
async fn get_handler(
    State(server): State<ServerState>,
    Path((table, id)): Path<(String, String)>,
) -> RestResult<Json<Value>> {
    Ok(Json(server.controller.get(&table, &id)?))
}

/// Insert record handler
async fn insert_handler(
    State(server): State<ServerState>,
    Path(table): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> RestResult<(StatusCode, Json<Value>)> {
    server.controller.require_table(&table)?;
    let record = server.controller.create(&table, request_body(body)?)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Update record handler
async fn update_handler(
    State(server): State<ServerState>,
    Path((table, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> RestResult<Json<Value>> {
    server.controller.require_table(&table)?;
    Ok(Json(server.controller.update(&table, &id, request_body(body)?)?))
}

/// Delete record handler
async fn delete_handler(
    State(server): State<ServerState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<StatusCode, RestError> {
    server.controller.delete(&table, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
