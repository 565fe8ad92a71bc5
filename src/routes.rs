use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{event, Level};

use crate::{cqrs::{CallbackError, CommandHandler, ProcessMpesaCallbackCommand}, state::AppState};

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/mpesa/callback", post(mpesa_callback).fallback(invalid_request))
        .with_state(state)
}

pub async fn index() -> &'static str {
    "Hello, World!"
}

pub async fn invalid_request() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, "Invalid request")
}

/// STK push confirmation webhook. The body is parsed by hand so a malformed request
/// can be rejected without ever reaching the command handler.
pub async fn mpesa_callback(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            event!(Level::WARN, "Unparsable callback body: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid request").into_response();
        }
    };

    let command = ProcessMpesaCallbackCommand { payload: payload };

    match state.process_callback_handler.handle(&command).await {
        Ok(ack) => (
            StatusCode::OK,
            [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
            Json(json!(ack)),
        )
            .into_response(),
        Err(e) => {
            let status = match &e {
                CallbackError::CartNotFound | CallbackError::InvalidPayload => StatusCode::BAD_REQUEST,
                CallbackError::OrderCreation(message) => {
                    event!(Level::ERROR, "Order creation error: {}", message);
                    StatusCode::INTERNAL_SERVER_ERROR
                },
                CallbackError::Store(message) => {
                    event!(Level::ERROR, "Store error: {}", message);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };

            (status, e.to_string()).into_response()
        }
    }
}
