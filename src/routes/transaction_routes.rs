//! Transaction endpoint handlers.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use crate::metrics::MetricsRecorder;
use crate::models::{Page, Transaction, TransactionRequest};
use crate::state::AppState;
use crate::store::NewTransaction;
use crate::utils::http_helpers::ApiError;

/// Registers transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/:id", get(get_transaction))
}

/// Parses and validates the body, then persists it. Returns the request as
/// submitted alongside the stored row.
async fn insert_transaction(
    state: &AppState,
    body: &[u8],
) -> Result<(TransactionRequest, Transaction), ApiError> {
    let request: TransactionRequest =
        serde_json::from_slice(body).map_err(|e| ApiError::Validation(e.to_string()))?;

    if !request.has_positive_value() {
        return Err(ApiError::Value);
    }

    let txn = state
        .store
        .insert(NewTransaction {
            value: request.value,
            timestamp: request.timestamp,
        })
        .await?;
    Ok((request, txn))
}

/// Creates a transaction. Every failure, whether an unreadable or oversized
/// body, a bad payload or a store error, counts towards
/// `transactions_errors_total`.
async fn create_transaction(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let outcome = match body {
        Ok(body) => insert_transaction(&state, &body).await,
        Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
    };

    match outcome {
        Ok((request, txn)) => {
            state
                .metrics
                .record_transaction_created(txn.status.as_str(), request.value);
            debug!(id = txn.id, value = txn.value, "transaction created");
            Ok((StatusCode::CREATED, Json(txn)))
        }
        Err(e) => {
            state.metrics.record_transaction_error();
            if !matches!(e, ApiError::Store(_)) {
                debug!(error = %e, "Rejected transaction request");
            }
            Err(e)
        }
    }
}

async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    // Lenient on purpose: bad or out-of-range values keep the defaults.
    let page = Page::from_query(
        params.get("limit").map(String::as_str),
        params.get("offset").map(String::as_str),
    );
    let transactions = state.store.list(page).await?;
    Ok(Json(transactions))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, ApiError> {
    // A non-numeric identifier cannot name a stored row.
    let id: i64 = id.parse().map_err(|_| ApiError::NotFound)?;
    match state.store.get(id).await? {
        Some(txn) => Ok(Json(txn)),
        None => Err(ApiError::NotFound),
    }
}
