use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use crate::account::{Account, AccountManager};
use crate::command::{AdmissionError, CommandKind, Outcome};

use super::state::AppState;
use super::types::{
    ApiResponse, CreateAccountRequest, HealthData, MutationData, MutationRequest, error_codes,
};

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn api_error(status: StatusCode, code: i32, msg: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::<()>::error(code, msg)))
}

/// POST /api/v1/accounts
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Account>>), ApiError> {
    let name = req.name.trim();
    if name.is_empty() || name.len() > 50 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            "account name must be 1-50 characters",
        ));
    }

    let account = AccountManager::create(state.db.pool(), name)
        .await
        .map_err(|e| {
            tracing::error!("account creation failed: {e}");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "account creation failed",
            )
        })?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(account))))
}

/// GET /api/v1/accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Account>>>, ApiError> {
    let accounts = AccountManager::list(state.db.pool()).await.map_err(|e| {
        tracing::error!("account listing failed: {e}");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "account listing failed",
        )
    })?;

    Ok(Json(ApiResponse::success(accounts)))
}

/// PUT /api/v1/accounts/deposit
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MutationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MutationData>>), ApiError> {
    submit_mutation(&state, CommandKind::Deposit, req).await
}

/// PUT /api/v1/accounts/withdraw
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MutationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MutationData>>), ApiError> {
    submit_mutation(&state, CommandKind::Withdraw, req).await
}

/// GET /api/v1/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let store = match state.db.health_check().await {
        Ok(()) => "ok",
        Err(_) => "unreachable",
    };
    Json(ApiResponse::success(HealthData {
        version: env!("CARGO_PKG_VERSION"),
        store,
    }))
}

/// Shared deposit/withdraw path: parse, admit, await the terminal outcome.
///
/// The handler blocks on the command's oneshot receiver, so the HTTP
/// response always reflects what the processor actually did - never an
/// optimistic acknowledgement.
async fn submit_mutation(
    state: &AppState,
    kind: CommandKind,
    req: MutationRequest,
) -> Result<(StatusCode, Json<ApiResponse<MutationData>>), ApiError> {
    let amount = Decimal::from_str(&req.amount).map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            "invalid amount",
        )
    })?;

    let outcome = state
        .teller
        .submit(kind, req.account_id, amount)
        .await
        .map_err(|e| match e {
            // Non-positive amounts surface as the caller-visible
            // insufficient-funds rejection.
            AdmissionError::NonPositiveAmount => api_error(
                StatusCode::BAD_REQUEST,
                error_codes::INSUFFICIENT_FUNDS,
                "insufficient funds",
            ),
            AdmissionError::MalformedAccount => api_error(
                StatusCode::BAD_REQUEST,
                error_codes::INVALID_PARAMETER,
                "malformed account id",
            ),
            AdmissionError::PipelineClosed => api_error(
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::SERVICE_UNAVAILABLE,
                "transaction pipeline unavailable",
            ),
        })?;

    match outcome.await {
        Ok(Outcome::Committed { balance }) => Ok((
            StatusCode::OK,
            Json(ApiResponse::success(MutationData {
                account_id: req.account_id,
                status: "COMMITTED",
                balance: Some(balance),
            })),
        )),
        Ok(Outcome::Deferred) => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(MutationData {
                account_id: req.account_id,
                status: "DEFERRED",
                balance: None,
            })),
        )),
        Ok(Outcome::InsufficientFunds) => Err(api_error(
            StatusCode::BAD_REQUEST,
            error_codes::INSUFFICIENT_FUNDS,
            "insufficient funds",
        )),
        Ok(Outcome::Failed(e)) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            e.to_string(),
        )),
        Ok(Outcome::FallbackFailed(e)) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::FALLBACK_WRITE_FAILED,
            e.to_string(),
        )),
        // Reply channel closed without an outcome: only possible while the
        // pipeline is being torn down.
        Err(_) => Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            "transaction pipeline unavailable",
        )),
    }
}
