use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::application::{AccountService, AppError};
use crate::domain::AccountId;

use super::dto::{
    to_cents, AccountDto, AmountRequest, CreateAccountRequest, TransactionDto, TransferRequest,
};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: AccountService,
}

impl AppState {
    pub fn new(service: AccountService) -> Self {
        Self { service }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::AccountNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientFunds { .. } | AppError::InvalidAmount(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// POST /api/accounts
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountDto>), AppError> {
    info!("POST /api/accounts - holder: {}", request.account_holder_name);

    let balance = to_cents(request.balance)?;
    let account = state
        .service
        .create_account(request.account_holder_name, balance)
        .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /api/accounts/:id
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<Json<AccountDto>, AppError> {
    info!("GET /api/accounts/{}", id);

    let account = state.service.get_account_by_id(id).await?;
    Ok(Json(account.into()))
}

/// PUT /api/accounts/:id/deposit
pub async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountDto>, AppError> {
    info!("PUT /api/accounts/{}/deposit - amount: {}", id, request.amount);

    let account = state.service.deposit(id, to_cents(request.amount)?).await?;
    Ok(Json(account.into()))
}

/// PUT /api/accounts/:id/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountDto>, AppError> {
    info!("PUT /api/accounts/{}/withdraw - amount: {}", id, request.amount);

    let account = state.service.withdraw(id, to_cents(request.amount)?).await?;
    Ok(Json(account.into()))
}

/// GET /api/accounts
pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<AccountDto>>, AppError> {
    info!("GET /api/accounts");

    let accounts = state.service.get_all_accounts().await?;
    Ok(Json(accounts.into_iter().map(AccountDto::from).collect()))
}

/// DELETE /api/accounts/:id
pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<&'static str, AppError> {
    info!("DELETE /api/accounts/{}", id);

    state.service.delete_account(id).await?;
    Ok("Account deleted successfully")
}

/// POST /api/accounts/transfer
pub async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<&'static str, AppError> {
    info!(
        "POST /api/accounts/transfer - {} -> {}: {}",
        request.from_account_id, request.to_account_id, request.amount
    );

    let amount = to_cents(request.amount)?;
    state
        .service
        .transfer_funds(request.from_account_id, request.to_account_id, amount)
        .await?;
    Ok("Transfer successful")
}

/// GET /api/accounts/:id/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<Json<Vec<TransactionDto>>, AppError> {
    info!("GET /api/accounts/{}/transactions", id);

    let transactions = state.service.get_account_transactions(id).await?;
    Ok(Json(transactions.into_iter().map(TransactionDto::from).collect()))
}
