use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Payment, PaymentStatus, User},
    error::{AppError, Result},
    ledger::PaymentAction,
    repository::{PaymentRepository, UserRepository},
};

async fn load_actor(state: &AppState, actor_id: Uuid) -> Result<User> {
    state
        .service_context
        .user_repo
        .find_by_id(actor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    pub status: Option<String>,
}

/// Ledger listing for one user, optionally filtered by status.
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<Vec<Payment>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            PaymentStatus::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid payment status: {}", s)))
        })
        .transpose()?;

    let mut payments = state
        .service_context
        .payment_repo
        .find_by_user(user_id)
        .await?;
    if let Some(status) = status {
        payments.retain(|p| p.status == status);
    }

    Ok(Json(payments))
}

#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor_id: Uuid,
}

pub async fn get(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Payment>> {
    let actor = load_actor(&state, query.actor_id).await?;
    let payment = state
        .service_context
        .payment_service
        .get(payment_id, &actor)
        .await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
pub struct SubmitProofDto {
    pub actor_id: Uuid,
    pub transaction_id: String,
    pub proof_url: Option<String>,
}

pub async fn submit_proof(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(dto): Json<SubmitProofDto>,
) -> Result<Json<Payment>> {
    let actor = load_actor(&state, dto.actor_id).await?;
    let payment = state
        .service_context
        .payment_service
        .transition(
            payment_id,
            PaymentAction::SubmitProof {
                transaction_id: dto.transaction_id,
                proof_url: dto.proof_url,
            },
            &actor,
        )
        .await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmCashDto {
    pub actor_id: Uuid,
}

pub async fn confirm_cash(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(dto): Json<ConfirmCashDto>,
) -> Result<Json<Payment>> {
    let actor = load_actor(&state, dto.actor_id).await?;
    let payment = state
        .service_context
        .payment_service
        .transition(payment_id, PaymentAction::ConfirmCash, &actor)
        .await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
pub struct ApproveDto {
    pub staff_id: Uuid,
}

pub async fn approve(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(dto): Json<ApproveDto>,
) -> Result<Json<Payment>> {
    let actor = load_actor(&state, dto.staff_id).await?;
    let payment = state
        .service_context
        .payment_service
        .transition(
            payment_id,
            PaymentAction::StaffApprove {
                staff_id: actor.id,
            },
            &actor,
        )
        .await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
pub struct RejectDto {
    pub staff_id: Uuid,
    pub reason: String,
}

pub async fn reject(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(dto): Json<RejectDto>,
) -> Result<Json<Payment>> {
    let actor = load_actor(&state, dto.staff_id).await?;
    let payment = state
        .service_context
        .payment_service
        .transition(
            payment_id,
            PaymentAction::StaffReject { reason: dto.reason },
            &actor,
        )
        .await?;
    Ok(Json(payment))
}
