use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::Payment,
    error::{AppError, Result},
    ledger::Balance,
    repository::{BookingRepository, OrderRepository, UserRepository},
};

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub user_id: Uuid,
    pub bookings: usize,
    pub appointments: usize,
    pub pharmacy_orders: usize,
    pub equipment_purchases: usize,
    pub equipment_rentals: usize,
    pub balance: Balance,
}

#[derive(Debug, Serialize)]
pub struct BalanceStatement {
    pub user_id: Uuid,
    pub balance: Balance,
    pub paid: Vec<Payment>,
    pub refunded: Vec<Payment>,
    pub cash_committed: Vec<Payment>,
    pub online_pending: Vec<Payment>,
    pub actionable_unpaid: Vec<Payment>,
}

async fn require_user(state: &AppState, user_id: Uuid) -> Result<()> {
    state
        .service_context
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(())
}

/// Dashboard card: quick counts plus the balance. The balance figures come
/// from the same composer as the detailed statement below, so the two
/// pages can never disagree.
pub async fn dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DashboardSummary>> {
    require_user(&state, user_id).await?;

    let ctx = &state.service_context;
    let balance = ctx.balance_service.balance_for(user_id).await?;

    let bookings = ctx.booking_repo.list_bookings_for_patient(user_id).await?;
    let appointments = ctx.booking_repo.list_appointments_for_patient(user_id).await?;
    let orders = ctx.order_repo.list_orders_for_customer(user_id).await?;
    let purchases = ctx.order_repo.list_purchases_for_customer(user_id).await?;
    let rentals = ctx.order_repo.list_rentals_for_customer(user_id).await?;

    Ok(Json(DashboardSummary {
        user_id,
        bookings: bookings.len(),
        appointments: appointments.len(),
        pharmacy_orders: orders.len(),
        equipment_purchases: purchases.len(),
        equipment_rentals: rentals.len(),
        balance,
    }))
}

/// Detailed balance page: the same balance plus the classified payment
/// lists behind each figure.
pub async fn statement(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BalanceStatement>> {
    require_user(&state, user_id).await?;

    let statement = state
        .service_context
        .balance_service
        .statement_for(user_id)
        .await?;

    let buckets = statement.buckets;
    Ok(Json(BalanceStatement {
        user_id,
        balance: statement.balance,
        paid: buckets.paid,
        refunded: buckets.refunded,
        cash_committed: buckets.cash_committed,
        online_pending: buckets.online_pending,
        actionable_unpaid: buckets.actionable_unpaid,
    }))
}
