use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::*,
    error::{AppError, Result},
    repository::UserRepository,
};

#[derive(Debug, Serialize)]
pub struct CheckoutResponse<T> {
    pub record: T,
    pub payment: Payment,
}

async fn load_actor(state: &AppState, actor_id: Uuid) -> Result<User> {
    state
        .service_context
        .user_repo
        .find_by_id(actor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn book_service(
    State(state): State<AppState>,
    Json(request): Json<BookServiceRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse<ServiceBooking>>)> {
    load_actor(&state, request.patient_id).await?;
    let (record, payment) = state
        .service_context
        .checkout_service
        .book_service(request)
        .await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse { record, payment })))
}

pub async fn book_appointment(
    State(state): State<AppState>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse<PersonalAppointment>>)> {
    load_actor(&state, request.patient_id).await?;
    let (record, payment) = state
        .service_context
        .checkout_service
        .book_appointment(request)
        .await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse { record, payment })))
}

pub async fn order_medicine(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse<PharmacyOrder>>)> {
    load_actor(&state, request.customer_id).await?;
    let (record, payment) = state
        .service_context
        .checkout_service
        .order_medicine(request)
        .await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse { record, payment })))
}

pub async fn purchase_equipment(
    State(state): State<AppState>,
    Json(request): Json<PurchaseEquipmentRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse<EquipmentPurchase>>)> {
    load_actor(&state, request.customer_id).await?;
    let (record, payment) = state
        .service_context
        .checkout_service
        .purchase_equipment(request)
        .await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse { record, payment })))
}

pub async fn rent_equipment(
    State(state): State<AppState>,
    Json(request): Json<RentEquipmentRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse<EquipmentRental>>)> {
    load_actor(&state, request.customer_id).await?;
    let (record, payment) = state
        .service_context
        .checkout_service
        .rent_equipment(request)
        .await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse { record, payment })))
}

#[derive(Debug, Deserialize)]
pub struct CancelDto {
    pub actor_id: Uuid,
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<CancelDto>,
) -> Result<Json<ServiceBooking>> {
    let actor = load_actor(&state, dto.actor_id).await?;
    let booking = state
        .service_context
        .checkout_service
        .cancel_booking(id, &actor, dto.reason)
        .await?;
    Ok(Json(booking))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<CancelDto>,
) -> Result<Json<PersonalAppointment>> {
    let actor = load_actor(&state, dto.actor_id).await?;
    let appointment = state
        .service_context
        .checkout_service
        .cancel_appointment(id, &actor, dto.reason)
        .await?;
    Ok(Json(appointment))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<CancelDto>,
) -> Result<Json<PharmacyOrder>> {
    let actor = load_actor(&state, dto.actor_id).await?;
    let order = state
        .service_context
        .checkout_service
        .cancel_order(id, &actor)
        .await?;
    Ok(Json(order))
}

pub async fn cancel_purchase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<CancelDto>,
) -> Result<Json<EquipmentPurchase>> {
    let actor = load_actor(&state, dto.actor_id).await?;
    let purchase = state
        .service_context
        .checkout_service
        .cancel_purchase(id, &actor)
        .await?;
    Ok(Json(purchase))
}

pub async fn cancel_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<CancelDto>,
) -> Result<Json<EquipmentRental>> {
    let actor = load_actor(&state, dto.actor_id).await?;
    let rental = state
        .service_context
        .checkout_service
        .cancel_rental(id, &actor)
        .await?;
    Ok(Json(rental))
}
