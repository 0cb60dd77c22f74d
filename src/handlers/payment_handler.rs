use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{ConfirmPaymentRequest, CreateOrderRequest},
        response::{
            BookingCredentials, BookingView, PaymentConfirmedResponse, PaymentSessionResponse,
        },
    },
    repositories::BookingRepository,
};

#[post("/api/payments/orders")]
async fn create_payment_order(
    state: web::Data<AppState>,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let session = state.payments.create_order(&request.booking_id).await?;

    Ok(HttpResponse::Created().json(PaymentSessionResponse {
        order_id: session.order_id,
        payment_session_id: session.payment_session_id,
    }))
}

#[post("/api/payments/confirm")]
async fn confirm_payment(
    state: web::Data<AppState>,
    request: web::Json<ConfirmPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let booking = state
        .payments
        .confirm_payment(&request.booking_id, &request.order_id)
        .await?;

    // hand the client a single-use token for picking up the credential
    let access_token = state.access_tokens.issue(&booking.id, Utc::now());

    Ok(HttpResponse::Ok().json(PaymentConfirmedResponse {
        message: "Payment confirmed".to_string(),
        booking: BookingView::from(booking),
        access_token,
    }))
}

#[get("/api/bookings/access/{token}")]
async fn booking_access(
    state: web::Data<AppState>,
    token: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let booking_id = state
        .access_tokens
        .redeem(&token, Utc::now())
        .ok_or_else(|| {
            AppError::NotFound("Access token is invalid, expired or already used".to_string())
        })?;

    let booking = state
        .bookings
        .find_by_id(&booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking with id '{}' not found", booking_id)))?;

    Ok(HttpResponse::Ok().json(BookingCredentials {
        booking_id: booking.id,
        email: booking.email,
        password: booking.password,
    }))
}
