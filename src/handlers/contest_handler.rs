use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::RegisterRequest,
        response::{BookingView, RegistrationResponse},
    },
    repositories::ContestRepository,
};

#[get("/api/contests")]
async fn list_contests(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let contests = state.contests.find_active().await?;
    Ok(HttpResponse::Ok().json(contests))
}

#[get("/api/contests/{contest_id}/slot-counts")]
async fn slot_counts(
    state: web::Data<AppState>,
    contest_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let counts = state.admission.slot_counts(&contest_id).await?;
    Ok(HttpResponse::Ok().json(counts))
}

#[post("/api/contests/{contest_id}/slots/{slot_id}/register")]
async fn register(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let (contest_id, slot_id) = path.into_inner();

    let booking = state
        .admission
        .register(&contest_id, &slot_id, request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(RegistrationResponse {
        message: "Registration successful".to_string(),
        booking: BookingView::from(booking),
    }))
}
