use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{QuestionQuery, SubmitExamRequest},
        response::{ExamStatusResponse, QuestionView},
    },
    repositories::BookingRepository,
    services::eligibility,
};

#[get("/api/bookings/{booking_id}/eligibility")]
async fn booking_eligibility(
    state: web::Data<AppState>,
    booking_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let booking = state
        .bookings
        .find_by_id(&booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking with id '{}' not found", booking_id)))?;

    let outcome = eligibility::evaluate(&booking, Utc::now())?;
    Ok(HttpResponse::Ok().json(eligibility::response_for(&booking, &outcome)))
}

#[post("/api/bookings/{booking_id}/submit")]
async fn submit_exam(
    state: web::Data<AppState>,
    booking_id: web::Path<String>,
    request: web::Json<SubmitExamRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let summary = state.scoring.submit(&booking_id, &request.answers).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/api/bookings/{booking_id}/status")]
async fn exam_status(
    state: web::Data<AppState>,
    booking_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let booking = state
        .bookings
        .find_by_id(&booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking with id '{}' not found", booking_id)))?;

    let message = if booking.exam_taken {
        "User has already taken the exam."
    } else {
        "User has not taken the exam yet."
    };

    Ok(HttpResponse::Ok().json(ExamStatusResponse {
        booking_id: booking.id,
        exam_taken: booking.exam_taken,
        exam_taken_at: booking.exam_taken_at,
        message: message.to_string(),
    }))
}

#[get("/api/questions")]
async fn list_questions(
    state: web::Data<AppState>,
    query: web::Query<QuestionQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let lang = query.lang.as_deref().unwrap_or("en");

    let questions = state
        .question_cache
        .get(&query.contest_id, &query.slot_id)
        .await?;

    if questions.is_empty() {
        return Err(AppError::NotFound("No questions found".to_string()));
    }

    let views: Vec<QuestionView> = questions
        .iter()
        .map(|question| QuestionView::from_question(question, lang))
        .collect();

    Ok(HttpResponse::Ok().json(views))
}
