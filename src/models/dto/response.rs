use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{Booking, BookingStatus, Question, SubmissionRecord};

/// Booking as exposed over HTTP. The issued credential is withheld; clients
/// retrieve it through the one-time access token after payment.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub id: String,
    pub contest_id: String,
    pub slot_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub exam_date: DateTime<Utc>,
    pub registration_at: DateTime<Utc>,
    pub exam_taken: bool,
    pub is_paid: bool,
    pub status: BookingStatus,
}

impl From<Booking> for BookingView {
    fn from(booking: Booking) -> Self {
        BookingView {
            id: booking.id,
            contest_id: booking.contest_id,
            slot_id: booking.slot_id,
            name: booking.name,
            email: booking.email,
            phone: booking.phone,
            exam_date: booking.exam_date,
            registration_at: booking.registration_at,
            exam_taken: booking.exam_taken,
            is_paid: booking.is_paid,
            status: booking.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub booking: BookingView,
}

#[derive(Debug, Serialize)]
pub struct EligibilityResponse {
    pub eligible: bool,
    pub state: &'static str, // not_paid | wrong_date | too_early | open | closed
    pub message: String,
    pub booking_id: String,
    pub slot_id: String,
    pub start_time: String, // "HH:MM" IST
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_start_in: Option<i64>, // seconds until the slot opens
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub booking_id: String,
    pub total_score: f64,
    pub attempted_count: i64,
    pub skipped_count: i64,
    pub correct_count: i64,
    pub wrong_count: i64,
    pub submitted_at: DateTime<Utc>,
}

impl From<SubmissionRecord> for SubmissionSummary {
    fn from(record: SubmissionRecord) -> Self {
        SubmissionSummary {
            booking_id: record.booking_id,
            total_score: record.total_score,
            attempted_count: record.attempted_count,
            skipped_count: record.skipped_count,
            correct_count: record.correct_count,
            wrong_count: record.wrong_count,
            submitted_at: record.submitted_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SlotCountEntry {
    pub slot_id: String,
    pub count: i64,
    pub is_full: bool,
}

#[derive(Debug, Serialize)]
pub struct SlotCountsResponse {
    pub max_per_slot: i64,
    pub slots: Vec<SlotCountEntry>,
}

/// Question as served to candidates: language-resolved, answer key stripped.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub contest_id: String,
    pub slot_id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub question_type: crate::models::domain::QuestionType,
    pub marks: f64,
}

impl QuestionView {
    pub fn from_question(question: &Question, lang: &str) -> Self {
        QuestionView {
            id: question.id.clone(),
            contest_id: question.contest_id.clone(),
            slot_id: question.slot_id.clone(),
            question_text: question.text_for(lang),
            options: question
                .options
                .iter()
                .map(|option| option.text_for(lang))
                .collect(),
            question_type: question.question_type,
            marks: question.marks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExamStatusResponse {
    pub booking_id: String,
    pub exam_taken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_taken_at: Option<DateTime<Utc>>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentSessionResponse {
    pub order_id: String,
    pub payment_session_id: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentConfirmedResponse {
    pub message: String,
    pub booking: BookingView,
    /// Single-use token for retrieving the issued credential.
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct BookingCredentials {
    pub booking_id: String,
    pub email: String,
    pub password: String,
}
