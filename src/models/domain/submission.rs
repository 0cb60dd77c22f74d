use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The scored result of one exam. Exactly one per booking, enforced by a
/// unique index on booking_id; booking_id doubles as the idempotency key
/// for retried submissions.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SubmissionRecord {
    pub id: String,
    pub booking_id: String,
    pub contest_id: String,
    pub slot_id: String,
    pub answers: Vec<AnswerRecord>,
    pub attempted_count: i64,
    pub skipped_count: i64,
    pub correct_count: i64,
    pub wrong_count: i64,
    pub total_score: f64,
    pub submitted_at: DateTime<Utc>,
}

/// One graded line item. Derived by the scorer, never trusted from the client.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub selected_option_index: Option<usize>,
    pub text_answer: Option<String>,
    pub is_correct: bool,
    pub skipped: bool,
}

impl SubmissionRecord {
    pub fn new(
        booking_id: &str,
        contest_id: &str,
        slot_id: &str,
        answers: Vec<AnswerRecord>,
        total_score: f64,
    ) -> Self {
        let attempted_count = answers.iter().filter(|a| !a.skipped).count() as i64;
        let skipped_count = answers.iter().filter(|a| a.skipped).count() as i64;
        let correct_count = answers.iter().filter(|a| a.is_correct).count() as i64;
        let wrong_count = answers
            .iter()
            .filter(|a| !a.skipped && !a.is_correct)
            .count() as i64;

        SubmissionRecord {
            id: Uuid::new_v4().to_string(),
            booking_id: booking_id.to_string(),
            contest_id: contest_id.to_string(),
            slot_id: slot_id.to_string(),
            answers,
            attempted_count,
            skipped_count,
            correct_count,
            wrong_count,
            total_score,
            submitted_at: Utc::now(),
        }
    }
}
