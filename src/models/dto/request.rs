use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 15, message = "Invalid phone number"))]
    pub phone: String,

    pub gender: Option<String>,

    pub dob: Option<DateTime<Utc>>,

    pub user_id: Option<String>,

    /// Day the candidate sits the exam; the slot window applies on this date.
    pub exam_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerInput {
    pub question_id: String,
    pub selected_option_index: Option<usize>, // mcq
    pub text_answer: Option<String>,          // text / numeric
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitExamRequest {
    #[validate(length(min = 1, message = "answers must not be empty"))]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionQuery {
    pub contest_id: String,
    pub slot_id: String,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub booking_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1))]
    pub booking_id: String,

    #[validate(length(min = 1))]
    pub order_id: String,
}
