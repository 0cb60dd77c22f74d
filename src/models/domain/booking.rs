use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One reserved seat in one slot of one contest. The store enforces
/// uniqueness of (contest_id, email) and (contest_id, phone).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Booking {
    pub id: String,
    pub contest_id: String,
    pub slot_id: String,
    pub name: String,
    pub email: String, // stored lowercased
    pub phone: String,
    pub gender: Option<String>,
    pub dob: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
    pub exam_date: DateTime<Utc>, // interpreted in IST by the eligibility check
    pub registration_at: DateTime<Utc>,
    pub exam_taken: bool,
    pub exam_taken_at: Option<DateTime<Utc>>,
    pub score: f64,
    pub password: String, // issued credential, delivered after payment
    pub order_id: Option<String>,
    pub is_paid: bool,
    pub status: BookingStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum BookingStatus {
    Pending,
    Paid,
    Failed,
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contest_id: &str,
        slot_id: &str,
        name: &str,
        email: &str,
        phone: &str,
        exam_date: DateTime<Utc>,
        password: String,
    ) -> Self {
        Booking {
            id: Uuid::new_v4().to_string(),
            contest_id: contest_id.to_string(),
            slot_id: slot_id.to_string(),
            name: name.to_string(),
            email: email.trim().to_lowercase(),
            phone: phone.trim().to_string(),
            gender: None,
            dob: None,
            user_id: None,
            exam_date,
            registration_at: Utc::now(),
            exam_taken: false,
            exam_taken_at: None,
            score: 0.0,
            password,
            order_id: None,
            is_paid: false,
            status: BookingStatus::Pending,
        }
    }
}
