use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Contest {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub entry_fee: f64,                  // charged on registration, INR
    pub max_participants_per_slot: i64,  // admission ceiling per slot
    pub total_slots: i64,                // first N entries of the slot table
    pub duration_minutes: i64,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Contest {
    pub fn new(
        title: &str,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        entry_fee: f64,
        max_participants_per_slot: i64,
        total_slots: i64,
    ) -> Self {
        Contest {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: None,
            start_date,
            end_date,
            entry_fee,
            max_participants_per_slot,
            total_slots,
            duration_minutes: 60,
            is_active: false,
            created_at: Some(Utc::now()),
        }
    }
}
