use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::slots::{self, IST},
        domain::Booking,
        dto::response::EligibilityResponse,
    },
};

/// How long before the slot opens that candidates may enter the waiting room.
const EARLY_ENTRY_MINUTES: i64 = 10;

/// Outcome of the exam-window check for one booking at one instant.
/// The payment guard is evaluated before any time-based state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Eligibility {
    NotPaid,
    WrongDate {
        exam_date: NaiveDate,
        already_passed: bool,
    },
    TooEarly {
        can_start_in: i64,
    },
    Open {
        can_start_in: i64,
    },
    Closed,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Open { .. })
    }
}

/// Pure check: no clock reads, no I/O. Callers pass the authoritative `now`
/// once so every comparison sees the same instant; all window math happens
/// in IST.
pub fn evaluate(booking: &Booking, now: DateTime<Utc>) -> AppResult<Eligibility> {
    if !booking.is_paid {
        return Ok(Eligibility::NotPaid);
    }

    let slot = slots::slot_window(&booking.slot_id).ok_or_else(|| {
        AppError::ValidationError(format!("Invalid slot '{}' on booking", booking.slot_id))
    })?;

    let now_ist = now.with_timezone(&*IST);
    let exam_date = booking.exam_date.with_timezone(&*IST).date_naive();
    let today = now_ist.date_naive();

    if exam_date != today {
        return Ok(Eligibility::WrongDate {
            exam_date,
            already_passed: exam_date < today,
        });
    }

    let slot_start = exam_date
        .and_time(slot.start)
        .and_local_timezone(*IST)
        .single()
        .ok_or_else(|| AppError::InternalError("slot start is not a valid instant".to_string()))?;
    let slot_end = exam_date
        .and_time(slot.end)
        .and_local_timezone(*IST)
        .single()
        .ok_or_else(|| AppError::InternalError("slot end is not a valid instant".to_string()))?;
    let early_entry = slot_start - Duration::minutes(EARLY_ENTRY_MINUTES);

    if now_ist > slot_end {
        return Ok(Eligibility::Closed);
    }

    // seconds until the exam proper starts, not until the waiting room opens
    let until_start = (slot_start - now_ist).num_seconds();

    if now_ist < early_entry {
        return Ok(Eligibility::TooEarly {
            can_start_in: until_start,
        });
    }

    Ok(Eligibility::Open {
        can_start_in: until_start.max(0),
    })
}

/// Shape the outcome for the polling client, with the countdown fields the
/// UI needs.
pub fn response_for(booking: &Booking, state: &Eligibility) -> EligibilityResponse {
    let (start_time, end_time) = slots::slot_window(&booking.slot_id)
        .map(|slot| {
            (
                slot.start.format("%H:%M").to_string(),
                slot.end.format("%H:%M").to_string(),
            )
        })
        .unwrap_or_default();

    let (eligible, state_name, message, can_start_in) = match state {
        Eligibility::NotPaid => (
            false,
            "not_paid",
            "Payment not found or not completed.".to_string(),
            None,
        ),
        Eligibility::WrongDate {
            exam_date,
            already_passed: true,
        } => (
            false,
            "wrong_date",
            format!("Your booked exam date ({}) has already passed.", exam_date),
            None,
        ),
        Eligibility::WrongDate {
            exam_date,
            already_passed: false,
        } => (
            false,
            "wrong_date",
            format!(
                "Your booked exam date is {}. You can join only on that date.",
                exam_date
            ),
            None,
        ),
        Eligibility::TooEarly { can_start_in } => (
            false,
            "too_early",
            format!(
                "Your slot starts at {}. You can join {} minutes before.",
                start_time, EARLY_ENTRY_MINUTES
            ),
            Some(*can_start_in),
        ),
        Eligibility::Open { can_start_in } => (
            true,
            "open",
            "You are eligible to start the exam.".to_string(),
            Some(*can_start_in),
        ),
        Eligibility::Closed => (
            false,
            "closed",
            format!("You missed your exam slot ({} - {}).", start_time, end_time),
            None,
        ),
    };

    EligibilityResponse {
        eligible,
        state: state_name,
        message,
        booking_id: booking.id.clone(),
        slot_id: booking.slot_id.clone(),
        start_time,
        end_time,
        can_start_in,
    }
}
