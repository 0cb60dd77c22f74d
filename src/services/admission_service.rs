use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use rand::Rng;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{slots, Booking},
        dto::{
            request::RegisterRequest,
            response::{SlotCountEntry, SlotCountsResponse},
        },
    },
    repositories::{BookingRepository, ContestRepository, SlotOccupancyRepository},
};

const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789@#$!%*?";

/// Admission control for contest slots. All capacity decisions go through the
/// occupancy repository's bounded atomic increment; this service never counts
/// bookings to decide admission.
pub struct AdmissionService {
    contests: Arc<dyn ContestRepository>,
    bookings: Arc<dyn BookingRepository>,
    occupancy: Arc<dyn SlotOccupancyRepository>,
    payment_hold_minutes: i64,
}

impl AdmissionService {
    pub fn new(
        contests: Arc<dyn ContestRepository>,
        bookings: Arc<dyn BookingRepository>,
        occupancy: Arc<dyn SlotOccupancyRepository>,
        payment_hold_minutes: i64,
    ) -> Self {
        Self {
            contests,
            bookings,
            occupancy,
            payment_hold_minutes,
        }
    }

    /// Reserve one seat in one slot. At most `max_participants_per_slot`
    /// registrations ever succeed per (contest, slot), and one identity can
    /// hold at most one booking per contest.
    pub async fn register(
        &self,
        contest_id: &str,
        slot_id: &str,
        request: RegisterRequest,
    ) -> AppResult<Booking> {
        request.validate()?;

        let contest = self
            .contests
            .find_by_id(contest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contest with id '{}' not found", contest_id)))?;

        if !contest.is_active {
            return Err(AppError::Conflict("Contest is not active".to_string()));
        }

        if !slots::is_valid_slot(slot_id, contest.total_slots) {
            return Err(AppError::ValidationError(format!(
                "'{}' is not a valid slot for this contest",
                slot_id
            )));
        }

        // fast-path probe; the unique indexes remain the enforcement point
        let email = request.email.trim().to_lowercase();
        let phone = request.phone.trim();
        if self
            .bookings
            .find_by_identity(contest_id, &email, phone)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Already registered for this contest".to_string(),
            ));
        }

        if !self
            .occupancy
            .try_acquire(contest_id, slot_id, contest.max_participants_per_slot)
            .await?
        {
            return Err(AppError::SlotFull);
        }

        let booking = Booking::new(
            contest_id,
            slot_id,
            &request.name,
            &email,
            phone,
            request.exam_date,
            generate_password(),
        );
        let booking = Booking {
            gender: request.gender,
            dob: request.dob,
            user_id: request.user_id,
            ..booking
        };

        match self.bookings.insert(booking).await {
            Ok(booking) => Ok(booking),
            Err(err) => {
                // the seat was claimed optimistically; hand it back on any
                // failed insert (identity race or store error)
                if let Err(release_err) = self.occupancy.release(contest_id, slot_id).await {
                    log::error!(
                        "failed to release seat for {}/{} after failed insert: {}",
                        contest_id,
                        slot_id,
                        release_err
                    );
                }
                Err(err)
            }
        }
    }

    /// Per-slot occupancy for a contest, for the slot picker UI.
    pub async fn slot_counts(&self, contest_id: &str) -> AppResult<SlotCountsResponse> {
        let contest = self
            .contests
            .find_by_id(contest_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contest with id '{}' not found", contest_id)))?;

        let counters = self.occupancy.counters_for_contest(contest_id).await?;
        let max_per_slot = contest.max_participants_per_slot;

        let slots = slots::contest_slots(contest.total_slots)
            .iter()
            .map(|slot| {
                let count = counters
                    .iter()
                    .find(|counter| counter.slot_id == slot.id)
                    .map(|counter| counter.seats)
                    .unwrap_or(0);
                SlotCountEntry {
                    slot_id: slot.id.to_string(),
                    count,
                    is_full: count >= max_per_slot,
                }
            })
            .collect();

        Ok(SlotCountsResponse {
            max_per_slot,
            slots,
        })
    }

    /// Expire unpaid holds older than the payment window: delete the booking
    /// and return its seat. The guarded delete makes concurrent sweeps and a
    /// racing payment confirmation safe.
    pub async fn release_expired_holds(&self) -> AppResult<usize> {
        let cutoff = Utc::now() - Duration::minutes(self.payment_hold_minutes);
        let pending = self.bookings.find_unpaid_pending().await?;

        let mut released = 0;
        for booking in pending
            .into_iter()
            .filter(|booking| booking.registration_at < cutoff)
        {
            if self.bookings.delete_if_unpaid(&booking.id).await? {
                self.occupancy
                    .release(&booking.contest_id, &booking.slot_id)
                    .await?;
                released += 1;
                log::info!(
                    "released expired hold {} for {}/{}",
                    booking.id,
                    booking.contest_id,
                    booking.slot_id
                );
            }
        }

        Ok(released)
    }

    /// Background sweeper for expired unpaid holds.
    pub fn spawn_hold_sweeper(
        service: Arc<AdmissionService>,
        interval_secs: u64,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(StdDuration::from_secs(interval_secs.max(1)));
            loop {
                ticker.tick().await;
                match service.release_expired_holds().await {
                    Ok(0) => {}
                    Ok(released) => log::info!("hold sweeper released {} seats", released),
                    Err(err) => log::error!("hold sweeper failed: {}", err),
                }
            }
        })
    }
}

fn generate_password() -> String {
    let mut rng = rand::thread_rng();
    let length = rng.gen_range(8..=16);
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..PASSWORD_CHARSET.len());
            PASSWORD_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;
    use crate::test_utils::in_memory::{
        InMemoryBookingRepository, InMemoryContestRepository, InMemorySlotOccupancyRepository,
    };

    fn service_for(contest: crate::models::domain::Contest) -> (Arc<AdmissionService>, Arc<InMemoryBookingRepository>, Arc<InMemorySlotOccupancyRepository>) {
        let contests = Arc::new(InMemoryContestRepository::with_contests(vec![contest]));
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let occupancy = Arc::new(InMemorySlotOccupancyRepository::new());
        let service = Arc::new(AdmissionService::new(
            contests,
            Arc::clone(&bookings) as Arc<dyn BookingRepository>,
            Arc::clone(&occupancy) as Arc<dyn SlotOccupancyRepository>,
            30,
        ));
        (service, bookings, occupancy)
    }

    #[tokio::test]
    async fn register_creates_pending_booking() {
        let contest = fixtures::active_contest(5);
        let contest_id = contest.id.clone();
        let (service, _, occupancy) = service_for(contest);

        let booking = service
            .register(&contest_id, "Slot-1", fixtures::register_request(0))
            .await
            .expect("registration should succeed");

        assert_eq!(booking.slot_id, "Slot-1");
        assert!(!booking.is_paid);
        assert!(!booking.exam_taken);
        assert!(booking.password.len() >= 8);
        assert_eq!(occupancy.seats(&contest_id, "Slot-1"), 1);
    }

    #[tokio::test]
    async fn register_rejects_unknown_contest() {
        let (service, _, _) = service_for(fixtures::active_contest(5));

        let err = service
            .register("no-such-contest", "Slot-1", fixtures::register_request(0))
            .await
            .expect_err("should fail");

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn register_rejects_inactive_contest() {
        let mut contest = fixtures::active_contest(5);
        contest.is_active = false;
        let contest_id = contest.id.clone();
        let (service, _, _) = service_for(contest);

        let err = service
            .register(&contest_id, "Slot-1", fixtures::register_request(0))
            .await
            .expect_err("should fail");

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_rejects_slot_outside_contest() {
        let mut contest = fixtures::active_contest(5);
        contest.total_slots = 2;
        let contest_id = contest.id.clone();
        let (service, _, _) = service_for(contest);

        let err = service
            .register(&contest_id, "Slot-5", fixtures::register_request(0))
            .await
            .expect_err("should fail");

        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_identity() {
        let contest = fixtures::active_contest(5);
        let contest_id = contest.id.clone();
        let (service, _, occupancy) = service_for(contest);

        service
            .register(&contest_id, "Slot-1", fixtures::register_request(0))
            .await
            .expect("first registration should succeed");

        let err = service
            .register(&contest_id, "Slot-2", fixtures::register_request(0))
            .await
            .expect_err("second registration with same identity should fail");

        assert!(matches!(err, AppError::Conflict(_)));
        // the losing attempt must not leak a seat in the other slot
        assert_eq!(occupancy.seats(&contest_id, "Slot-2"), 0);
    }

    #[tokio::test]
    async fn capacity_ceiling_holds_under_concurrent_registration() {
        let contest = fixtures::active_contest(5);
        let contest_id = contest.id.clone();
        let (service, _, occupancy) = service_for(contest);

        let mut handles = Vec::new();
        for i in 0..24 {
            let service = Arc::clone(&service);
            let contest_id = contest_id.clone();
            handles.push(tokio::spawn(async move {
                service
                    .register(&contest_id, "Slot-1", fixtures::register_request(i))
                    .await
            }));
        }

        let mut admitted = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.expect("task should not panic") {
                Ok(_) => admitted += 1,
                Err(AppError::SlotFull) => full += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(admitted, 5);
        assert_eq!(full, 19);
        assert_eq!(occupancy.seats(&contest_id, "Slot-1"), 5);
    }

    #[tokio::test]
    async fn duplicate_identity_race_admits_exactly_one() {
        let contest = fixtures::active_contest(5);
        let contest_id = contest.id.clone();
        let (service, _, occupancy) = service_for(contest);

        let mut handles = Vec::new();
        for _ in 0..2 {
            let service = Arc::clone(&service);
            let contest_id = contest_id.clone();
            handles.push(tokio::spawn(async move {
                // same identity on both tasks
                service
                    .register(&contest_id, "Slot-1", fixtures::register_request(7))
                    .await
            }));
        }

        let mut admitted = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.expect("task should not panic") {
                Ok(_) => admitted += 1,
                Err(AppError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(conflicts, 1);
        // the loser's optimistic seat claim must have been returned
        assert_eq!(occupancy.seats(&contest_id, "Slot-1"), 1);
    }

    #[tokio::test]
    async fn slot_counts_report_occupancy_and_fullness() {
        let contest = fixtures::active_contest(2);
        let contest_id = contest.id.clone();
        let (service, _, _) = service_for(contest);

        for i in 0..2 {
            service
                .register(&contest_id, "Slot-1", fixtures::register_request(i))
                .await
                .expect("registration should succeed");
        }

        let counts = service
            .slot_counts(&contest_id)
            .await
            .expect("counts should resolve");

        let slot_1 = counts
            .slots
            .iter()
            .find(|entry| entry.slot_id == "Slot-1")
            .expect("Slot-1 entry");
        assert_eq!(slot_1.count, 2);
        assert!(slot_1.is_full);

        let slot_2 = counts
            .slots
            .iter()
            .find(|entry| entry.slot_id == "Slot-2")
            .expect("Slot-2 entry");
        assert_eq!(slot_2.count, 0);
        assert!(!slot_2.is_full);
    }

    #[tokio::test]
    async fn expired_unpaid_holds_release_their_seats() {
        let contest = fixtures::active_contest(5);
        let contest_id = contest.id.clone();
        let (service, bookings, occupancy) = service_for(contest);

        let booking = service
            .register(&contest_id, "Slot-1", fixtures::register_request(0))
            .await
            .expect("registration should succeed");
        assert_eq!(occupancy.seats(&contest_id, "Slot-1"), 1);

        // age the hold past the payment window
        bookings.backdate_registration(&booking.id, Duration::minutes(45));

        let released = service
            .release_expired_holds()
            .await
            .expect("sweep should succeed");

        assert_eq!(released, 1);
        assert_eq!(occupancy.seats(&contest_id, "Slot-1"), 0);
        assert!(bookings
            .find_by_id(&booking.id)
            .await
            .expect("lookup should succeed")
            .is_none());
    }

    #[tokio::test]
    async fn paid_bookings_survive_the_hold_sweep() {
        let contest = fixtures::active_contest(5);
        let contest_id = contest.id.clone();
        let (service, bookings, occupancy) = service_for(contest);

        let booking = service
            .register(&contest_id, "Slot-1", fixtures::register_request(0))
            .await
            .expect("registration should succeed");

        bookings.backdate_registration(&booking.id, Duration::minutes(45));
        bookings
            .mark_payment(&booking.id, "order-1", true, "Paid")
            .await
            .expect("payment update should succeed");

        let released = service
            .release_expired_holds()
            .await
            .expect("sweep should succeed");

        assert_eq!(released, 0);
        assert_eq!(occupancy.seats(&contest_id, "Slot-1"), 1);
    }

    #[test]
    fn generated_passwords_stay_in_charset_and_length() {
        for _ in 0..50 {
            let password = generate_password();
            assert!(password.len() >= 8 && password.len() <= 16);
            assert!(password
                .bytes()
                .all(|byte| PASSWORD_CHARSET.contains(&byte)));
        }
    }
}
