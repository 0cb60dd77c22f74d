use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{is_duplicate_key_error, AppError, AppResult},
    models::domain::Booking,
};

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert relying on the (contest_id, email) / (contest_id, phone) unique
    /// indexes; a collision surfaces as `Conflict`.
    async fn insert(&self, booking: Booking) -> AppResult<Booking>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Booking>>;
    async fn find_by_identity(
        &self,
        contest_id: &str,
        email: &str,
        phone: &str,
    ) -> AppResult<Option<Booking>>;
    /// Flip the exam-taken flag, guarded on it still being false. Returns
    /// whether this call performed the flip.
    async fn mark_exam_taken(
        &self,
        booking_id: &str,
        score: f64,
        taken_at: DateTime<Utc>,
    ) -> AppResult<bool>;
    /// Record the payment outcome and return the updated booking.
    async fn mark_payment(
        &self,
        booking_id: &str,
        order_id: &str,
        is_paid: bool,
        status: &str,
    ) -> AppResult<Option<Booking>>;
    async fn find_unpaid_pending(&self) -> AppResult<Vec<Booking>>;
    /// Delete only while the booking is still an unpaid hold. Returns whether
    /// a document was removed.
    async fn delete_if_unpaid(&self, booking_id: &str) -> AppResult<bool>;
}

pub struct MongoBookingRepository {
    collection: Collection<Booking>,
}

impl MongoBookingRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("bookings");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // contest-wise unique registration, the dedup safety net for retries
        let email_index = IndexModel::builder()
            .keys(doc! { "contest_id": 1, "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("contest_email_unique".to_string())
                    .build(),
            )
            .build();

        let phone_index = IndexModel::builder()
            .keys(doc! { "contest_id": 1, "phone": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("contest_phone_unique".to_string())
                    .build(),
            )
            .build();

        let slot_index = IndexModel::builder()
            .keys(doc! { "contest_id": 1, "slot_id": 1 })
            .options(IndexOptions::builder().name("contest_slot".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(email_index).await?;
        self.collection.create_index(phone_index).await?;
        self.collection.create_index(slot_index).await?;

        log::info!("Created indexes for bookings collection");
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for MongoBookingRepository {
    async fn insert(&self, booking: Booking) -> AppResult<Booking> {
        match self.collection.insert_one(&booking).await {
            Ok(_) => Ok(booking),
            Err(err) if is_duplicate_key_error(&err) => Err(AppError::Conflict(
                "Already registered for this contest".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Booking>> {
        let booking = self.collection.find_one(doc! { "id": id }).await?;
        Ok(booking)
    }

    async fn find_by_identity(
        &self,
        contest_id: &str,
        email: &str,
        phone: &str,
    ) -> AppResult<Option<Booking>> {
        let booking = self
            .collection
            .find_one(doc! {
                "contest_id": contest_id,
                "$or": [ { "email": email }, { "phone": phone } ]
            })
            .await?;
        Ok(booking)
    }

    async fn mark_exam_taken(
        &self,
        booking_id: &str,
        score: f64,
        taken_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        // serialize through the same serde path as the Booking field
        let taken_at = mongodb::bson::ser::to_bson(&taken_at)?;

        let result = self
            .collection
            .update_one(
                doc! { "id": booking_id, "exam_taken": false },
                doc! { "$set": {
                    "exam_taken": true,
                    "exam_taken_at": taken_at,
                    "score": score,
                } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn mark_payment(
        &self,
        booking_id: &str,
        order_id: &str,
        is_paid: bool,
        status: &str,
    ) -> AppResult<Option<Booking>> {
        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();

        let booking = self
            .collection
            .find_one_and_update(
                doc! { "id": booking_id },
                doc! { "$set": {
                    "order_id": order_id,
                    "is_paid": is_paid,
                    "status": status,
                } },
            )
            .with_options(options)
            .await?;
        Ok(booking)
    }

    async fn find_unpaid_pending(&self) -> AppResult<Vec<Booking>> {
        let bookings = self
            .collection
            .find(doc! { "is_paid": false, "status": "Pending" })
            .await?
            .try_collect()
            .await?;
        Ok(bookings)
    }

    async fn delete_if_unpaid(&self, booking_id: &str) -> AppResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "id": booking_id, "is_paid": false, "status": "Pending" })
            .await?;
        Ok(result.deleted_count > 0)
    }
}
