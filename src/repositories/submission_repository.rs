use async_trait::async_trait;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{is_duplicate_key_error, AppError, AppResult},
    models::domain::SubmissionRecord,
};

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Insert relying on the unique booking_id index; a second record for the
    /// same booking surfaces as `Conflict`, which the scorer treats as "the
    /// first submission won".
    async fn insert(&self, record: SubmissionRecord) -> AppResult<SubmissionRecord>;
    async fn find_by_booking(&self, booking_id: &str) -> AppResult<Option<SubmissionRecord>>;
}

pub struct MongoSubmissionRepository {
    collection: Collection<SubmissionRecord>,
}

impl MongoSubmissionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("submissions");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let booking_index = IndexModel::builder()
            .keys(doc! { "booking_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("booking_unique".to_string())
                    .build(),
            )
            .build();

        let leaderboard_index = IndexModel::builder()
            .keys(doc! { "contest_id": 1, "slot_id": 1, "total_score": -1 })
            .options(
                IndexOptions::builder()
                    .name("contest_slot_score".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(booking_index).await?;
        self.collection.create_index(leaderboard_index).await?;

        log::info!("Created indexes for submissions collection");
        Ok(())
    }
}

#[async_trait]
impl SubmissionRepository for MongoSubmissionRepository {
    async fn insert(&self, record: SubmissionRecord) -> AppResult<SubmissionRecord> {
        match self.collection.insert_one(&record).await {
            Ok(_) => Ok(record),
            Err(err) if is_duplicate_key_error(&err) => Err(AppError::Conflict(
                "A submission already exists for this booking".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_booking(&self, booking_id: &str) -> AppResult<Option<SubmissionRecord>> {
        let record = self
            .collection
            .find_one(doc! { "booking_id": booking_id })
            .await?;
        Ok(record)
    }
}
