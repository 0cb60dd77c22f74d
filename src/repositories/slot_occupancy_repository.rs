use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{IndexOptions, UpdateOptions},
    Collection, IndexModel,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::Database,
    errors::{is_duplicate_key_error, AppResult},
};

/// Seat counter for one (contest, slot) pair. Admission mutates `seats`
/// exclusively through the bounded atomic increment below; the naive
/// count-bookings-then-insert pattern cannot hold the ceiling under
/// concurrent registrations.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SlotOccupancy {
    pub contest_id: String,
    pub slot_id: String,
    pub seats: i64,
}

#[async_trait]
pub trait SlotOccupancyRepository: Send + Sync {
    /// Atomically claim one seat if occupancy is below `capacity`.
    /// Returns false when the slot is full; never over-admits, regardless
    /// of how many callers race.
    async fn try_acquire(&self, contest_id: &str, slot_id: &str, capacity: i64)
        -> AppResult<bool>;
    /// Return a previously claimed seat. Guarded so the counter never goes
    /// negative; releasing twice for one claim is a caller bug the guard
    /// absorbs.
    async fn release(&self, contest_id: &str, slot_id: &str) -> AppResult<()>;
    async fn counters_for_contest(&self, contest_id: &str) -> AppResult<Vec<SlotOccupancy>>;
}

pub struct MongoSlotOccupancyRepository {
    collection: Collection<SlotOccupancy>,
}

impl MongoSlotOccupancyRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("slot_occupancy");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let pair_index = IndexModel::builder()
            .keys(doc! { "contest_id": 1, "slot_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("contest_slot_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(pair_index).await?;

        log::info!("Created indexes for slot_occupancy collection");
        Ok(())
    }

    /// Make sure the counter document exists. Racing upserts can both try to
    /// insert; the unique index lets exactly one win and the loser's
    /// duplicate-key error is benign.
    async fn ensure_counter(&self, contest_id: &str, slot_id: &str) -> AppResult<()> {
        let options = UpdateOptions::builder().upsert(true).build();

        let result = self
            .collection
            .update_one(
                doc! { "contest_id": contest_id, "slot_id": slot_id },
                doc! { "$setOnInsert": {
                    "contest_id": contest_id,
                    "slot_id": slot_id,
                    "seats": 0_i64,
                } },
            )
            .with_options(options)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key_error(&err) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl SlotOccupancyRepository for MongoSlotOccupancyRepository {
    async fn try_acquire(
        &self,
        contest_id: &str,
        slot_id: &str,
        capacity: i64,
    ) -> AppResult<bool> {
        self.ensure_counter(contest_id, slot_id).await?;

        // The ceiling lives in the filter, the increment in the update: the
        // store applies both as one atomic operation, so at most `capacity`
        // acquisitions can ever succeed for this pair.
        let claimed = self
            .collection
            .find_one_and_update(
                doc! {
                    "contest_id": contest_id,
                    "slot_id": slot_id,
                    "seats": { "$lt": capacity },
                },
                doc! { "$inc": { "seats": 1_i64 } },
            )
            .await?;

        Ok(claimed.is_some())
    }

    async fn release(&self, contest_id: &str, slot_id: &str) -> AppResult<()> {
        self.collection
            .update_one(
                doc! {
                    "contest_id": contest_id,
                    "slot_id": slot_id,
                    "seats": { "$gt": 0_i64 },
                },
                doc! { "$inc": { "seats": -1_i64 } },
            )
            .await?;
        Ok(())
    }

    async fn counters_for_contest(&self, contest_id: &str) -> AppResult<Vec<SlotOccupancy>> {
        let counters = self
            .collection
            .find(doc! { "contest_id": contest_id })
            .await?
            .try_collect()
            .await?;
        Ok(counters)
    }
}
