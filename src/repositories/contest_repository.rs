use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::Contest};

#[async_trait]
pub trait ContestRepository: Send + Sync {
    async fn create(&self, contest: Contest) -> AppResult<Contest>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Contest>>;
    async fn find_active(&self) -> AppResult<Vec<Contest>>;
}

pub struct MongoContestRepository {
    collection: Collection<Contest>,
}

impl MongoContestRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("contests");
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

        self.collection.create_index(id_index).await?;

        log::info!("Created indexes for contests collection");
        Ok(())
    }
}

#[async_trait]
impl ContestRepository for MongoContestRepository {
    async fn create(&self, contest: Contest) -> AppResult<Contest> {
        self.collection.insert_one(&contest).await?;
        Ok(contest)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Contest>> {
        let contest = self.collection.find_one(doc! { "id": id }).await?;
        Ok(contest)
    }

    async fn find_active(&self) -> AppResult<Vec<Contest>> {
        let contests = self
            .collection
            .find(doc! { "is_active": true })
            .sort(doc! { "start_date": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(contests)
    }
}
