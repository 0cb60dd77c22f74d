use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use mongodb::{
    bson::doc,
    change_stream::event::OperationType,
    options::{ChangeStreamOptions, FullDocumentType, IndexOptions},
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::Question};

/// Upstream change notification consumed by the question cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuestionChangeEvent {
    /// A question for this key was inserted, replaced or updated.
    Changed { contest_id: String, slot_id: String },
    /// A change whose key cannot be recovered (deletes carry no document);
    /// the cache must flush everything.
    Cleared,
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn find_by_contest_and_slot(
        &self,
        contest_id: &str,
        slot_id: &str,
    ) -> AppResult<Vec<Question>>;
    /// Open the collection's change feed, mapped to cache invalidation events.
    async fn watch(&self) -> AppResult<BoxStream<'static, QuestionChangeEvent>>;
}

pub struct MongoQuestionRepository {
    collection: Collection<Question>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("questions");
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

        let slot_index = IndexModel::builder()
            .keys(doc! { "contest_id": 1, "slot_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("contest_slot".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(slot_index).await?;

        log::info!("Created indexes for questions collection");
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn find_by_contest_and_slot(
        &self,
        contest_id: &str,
        slot_id: &str,
    ) -> AppResult<Vec<Question>> {
        let questions = self
            .collection
            .find(doc! { "contest_id": contest_id, "slot_id": slot_id })
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }

    async fn watch(&self) -> AppResult<BoxStream<'static, QuestionChangeEvent>> {
        // ask for the full document on updates so those can evict a single key
        let options = ChangeStreamOptions::builder()
            .full_document(FullDocumentType::UpdateLookup)
            .build();

        let stream = self.collection.watch().with_options(options).await?;

        let mapped = stream.filter_map(|event| async move {
            let change = match event {
                Ok(change) => change,
                Err(err) => {
                    log::error!("question change stream error: {}", err);
                    return None;
                }
            };

            match change.operation_type {
                OperationType::Insert | OperationType::Replace | OperationType::Update => {
                    match change.full_document {
                        Some(question) => Some(QuestionChangeEvent::Changed {
                            contest_id: question.contest_id,
                            slot_id: question.slot_id,
                        }),
                        None => Some(QuestionChangeEvent::Cleared),
                    }
                }
                OperationType::Delete
                | OperationType::Drop
                | OperationType::DropDatabase
                | OperationType::Invalidate => Some(QuestionChangeEvent::Cleared),
                _ => None,
            }
        });

        Ok(mapped.boxed())
    }
}
