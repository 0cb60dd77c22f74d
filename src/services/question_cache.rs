use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::sync::RwLock;

use crate::{
    errors::AppResult,
    models::domain::Question,
    repositories::{QuestionChangeEvent, QuestionRepository},
};

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

struct CacheEntry {
    questions: Arc<Vec<Question>>,
    stored_at: Instant,
}

/// Read-through cache for per-(contest, slot) question sets. Entries expire
/// on read once their stored timestamp ages past the TTL, and the change-feed
/// watcher evicts them eagerly; a miss always falls through to the store, so
/// the cache is never a correctness dependency.
pub struct QuestionCache {
    repository: Arc<dyn QuestionRepository>,
    entries: RwLock<HashMap<(String, String), CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl QuestionCache {
    pub fn new(repository: Arc<dyn QuestionRepository>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            repository,
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub async fn get(&self, contest_id: &str, slot_id: &str) -> AppResult<Arc<Vec<Question>>> {
        let key = (contest_id.to_string(), slot_id.to_string());

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.stored_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&entry.questions));
                }
            }
        }

        // lock released across the store read; racing fillers just overwrite
        // each other with equally fresh data
        let questions = Arc::new(
            self.repository
                .find_by_contest_and_slot(contest_id, slot_id)
                .await?,
        );

        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                questions: Arc::clone(&questions),
                stored_at: Instant::now(),
            },
        );

        Ok(questions)
    }

    pub async fn invalidate(&self, contest_id: &str, slot_id: &str) {
        let key = (contest_id.to_string(), slot_id.to_string());
        let mut entries = self.entries.write().await;
        if entries.remove(&key).is_some() {
            log::info!("question cache invalidated for {}/{}", contest_id, slot_id);
        }
    }

    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        if !entries.is_empty() {
            log::info!("question cache flushed ({} entries)", entries.len());
            entries.clear();
        }
    }

    #[cfg(test)]
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Consume the question change feed and evict affected entries. Re-opens
    /// the feed if it ends or fails.
    pub fn spawn_invalidator(cache: Arc<QuestionCache>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match cache.repository.watch().await {
                    Ok(mut events) => {
                        while let Some(event) = events.next().await {
                            match event {
                                QuestionChangeEvent::Changed {
                                    contest_id,
                                    slot_id,
                                } => cache.invalidate(&contest_id, &slot_id).await,
                                QuestionChangeEvent::Cleared => cache.invalidate_all().await,
                            }
                        }
                        log::warn!("question change feed ended, re-subscribing");
                    }
                    Err(err) => {
                        log::error!("failed to open question change feed: {}", err);
                    }
                }
                tokio::time::sleep(RESUBSCRIBE_DELAY).await;
            }
        })
    }
}
