//! In-process [`ItemStore`] for tests and local experiments.

use crate::models::{Item, ListQuery, SortField, SortOrder};
use crate::services::store::ItemStore;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use regex::RegexBuilder;
use service_core::error::AppError;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Keeps items in memory and mirrors MongoDB's list semantics: the same
/// escaped, case-insensitive prefix regex, binary string ordering and an
/// `_id` tie-break.
///
/// Counts every call so tests can assert that a request never reached the
/// store, and can be made slow or unreachable.
#[derive(Default)]
pub struct InMemoryItemStore {
    items: RwLock<Vec<Item>>,
    calls: AtomicUsize,
    unreachable: AtomicBool,
    latency: Option<Duration>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `latency` before doing anything.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail as if the server were gone.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, AtomicOrdering::SeqCst);
    }

    /// Number of store calls issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    async fn enter(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unreachable.load(AtomicOrdering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "server selection timeout: no available servers"
            )));
        }
        Ok(())
    }
}

fn compare(a: &Item, b: &Item, field: SortField) -> Ordering {
    let primary = match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<Item>, AppError> {
        self.enter().await?;

        let matcher = query
            .name_pattern()
            .map(|pattern| {
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))
            })
            .transpose()?;

        let items = self.items.read().await;
        let mut matched: Vec<Item> = items
            .iter()
            .filter(|item| matcher.as_ref().map_or(true, |re| re.is_match(&item.name)))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = compare(a, b, query.sort);
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(matched
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn find_one(&self, id: ObjectId) -> Result<Option<Item>, AppError> {
        self.enter().await?;
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id == Some(id)).cloned())
    }

    async fn insert_one(&self, item: &Item) -> Result<ObjectId, AppError> {
        self.enter().await?;
        let id = ObjectId::new();
        let mut stored = item.clone();
        stored.id = Some(id);
        self.items.write().await.push(stored);
        Ok(id)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.enter().await
    }
}
