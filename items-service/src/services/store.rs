//! The capability set the handlers need from a backing store.

use crate::models::{Item, ListQuery};
use crate::services::database::{ping_primary, MongoConnection};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    options::FindOptions,
    Client as MongoClient, Collection,
};
use service_core::error::AppError;
use std::time::Duration;

/// Server-side execution cap for list queries (`maxTimeMS`).
pub const QUERY_MAX_TIME: Duration = Duration::from_secs(2);

/// Narrow view of the item collection.
///
/// Implementations hold no per-request state and must be safe to share
/// across concurrent handlers. Deadlines are the caller's concern.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Items matching `query`, sorted and paginated. Empty is not an error.
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<Item>, AppError>;

    async fn find_one(&self, id: ObjectId) -> Result<Option<Item>, AppError>;

    /// Persist `item` and return the identifier the store assigned.
    async fn insert_one(&self, item: &Item) -> Result<ObjectId, AppError>;

    /// Liveness round-trip.
    async fn ping(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoItemStore {
    client: MongoClient,
    items: Collection<Item>,
}

impl MongoItemStore {
    pub fn new(connection: &MongoConnection) -> Self {
        Self {
            client: connection.client().clone(),
            items: connection.items(),
        }
    }
}

#[async_trait]
impl ItemStore for MongoItemStore {
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<Item>, AppError> {
        let find_options = FindOptions::builder()
            .sort(query.sort_document())
            .skip(query.skip)
            .limit(query.limit)
            .max_time(QUERY_MAX_TIME)
            .allow_disk_use(false)
            .build();

        let cursor = self
            .items
            .find(query.filter(), find_options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list items: {}", e);
                AppError::from(e)
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect items: {}", e);
            AppError::from(e)
        })
    }

    async fn find_one(&self, id: ObjectId) -> Result<Option<Item>, AppError> {
        self.items
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!(item_id = %id, "Failed to find item: {}", e);
                AppError::from(e)
            })
    }

    async fn insert_one(&self, item: &Item) -> Result<ObjectId, AppError> {
        let result = self.items.insert_one(item, None).await.map_err(|e| {
            tracing::error!("Failed to insert item: {}", e);
            AppError::from(e)
        })?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!(
                "store assigned a non-ObjectId identifier: {}",
                result.inserted_id
            ))
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        ping_primary(&self.client).await.map_err(|e| {
            tracing::error!("MongoDB health check failed: {}", e);
            AppError::from(e)
        })
    }
}
