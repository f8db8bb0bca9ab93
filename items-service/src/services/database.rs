//! MongoDB connection bootstrap and teardown.

use crate::models::{item::ITEMS_COLLECTION, Item};
use crate::SERVICE_NAME;
use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions, ReadPreference, SelectionCriteria},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use std::time::{Duration, Instant};

/// Overall budget for [`MongoConnection::connect`].
pub const CONNECT_DEADLINE: Duration = Duration::from_secs(10);
/// Budget for the liveness ping inside the connect budget.
pub const CONNECT_PING_DEADLINE: Duration = Duration::from_secs(3);
/// Budget for closing the client at shutdown.
pub const CLOSE_DEADLINE: Duration = Duration::from_secs(5);

/// A live client bound to one logical database.
///
/// Built once at startup and handed to the store by value; nothing else
/// reconfigures or closes it until [`MongoConnection::close`].
#[derive(Clone)]
pub struct MongoConnection {
    client: MongoClient,
    db: Database,
}

impl MongoConnection {
    /// Open a client and ping the primary, all within `deadline`.
    ///
    /// A client that was opened but failed its ping is shut down before the
    /// error is returned. Nothing is retried.
    pub async fn connect(uri: &str, database: &str, deadline: Duration) -> Result<Self, AppError> {
        let started = Instant::now();
        tracing::info!(database = %database, "Connecting to MongoDB");

        let client = tokio::time::timeout(deadline, open_client(uri))
            .await
            .map_err(|_| {
                AppError::ConnectionError(anyhow::anyhow!(
                    "opening MongoDB client timed out after {}ms",
                    deadline.as_millis()
                ))
            })?
            .map_err(|e| {
                tracing::error!("Failed to open MongoDB client: {}", e);
                AppError::ConnectionError(anyhow::Error::new(e))
            })?;

        let ping_deadline = CONNECT_PING_DEADLINE.min(deadline.saturating_sub(started.elapsed()));
        let ping = match tokio::time::timeout(ping_deadline, ping_primary(&client)).await {
            Ok(result) => result.map_err(anyhow::Error::new),
            Err(_) => Err(anyhow::anyhow!(
                "ping timed out after {}ms",
                ping_deadline.as_millis()
            )),
        };

        if let Err(e) = ping {
            tracing::error!("MongoDB liveness check failed: {}", e);
            // Best effort: the ping error is what the caller needs to see.
            let _ = tokio::time::timeout(CLOSE_DEADLINE, client.shutdown()).await;
            return Err(AppError::ConnectionError(e));
        }

        let db = client.database(database);
        tracing::info!(
            database = %database,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Successfully connected to MongoDB database"
        );
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for items-service");

        let items = self.items();

        let name_index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().name("name_idx".to_string()).build())
            .build();

        items.create_index(name_index, None).await.map_err(|e| {
            tracing::error!("Failed to create name index on items collection: {}", e);
            AppError::from(e)
        })?;

        // Descending: the default listing is newest first
        let created_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_idx".to_string())
                    .build(),
            )
            .build();

        items.create_index(created_index, None).await.map_err(|e| {
            tracing::error!("Failed to create created_at index on items collection: {}", e);
            AppError::from(e)
        })?;

        tracing::info!("Created indexes on items.name and items.created_at");
        Ok(())
    }

    pub fn items(&self) -> Collection<Item> {
        self.db.collection(ITEMS_COLLECTION)
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Shut the client down. Failures and timeouts are logged, never returned.
    pub async fn close(self, deadline: Duration) {
        tracing::info!("Closing MongoDB connection");
        match tokio::time::timeout(deadline, self.client.shutdown()).await {
            Ok(()) => tracing::info!("MongoDB connection closed"),
            Err(_) => tracing::warn!(
                deadline_ms = deadline.as_millis() as u64,
                "MongoDB connection did not close before the deadline"
            ),
        }
    }
}

async fn open_client(uri: &str) -> mongodb::error::Result<MongoClient> {
    let mut options = ClientOptions::parse(uri).await?;
    options.app_name = Some(SERVICE_NAME.to_string());
    MongoClient::with_options(options)
}

/// `{ping: 1}` against `admin`, routed to the primary.
pub(crate) async fn ping_primary(client: &MongoClient) -> mongodb::error::Result<()> {
    client
        .database("admin")
        .run_command(
            doc! { "ping": 1 },
            SelectionCriteria::ReadPreference(ReadPreference::Primary),
        )
        .await?;
    Ok(())
}
