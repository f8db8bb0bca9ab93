use crate::config::ItemsConfig;
use crate::handlers;
use crate::services::database::{CLOSE_DEADLINE, CONNECT_DEADLINE};
use crate::services::{ItemStore, MongoConnection, MongoItemStore};
use axum::{
    body::Body,
    http::{Request, Response},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, request_timeout_middleware,
    security_headers_middleware, REQUEST_ID_HEADER,
};
use std::any::Any;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ItemStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }
}

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health_check))
        .route(
            "/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route("/items/:id", get(handlers::get_item))
        .route("/metrics", get(handlers::metrics_endpoint))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn_with_state(
            request_timeout,
            request_timeout_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    AppError::InternalError(anyhow::anyhow!("internal server error")).into_response()
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    connection: Option<MongoConnection>,
    shutdown_grace: Duration,
}

impl Application {
    /// Connect to MongoDB, ensure indexes and bind the listener.
    ///
    /// A connection failure is returned as-is; the caller is expected to
    /// treat it as fatal.
    pub async fn build(config: ItemsConfig) -> Result<Self, AppError> {
        let connection = MongoConnection::connect(
            &config.mongodb.uri,
            &config.mongodb.database,
            CONNECT_DEADLINE,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            e
        })?;

        if let Err(e) = connection.initialize_indexes().await {
            tracing::error!("Failed to initialize database indexes: {}", e);
            connection.close(CLOSE_DEADLINE).await;
            return Err(e);
        }

        let store: Arc<dyn ItemStore> = Arc::new(MongoItemStore::new(&connection));
        Self::with_store(config, store, Some(connection)).await
    }

    /// Bind the listener around an already-built store.
    ///
    /// `connection`, when given, is closed once the server has stopped.
    pub async fn with_store(
        config: ItemsConfig,
        store: Arc<dyn ItemStore>,
        connection: Option<MongoConnection>,
    ) -> Result<Self, AppError> {
        let router = build_router(AppState::new(store), config.server.request_timeout);

        // Port 0 picks a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router,
            connection,
            shutdown_grace: config.server.shutdown_grace,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connection(&self) -> Option<&MongoConnection> {
        self.connection.as_ref()
    }

    /// Serve until SIGINT/SIGTERM, then drain and close.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves.
    ///
    /// After that the listener stops accepting, in-flight requests get
    /// `shutdown_grace` to finish, and the store connection is closed once.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let Application {
            listener,
            router,
            connection,
            shutdown_grace,
            ..
        } = self;

        let stop = CancellationToken::new();
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(stop.clone().cancelled_owned())
            .into_future();
        let mut server = tokio::spawn(server);

        let outcome = tokio::select! {
            result = &mut server => Some(result),
            _ = shutdown => None,
        };

        let outcome = match outcome {
            Some(result) => flatten(result),
            None => {
                tracing::info!(
                    grace_ms = shutdown_grace.as_millis() as u64,
                    "Stopped accepting connections, draining in-flight requests"
                );
                stop.cancel();
                match tokio::time::timeout(shutdown_grace, &mut server).await {
                    Ok(result) => flatten(result),
                    Err(_) => {
                        tracing::warn!("Grace period elapsed, dropping remaining connections");
                        server.abort();
                        Ok(())
                    }
                }
            }
        };

        if let Err(e) = &outcome {
            tracing::error!("HTTP server error: {}", e);
        }

        if let Some(connection) = connection {
            connection.close(CLOSE_DEADLINE).await;
        }

        outcome
    }
}

fn flatten(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> std::io::Result<()> {
    match result {
        Ok(served) => served,
        Err(e) => Err(std::io::Error::other(format!("server task failed: {}", e))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
