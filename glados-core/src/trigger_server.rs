//! Local HTTP endpoint for out-of-band triggers: `POST /async/{plugin}` with
//! a JSON body is handed to `AsyncDispatchGateway::dispatch_async`.

use std::net::SocketAddr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_server::{Handle, Server};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::dispatch::AsyncDispatchGateway;
use crate::Error;

/// A running trigger server. Dropping it leaves the server running; call
/// `shutdown` to stop it.
pub struct TriggerServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TriggerServer {
    /// The bound address; useful when started on port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            error!("Trigger server task failed: {}", e);
        }
    }
}

pub fn router(gateway: AsyncDispatchGateway) -> Router {
    Router::new()
        .route("/async", get(list_plugins))
        .route("/async/{plugin}", post(trigger_plugin))
        .with_state(gateway)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Binds 127.0.0.1:`port` and serves until `shutdown` is called.
pub async fn start_trigger_server(
    port: u16,
    gateway: AsyncDispatchGateway,
) -> Result<TriggerServer, Error> {
    let app = router(gateway);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = Handle::new();
    let handle_clone = handle.clone();
    tokio::spawn(async move {
        let _ = shutdown_rx.await;
        handle_clone.graceful_shutdown(None);
    });

    let server = Server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service());
    let task = tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Trigger server error: {}", e);
        }
        info!("Trigger server shut down.");
    });

    let Some(bound) = handle.listening().await else {
        task.abort();
        return Err(Error::Platform(format!("trigger server could not bind {addr}")));
    };
    info!("Async trigger server listening on http://{}", bound);

    Ok(TriggerServer {
        addr: bound,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

async fn list_plugins(State(gateway): State<AsyncDispatchGateway>) -> Json<Value> {
    Json(json!({ "plugins": gateway.plugin_names().await }))
}

async fn trigger_plugin(
    State(gateway): State<AsyncDispatchGateway>,
    Path(plugin): Path<String>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    match gateway.dispatch_async(&plugin, payload).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(json!({ "ok": true, "plugin": plugin })),
        ),
        Err(e @ Error::UnknownAsyncTarget(_)) => {
            warn!("Trigger for unknown async plugin '{}'", plugin);
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false, "error": e.to_string() })),
        ),
    }
}
