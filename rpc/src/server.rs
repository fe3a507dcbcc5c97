//! Axum-based RPC server.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use orin_governance::GovernanceManager;
use orin_mappoint_index::{IndexRuntime, MapPointIndex};

use crate::error::RpcError;
use crate::handlers;

/// Shared state handed to every handler.
pub struct RpcContext {
    pub index: Arc<MapPointIndex>,
    pub index_runtime: Arc<IndexRuntime>,
    pub governance: Arc<GovernanceManager>,
}

/// Build the RPC router.
pub fn router(ctx: Arc<RpcContext>) -> Router {
    Router::new()
        .route("/mappoint/:txid", get(handlers::get_map_point))
        .route("/mappoints", get(handlers::list_map_points))
        .route("/addresspoints", post(handlers::get_address_points))
        .route(
            "/rebuildmappointindex",
            post(handlers::rebuild_map_point_index),
        )
        .route("/governance/info", get(handlers::governance_info))
        .with_state(ctx)
}

pub struct RpcServer {
    pub port: u16,
}

impl RpcServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// Bind and serve until the task is cancelled.
    pub async fn start(&self, ctx: Arc<RpcContext>) -> Result<(), RpcError> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Internal(format!("bind {addr}: {e}")))?;
        tracing::info!(addr = %addr, "rpc server listening");
        axum::serve(listener, router(ctx))
            .await
            .map_err(|e| RpcError::Internal(e.to_string()))
    }
}
