//! RPC request handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use orin_mappoint_index::db::{MapPointInfo, TransferInfo};
use orin_mappoint_index::payload;
use orin_types::{Address, Hash256};

use crate::error::RpcError;
use crate::server::RpcContext;

// ── Map points ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MapPointResponse {
    pub origin_txid: String,
    pub height: u32,
    pub origin_owner: String,
    pub current_owner: String,
    pub encoded_lat: i64,
    pub encoded_lon: i64,
    pub lat: f64,
    pub lon: f64,
    pub transfers: Vec<TransferResponse>,
}

#[derive(Serialize)]
pub struct TransferResponse {
    pub transfer_txid: String,
    pub height: u32,
    pub new_owner: String,
}

fn transfer_response(info: TransferInfo) -> TransferResponse {
    TransferResponse {
        transfer_txid: info.transfer_txid.to_string(),
        height: info.height,
        new_owner: info.new_owner.as_str().to_owned(),
    }
}

fn point_response(info: MapPointInfo) -> MapPointResponse {
    MapPointResponse {
        origin_txid: info.origin_txid.to_string(),
        height: info.height,
        origin_owner: info.origin_owner.as_str().to_owned(),
        current_owner: info.current_owner.as_str().to_owned(),
        encoded_lat: info.encoded_lat,
        encoded_lon: info.encoded_lon,
        lat: payload::decode_coordinate(info.encoded_lat),
        lon: payload::decode_coordinate(info.encoded_lon),
        transfers: info.transfers.into_iter().map(transfer_response).collect(),
    }
}

/// `getmappoint <txid>`
pub async fn get_map_point(
    State(ctx): State<Arc<RpcContext>>,
    Path(txid): Path<String>,
) -> Result<Json<MapPointResponse>, RpcError> {
    let txid = Hash256::from_hex(&txid)
        .ok_or_else(|| RpcError::InvalidParameter(format!("bad txid {txid}")))?;
    let info = ctx
        .index
        .get_point(&txid)
        .map_err(|e| RpcError::Internal(e.to_string()))?
        .ok_or_else(|| RpcError::NotFound(format!("no map point for {txid}")))?;
    Ok(Json(point_response(info)))
}

#[derive(Deserialize)]
pub struct HeightRangeQuery {
    #[serde(default)]
    pub from: u32,
    pub to: Option<u32>,
}

/// `listmappoints [from to]`
pub async fn list_map_points(
    State(ctx): State<Arc<RpcContext>>,
    Query(range): Query<HeightRangeQuery>,
) -> Result<Json<Vec<MapPointResponse>>, RpcError> {
    let points = ctx
        .index
        .points_in_height_range(range.from, range.to.unwrap_or(u32::MAX))
        .map_err(|e| RpcError::Internal(e.to_string()))?;
    Ok(Json(points.into_iter().map(point_response).collect()))
}

#[derive(Deserialize)]
pub struct AddressPointsRequest {
    pub addresses: Vec<String>,
    #[serde(default)]
    pub from: u32,
    pub to: Option<u32>,
}

/// `getaddresspoints <addresses> [from to]`
pub async fn get_address_points(
    State(ctx): State<Arc<RpcContext>>,
    Json(request): Json<AddressPointsRequest>,
) -> Result<Json<Vec<MapPointResponse>>, RpcError> {
    if request.addresses.is_empty() {
        return Err(RpcError::InvalidParameter("no addresses given".into()));
    }
    let mut owners = Vec::with_capacity(request.addresses.len());
    for addr in &request.addresses {
        let address = Address::new(addr.clone());
        if address.key_hash().is_none() {
            return Err(RpcError::InvalidAddress(addr.clone()));
        }
        owners.push(address);
    }
    let points = ctx
        .index
        .points_for_owner(&owners, request.from, request.to.unwrap_or(u32::MAX))
        .map_err(|e| RpcError::Internal(e.to_string()))?;
    Ok(Json(points.into_iter().map(point_response).collect()))
}

#[derive(Serialize)]
pub struct RebuildResponse {
    pub started: bool,
}

/// `rebuildmappointindex`
pub async fn rebuild_map_point_index(
    State(ctx): State<Arc<RpcContext>>,
) -> Result<Json<RebuildResponse>, RpcError> {
    let runtime = Arc::clone(&ctx.index_runtime);
    // Wiping and replaying is heavy; keep it off the async workers.
    let started = tokio::task::spawn_blocking(move || runtime.rebuild())
        .await
        .map_err(|e| RpcError::Internal(e.to_string()))?;
    Ok(Json(RebuildResponse { started }))
}

// ── Governance ───────────────────────────────────────────────────────────

/// `governanceinfo`
pub async fn governance_info(State(ctx): State<Arc<RpcContext>>) -> Json<serde_json::Value> {
    Json(ctx.governance.to_json())
}
