use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::config::PrecedencePolicy;
use crate::http::server::AppState;
use crate::routing::ProgrammedRoute;
use crate::upstream::BackendRef;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub generation: u64,
    pub routes: usize,
    pub backends: usize,
    pub precedence: PrecedencePolicy,
}

/// The programmed route set, as seen by readiness checks.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoutesStatus {
    pub generation: u64,
    pub routes: Vec<ProgrammedRoute>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendStatus {
    pub backend: BackendRef,
    pub address: String,
    pub url: String,
    pub active_requests: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let snapshot = state.shared.load();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        generation: snapshot.routes.generation(),
        routes: snapshot.routes.routes().len(),
        backends: snapshot.backends.len(),
        precedence: snapshot.config.matching.precedence,
    })
}

pub async fn get_routes(State(state): State<AppState>) -> Json<RoutesStatus> {
    let snapshot = state.shared.load();
    Json(RoutesStatus {
        generation: snapshot.routes.generation(),
        routes: snapshot.routes.routes().to_vec(),
    })
}

pub async fn get_backends(State(state): State<AppState>) -> Json<Vec<BackendStatus>> {
    let snapshot = state.shared.load();
    let statuses = snapshot
        .backends
        .all_backends()
        .map(|b| BackendStatus {
            backend: b.reference.clone(),
            address: b.addr.to_string(),
            url: b.base_url.to_string(),
            active_requests: b.active_requests(),
        })
        .collect();

    Json(statuses)
}
