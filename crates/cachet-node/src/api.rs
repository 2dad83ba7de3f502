//! HTTP API server for the Cachet node.
//!
//! Provides REST endpoints for node status, identity generation, DID
//! resolution, credential issuance and verification, and credential history.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

use cachet_core::{Did, ErrorKind};
use cachet_credentials::{
    CredentialError, CredentialTemplate, HistoryEntry, HistoryFilter, VerifiableCredential,
    VerificationResult,
};
use cachet_identity::{DidDocument, GenerateParams, IdentityError};

use crate::state::NodeState;

// --- Request / response types ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_secs: u64,
    pub identities: usize,
    pub templates: usize,
    pub history_entries: usize,
    pub history_capacity: usize,
    pub methods: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplatesResponse {
    pub templates: Vec<CredentialTemplate>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct GenerateIdentityRequest {
    /// `key` or `web`.
    pub method: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub did: String,
    pub method: String,
    pub document: DidDocument,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub did: String,
    pub method: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentitiesResponse {
    pub identities: Vec<IdentitySummary>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssueCredentialRequest {
    pub template: String,
    /// Must be an identity held by this node.
    pub issuer_did: String,
    pub subject_did: String,
    #[serde(default)]
    pub claims: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyCredentialRequest {
    pub credential: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> ApiError {
    let error = message.into();
    tracing::warn!(status = status.as_u16(), %kind, %error, "request failed");
    (status, Json(ErrorResponse { error, kind }))
}

/// Map an engine error onto an HTTP status by its taxonomy bucket.
fn credential_error(err: CredentialError) -> ApiError {
    let kind = err.kind();
    let status = match &err {
        CredentialError::UnknownTemplate(_)
        | CredentialError::CredentialNotFound(_)
        | CredentialError::Identity(IdentityError::NotFound(_)) => StatusCode::NOT_FOUND,
        CredentialError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => match kind {
            ErrorKind::Input | ErrorKind::Policy => StatusCode::BAD_REQUEST,
            ErrorKind::Resolution => StatusCode::BAD_GATEWAY,
            ErrorKind::Cryptographic => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };
    api_error(status, kind, err.to_string())
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_status(State(state): State<Arc<NodeState>>) -> Json<StatusResponse> {
    let engine = &state.engine;
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        identities: state.keystore.count(),
        templates: engine.templates().count(),
        history_entries: engine.history().len(),
        history_capacity: engine.history().capacity(),
        methods: engine
            .context()
            .methods
            .methods()
            .iter()
            .map(|m| m.to_string())
            .collect(),
    })
}

async fn handle_templates(State(state): State<Arc<NodeState>>) -> Json<TemplatesResponse> {
    let templates = state.engine.templates().list();
    let count = templates.len();
    Json(TemplatesResponse { templates, count })
}

async fn handle_generate_identity(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<GenerateIdentityRequest>,
) -> Result<(StatusCode, Json<IdentityResponse>), ApiError> {
    let params = GenerateParams {
        domain: req.domain,
        path: req.path,
        id: req.id,
    };
    let generated = state
        .engine
        .generate_identity(&req.method, &params)
        .map_err(credential_error)?;
    let identity = state
        .keystore
        .insert(generated.into())
        .map_err(|e| credential_error(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(IdentityResponse {
            did: identity.did.to_string(),
            method: identity.did.method_name().to_string(),
            document: identity.document.clone(),
        }),
    ))
}

async fn handle_list_identities(State(state): State<Arc<NodeState>>) -> Json<IdentitiesResponse> {
    let identities: Vec<IdentitySummary> = state
        .keystore
        .list_dids()
        .into_iter()
        .map(|did| IdentitySummary {
            method: did.method_name().to_string(),
            did: did.to_string(),
        })
        .collect();
    let count = identities.len();
    Json(IdentitiesResponse { identities, count })
}

async fn handle_resolve_did(
    State(state): State<Arc<NodeState>>,
    Path(did): Path<String>,
) -> Result<Json<DidDocument>, ApiError> {
    state
        .engine
        .resolve(&did)
        .await
        .map(Json)
        .map_err(credential_error)
}

async fn handle_issue_credential(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<IssueCredentialRequest>,
) -> Result<Json<VerifiableCredential>, ApiError> {
    let issuer = Did::new(&req.issuer_did)
        .map_err(|e| credential_error(CredentialError::InvalidIssuerDid(e.to_string())))?;
    let identity = state.keystore.get(&issuer).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            ErrorKind::Input,
            format!("issuer {} is not held by this node", issuer),
        )
    })?;

    state
        .engine
        .issue_as(&req.template, &identity, &req.subject_did, &req.claims)
        .map(Json)
        .map_err(credential_error)
}

async fn handle_verify_credential(
    State(state): State<Arc<NodeState>>,
    Json(req): Json<VerifyCredentialRequest>,
) -> Result<Json<VerificationResult>, ApiError> {
    let bytes = serde_json::to_vec(&req.credential)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, ErrorKind::Input, e.to_string()))?;
    Ok(Json(state.engine.verify(&bytes).await))
}

async fn handle_history(
    State(state): State<Arc<NodeState>>,
    Query(filter): Query<HistoryFilter>,
) -> Json<HistoryResponse> {
    let entries = state.engine.history().list(&filter);
    let count = entries.len();
    Json(HistoryResponse { entries, count })
}

async fn handle_forget(
    State(state): State<Arc<NodeState>>,
    Path(id): Path<String>,
) -> Result<Json<HistoryEntry>, ApiError> {
    state
        .engine
        .history()
        .remove(&id)
        .map(Json)
        .map_err(credential_error)
}

// --- Server ---

pub fn build_router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handle_health))
        .route("/api/v1/status", get(handle_status))
        .route("/api/v1/templates", get(handle_templates))
        .route(
            "/api/v1/identities",
            get(handle_list_identities).post(handle_generate_identity),
        )
        .route("/api/v1/dids/{did}", get(handle_resolve_did))
        .route("/api/v1/credentials/issue", post(handle_issue_credential))
        .route("/api/v1/credentials/verify", post(handle_verify_credential))
        .route("/api/v1/history", get(handle_history))
        .route("/api/v1/history/{id}", delete(handle_forget))
        .with_state(state)
}

pub async fn start_api_server(
    listen_addr: SocketAddr,
    state: Arc<NodeState>,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}
