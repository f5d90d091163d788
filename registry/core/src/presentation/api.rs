// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # HTTP API
//!
//! Axum router for the public agent directory and the admin surface.
//!
//! | Route | Access |
//! |-------|--------|
//! | `GET /health` | public |
//! | `GET /agents`, `GET /agents/{reference}` | public |
//! | `POST /agents`, `DELETE /agents/{id}` | any valid key (delete: owner or admin) |
//! | `/federated-registries/**` | admin |
//! | `POST /tokens`, `DELETE /tokens/{id}` | admin |
//!
//! Errors are returned as `{"error": "<message>"}`.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::{
    AdminError, AgentCatalogService, AgentProxyService, AuthError, AuthService, CatalogError,
    FederatedSearchService, NewPeer, PeerPatch, Principal, ProxyError, RegistryAdminService,
    SearchError,
};
use crate::domain::agent::{Agent, AgentDraft, AgentRef};
use crate::domain::api_key::KeyScope;
use crate::domain::registry::{RegistryId, RegistrySummary};
use crate::domain::search::{SearchQuery, SearchResultSet, DEFAULT_PAGE_LIMIT};
use crate::domain::validation::ValidationError;
use crate::infrastructure::federation_client::API_KEY_HEADER;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl ApiError {
    fn internal(err: impl std::fmt::Display) -> Self {
        error!(error = %err, "Request failed");
        ApiError::Internal("internal server error".to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidQuery(e) => e.into(),
            SearchError::LocalIndex(e) => {
                error!(error = %e, "Search unavailable");
                ApiError::ServiceUnavailable("search is temporarily unavailable".to_string())
            }
            SearchError::Repository(e) => ApiError::internal(e),
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::NotFound(_) => ApiError::NotFound("agent not found".to_string()),
            ProxyError::Repository(e) => ApiError::internal(e),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Validation(e) => e.into(),
            AdminError::NotFound(id) => {
                ApiError::NotFound(format!("federated registry {} not found", id))
            }
            AdminError::Repository(e) => ApiError::internal(e),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(e) => e.into(),
            CatalogError::NotFound(_) => ApiError::NotFound("agent not found".to_string()),
            CatalogError::Forbidden(_) => ApiError::Forbidden(err.to_string()),
            CatalogError::Repository(e) => ApiError::internal(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingKey | AuthError::InvalidKey => ApiError::Unauthorized(err.to_string()),
            AuthError::Forbidden => ApiError::Forbidden(err.to_string()),
            AuthError::Repository(e) => ApiError::internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<dyn FederatedSearchService>,
    pub proxy: Arc<dyn AgentProxyService>,
    pub admin: Arc<dyn RegistryAdminService>,
    pub catalog: Arc<dyn AgentCatalogService>,
    pub auth: Arc<dyn AuthService>,
    pub node_name: String,
    pub start_time: Instant,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/agents", get(list_agents_handler).post(create_agent_handler))
        .route(
            "/agents/{reference}",
            get(get_agent_handler).delete(delete_agent_handler),
        )
        .route(
            "/federated-registries",
            get(list_registries_handler).post(add_registry_handler),
        )
        .route(
            "/federated-registries/{id}",
            get(get_registry_handler)
                .patch(update_registry_handler)
                .delete(remove_registry_handler),
        )
        .route("/federated-registries/{id}/probe", post(probe_registry_handler))
        .route("/tokens", post(issue_token_handler))
        .route("/tokens/{id}", delete(revoke_token_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let secret = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    Ok(state.auth.authenticate(secret).await?)
}

async fn authenticate_admin(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let principal = authenticate(state, headers).await?;
    principal.require_admin()?;
    Ok(principal)
}

// ============================================================================
// Payloads
// ============================================================================

/// Agent as returned to clients: the record plus its compound reference.
/// Team members are also given as references resolvable on this node.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentView {
    pub reference: AgentRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_refs: Vec<AgentRef>,
    #[serde(flatten)]
    pub agent: Agent,
}

impl From<Agent> for AgentView {
    fn from(agent: Agent) -> Self {
        Self {
            reference: agent.reference(),
            member_refs: agent.member_refs(),
            agent,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<AgentView>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub tags: Vec<String>,
}

impl From<SearchResultSet> for SearchResponse {
    fn from(set: SearchResultSet) -> Self {
        Self {
            items: set.items.into_iter().map(AgentView::from).collect(),
            total: set.total,
            offset: set.offset,
            limit: set.limit,
            search: set.search,
            tags: set.tags,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAgentsParams {
    pub search: Option<String>,
    /// Comma-separated
    pub tags: Option<String>,
    pub is_team: Option<bool>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub include_federated: Option<bool>,
}

impl From<ListAgentsParams> for SearchQuery {
    fn from(params: ListAgentsParams) -> Self {
        let tags: Vec<String> = params
            .tags
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        SearchQuery {
            search: params.search,
            tags,
            is_team: params.is_team,
            offset: params.offset.unwrap_or(0),
            limit: params.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            include_federated: params.include_federated.unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub name: String,
    pub owner: String,
    #[serde(default = "default_scope")]
    pub scope: KeyScope,
}

fn default_scope() -> KeyScope {
    KeyScope::Read
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "name": state.node_name,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn list_agents_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListAgentsParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;
    let result = state.search.search(SearchQuery::from(params)).await?;
    Ok(Json(SearchResponse::from(result)))
}

async fn get_agent_handler(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<Json<AgentView>, ApiError> {
    let reference: AgentRef = reference.parse()?;
    let agent = state.proxy.get_agent(reference).await?;
    Ok(Json(AgentView::from(agent)))
}

async fn create_agent_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<AgentDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<AgentView>), ApiError> {
    let principal = authenticate(&state, &headers).await?;
    let Json(draft) = payload?;
    let agent = state.catalog.register_agent(&principal, draft).await?;
    Ok((StatusCode::CREATED, Json(AgentView::from(agent))))
}

async fn delete_agent_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<StatusCode, ApiError> {
    let principal = authenticate(&state, &headers).await?;
    let id = match reference.parse::<AgentRef>()? {
        AgentRef::Local(id) => id,
        AgentRef::Federated { .. } => {
            return Err(ApiError::BadRequest(
                "federated agents can only be deleted on their own registry".to_string(),
            ))
        }
    };
    state.catalog.delete_agent(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_registry_id(raw: &str) -> Result<RegistryId, ApiError> {
    RegistryId::from_string(raw)
        .map_err(|_| ApiError::BadRequest(format!("invalid registry id '{}'", raw)))
}

async fn list_registries_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<RegistrySummary>>, ApiError> {
    authenticate_admin(&state, &headers).await?;
    let peers = state.admin.list_peers().await?;
    Ok(Json(peers.iter().map(RegistrySummary::from).collect()))
}

async fn add_registry_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<NewPeer>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistrySummary>), ApiError> {
    authenticate_admin(&state, &headers).await?;
    let Json(peer) = payload?;
    let registry = state.admin.add_peer(peer).await?;
    Ok((StatusCode::CREATED, Json(registry.summary())))
}

async fn get_registry_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<RegistrySummary>, ApiError> {
    authenticate_admin(&state, &headers).await?;
    let registry = state.admin.get_peer(parse_registry_id(&id)?).await?;
    Ok(Json(registry.summary()))
}

async fn update_registry_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<PeerPatch>, JsonRejection>,
) -> Result<Json<RegistrySummary>, ApiError> {
    authenticate_admin(&state, &headers).await?;
    let id = parse_registry_id(&id)?;
    let Json(patch) = payload?;
    let registry = state.admin.update_peer(id, patch).await?;
    Ok(Json(registry.summary()))
}

async fn probe_registry_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<RegistrySummary>, ApiError> {
    authenticate_admin(&state, &headers).await?;
    let registry = state.admin.probe_peer(parse_registry_id(&id)?).await?;
    Ok(Json(registry.summary()))
}

async fn remove_registry_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authenticate_admin(&state, &headers).await?;
    state.admin.remove_peer(parse_registry_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn issue_token_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<IssueTokenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<crate::application::IssuedKey>), ApiError> {
    authenticate_admin(&state, &headers).await?;
    let Json(request) = payload?;
    if request.name.trim().is_empty() || request.owner.trim().is_empty() {
        return Err(ApiError::BadRequest("name and owner are required".to_string()));
    }
    let issued = state
        .auth
        .issue_key(request.name.trim(), request.owner.trim(), request.scope)
        .await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn revoke_token_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authenticate_admin(&state, &headers).await?;
    let id = uuid::Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("invalid token id '{}'", id)))?;
    if !state.auth.revoke_key(id).await? {
        return Err(ApiError::NotFound("token not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        StandardAgentCatalogService, StandardAgentProxyService, StandardAuthService,
        StandardFederatedSearchService, StandardRegistryAdminService,
    };
    use crate::domain::node_config::FederationConfig;
    use crate::infrastructure::repositories::{
        InMemoryAgentRepository, InMemoryApiKeyRepository, InMemoryFederatedRegistryRepository,
    };
    use crate::infrastructure::search::InMemorySearchIndex;
    use crate::infrastructure::HttpFederationClient;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    const ADMIN_KEY: &str = "test-admin-secret";

    async fn test_app() -> Router {
        let config = FederationConfig {
            peer_timeout_ms: 200,
            probe_timeout_ms: 200,
            ..Default::default()
        };
        let agents = Arc::new(InMemoryAgentRepository::new());
        let registries = Arc::new(InMemoryFederatedRegistryRepository::new());
        let index = Arc::new(InMemorySearchIndex::new());
        let federation = Arc::new(
            HttpFederationClient::new(Duration::from_millis(200), Duration::from_millis(200)).unwrap(),
        );

        let auth = StandardAuthService::new(Arc::new(InMemoryApiKeyRepository::new()));
        auth.install_bootstrap_key(ADMIN_KEY).await.unwrap();

        let state = AppState {
            search: Arc::new(StandardFederatedSearchService::new(
                agents.clone(),
                registries.clone(),
                index.clone(),
                federation.clone(),
                &config,
            )),
            proxy: Arc::new(StandardAgentProxyService::new(
                agents.clone(),
                registries.clone(),
                federation.clone(),
                &config,
            )),
            admin: Arc::new(StandardRegistryAdminService::new(registries, federation)),
            catalog: Arc::new(StandardAgentCatalogService::new(agents, index)),
            auth: Arc::new(auth),
            node_name: "test-node".to_string(),
            start_time: Instant::now(),
        };
        app(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, key: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["name"], "test-node");
    }

    #[tokio::test]
    async fn test_register_then_search_and_fetch() {
        let app = test_app().await;
        let draft = serde_json::json!({
            "name": "Translator",
            "description": "Translates documents",
            "tags": ["nlp", "language"]
        });

        let (status, created) = send(&app, json_request("POST", "/agents", Some(ADMIN_KEY), draft)).await;
        assert_eq!(status, StatusCode::CREATED);
        let reference = created["reference"].as_str().unwrap().to_string();
        assert_eq!(created["provenance"]["type"], "local");

        let (status, page) = send(&app, get("/agents?search=translat&tags=NLP,%20language")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
        assert_eq!(page["items"][0]["reference"], reference.as_str());

        let (status, fetched) = send(&app, get(&format!("/agents/{}", reference))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Translator");
    }

    #[tokio::test]
    async fn test_invalid_inputs_are_bad_requests() {
        let app = test_app().await;

        let (status, body) = send(&app, get("/agents?limit=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = send(&app, get("/agents?limit=101")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("100"));

        let (status, _) = send(&app, get("/agents?offset=-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, get("/agents/not-a-reference")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_federated_team_view_exposes_member_references() {
        use crate::domain::agent::{AgentId, Provenance};

        let member = AgentId::new();
        let registry_id = RegistryId::new();
        let team = Agent::register(
            AgentDraft {
                name: "Crew".to_string(),
                description: "A team".to_string(),
                is_team: true,
                members: vec![member],
                ..Default::default()
            },
            "owner-1",
        )
        .with_provenance(Provenance::Federated { registry_id });

        let json = serde_json::to_value(AgentView::from(team)).unwrap();
        assert_eq!(json["member_refs"][0], format!("fed:{}:{}", registry_id, member));
    }

    #[tokio::test]
    async fn test_unknown_references_are_plain_not_found() {
        let app = test_app().await;

        let (status, body) = send(&app, get(&format!("/agents/{}", uuid::Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "agent not found");

        let federated = format!("fed:{}:{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
        let (status, body) = send(&app, get(&format!("/agents/{}", federated))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "agent not found");
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin_key() {
        let app = test_app().await;

        let (status, _) = send(&app, get("/federated-registries")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, issued) = send(
            &app,
            json_request(
                "POST",
                "/tokens",
                Some(ADMIN_KEY),
                serde_json::json!({"name": "reader", "owner": "team-a"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(issued.get("key_hash").is_none());
        let read_key = issued["secret"].as_str().unwrap().to_string();

        let request = Request::builder()
            .uri("/federated-registries")
            .header(API_KEY_HEADER, read_key.as_str())
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/tokens/{}", issued["id"].as_str().unwrap()))
            .header(API_KEY_HEADER, ADMIN_KEY)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_add_unreachable_peer_and_remove() {
        let app = test_app().await;
        let peer = serde_json::json!({
            "name": "Offline",
            "url": "http://127.0.0.1:9",
            "api_key": "peer-secret"
        });

        let (status, added) =
            send(&app, json_request("POST", "/federated-registries", Some(ADMIN_KEY), peer.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(added["status"], "unreachable");
        assert_eq!(added["has_api_key"], true);
        assert!(added.get("api_key").is_none());

        let (status, _) =
            send(&app, json_request("POST", "/federated-registries", Some(ADMIN_KEY), peer)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Search still answers with the unreachable peer configured.
        let (status, page) = send(&app, get("/agents")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 0);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/federated-registries/{}", added["id"].as_str().unwrap()))
            .header(API_KEY_HEADER, ADMIN_KEY)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
