//! Outlay Web Server
//!
//! Axum-based REST API for the Outlay expense tracker.
//!
//! Security features:
//! - Bearer-token authentication backed by an in-memory token cache
//! - Per-IP rate limiting via tower_governor (trusted proxies honoured for X-Forwarded-For)
//! - Restrictive CORS policy
//! - Sanitized error responses

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::KeyExtractor, GovernorError, GovernorLayer,
};
use tracing::{debug, error, info, warn};

use outlay_core::db::Database;
use outlay_core::models::User;

mod handlers;
pub mod sessions;

use sessions::{SessionStore, DEFAULT_TOKEN_TTL};

/// Default requests allowed per client IP per minute
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// How often idle rate-limit entries are dropped
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Maximum accepted JSON body size (10 KB)
pub const MAX_BODY_SIZE: usize = 1024 * 10;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Trusted proxies whose X-Forwarded-For headers are trusted
    /// When a request comes from a trusted proxy, the client IP is extracted from X-Forwarded-For
    pub trusted_proxies: Vec<ipnet::IpNet>,
    /// How long an issued token stays valid
    pub token_ttl: Duration,
    /// Requests per minute per client IP (0 disables limiting)
    pub rate_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            trusted_proxies: vec![],
            token_ttl: DEFAULT_TOKEN_TTL,
            rate_limit: DEFAULT_RATE_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Build configuration from `OUTLAY_*` environment variables
    ///
    /// - `OUTLAY_ALLOWED_ORIGINS`: comma-separated origins (falls back to `FRONTEND_URL`)
    /// - `OUTLAY_TRUSTED_PROXIES`: comma-separated IPs/CIDRs
    /// - `OUTLAY_TOKEN_TTL_SECS`: token lifetime in seconds
    /// - `OUTLAY_RATE_LIMIT`: requests per minute per IP, 0 disables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(origins) = std::env::var("OUTLAY_ALLOWED_ORIGINS")
            .ok()
            .or_else(|| std::env::var("FRONTEND_URL").ok())
        {
            config.allowed_origins = parse_origins(&origins);
        }

        if let Ok(proxies) = std::env::var("OUTLAY_TRUSTED_PROXIES") {
            config.trusted_proxies = parse_trusted_networks(&proxies);
        }

        if let Ok(ttl) = std::env::var("OUTLAY_TOKEN_TTL_SECS") {
            match ttl.trim().parse::<u64>() {
                Ok(secs) => config.token_ttl = Duration::from_secs(secs),
                Err(_) => warn!(value = %ttl, "Ignoring invalid OUTLAY_TOKEN_TTL_SECS"),
            }
        }

        if let Ok(limit) = std::env::var("OUTLAY_RATE_LIMIT") {
            match limit.trim().parse::<u32>() {
                Ok(n) => config.rate_limit = n,
                Err(_) => warn!(value = %limit, "Ignoring invalid OUTLAY_RATE_LIMIT"),
            }
        }

        config
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// Bearer token cache
    pub sessions: SessionStore,
}

/// The authenticated caller, inserted into request extensions by [`auth_middleware`]
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

/// Pull the bearer token out of an Authorization header
pub(crate) fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware - resolves the bearer token to a user
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
        debug!(path = %request.uri().path(), "Missing bearer token");
        return AppError::unauthorized("Unauthorized").into_response();
    };

    let Some(user_id) = state.sessions.resolve(&token).await else {
        warn!(path = %request.uri().path(), "Unknown or expired token");
        return AppError::unauthorized("Unauthorized").into_response();
    };

    let user = match state.db.get_user(user_id) {
        Ok(Some(user)) => user,
        Ok(None) => {
            // Token outlived its user
            state.sessions.revoke(&token).await;
            return AppError::unauthorized("Unauthorized").into_response();
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    request.extensions_mut().insert(AuthUser { user, token });
    next.run(request).await
}

/// Rate-limit key: the client IP, resolved through trusted proxies
#[derive(Clone, Debug)]
pub struct ClientIpKeyExtractor {
    trusted_proxies: Vec<ipnet::IpNet>,
}

impl ClientIpKeyExtractor {
    pub fn new(trusted_proxies: Vec<ipnet::IpNet>) -> Self {
        Self { trusted_proxies }
    }
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn name(&self) -> &'static str {
        "client IP"
    }

    fn extract<T>(&self, req: &axum::http::Request<T>) -> Result<Self::Key, GovernorError> {
        let connect_info = req.extensions().get::<ConnectInfo<SocketAddr>>();
        // Requests without a peer address share one bucket
        Ok(get_client_ip(req, connect_info, &self.trusted_proxies)
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
    }
}

/// Milliseconds between refills when `per_minute` requests are allowed
fn refill_interval_ms(per_minute: u32) -> u64 {
    (60_000 / u64::from(per_minute.max(1))).max(1)
}

/// Rewrite the governor's plain-text 429 into the JSON error body
async fn rate_limited_response(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    warn!("Rate limit exceeded");
    let mut rewritten =
        AppError::too_many_requests("Too many requests, please try again later").into_response();
    for name in ["retry-after", "x-ratelimit-after"] {
        if let Some(value) = response.headers().get(name) {
            rewritten.headers_mut().insert(name, value.clone());
        }
    }
    rewritten
}

/// Extract client IP address, respecting trusted proxies
///
/// SECURITY: X-Forwarded-For headers are ONLY trusted when the TCP connection
/// comes from a configured trusted proxy. Otherwise, only the actual TCP
/// peer address is used (to prevent header spoofing attacks).
pub(crate) fn get_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trusted_proxies: &[ipnet::IpNet],
) -> Option<IpAddr> {
    let peer_ip = connect_info.map(|ci| ci.0.ip())?;

    if trusted_proxies.is_empty() {
        return Some(peer_ip);
    }

    let peer_is_trusted_proxy = trusted_proxies.iter().any(|net| net.contains(&peer_ip));

    if peer_is_trusted_proxy {
        // X-Forwarded-For format: "client, proxy1, proxy2" - take the first (original client)
        if let Some(forwarded_for) = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            if let Some(client_ip_str) = forwarded_for.split(',').next() {
                if let Ok(client_ip) = client_ip_str.trim().parse::<IpAddr>() {
                    return Some(client_ip);
                }
            }
        }

        if let Some(real_ip) = request
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
        {
            if let Ok(client_ip) = real_ip.trim().parse::<IpAddr>() {
                return Some(client_ip);
            }
        }
    }

    Some(peer_ip)
}

/// Parse a comma-separated list of IP addresses and CIDR networks
///
/// Examples:
/// - "10.42.0.0/16" - entire subnet
/// - "10.0.0.5" - single IP (parsed as /32 for IPv4 or /128 for IPv6)
pub fn parse_trusted_networks(input: &str) -> Vec<ipnet::IpNet> {
    input
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(net) = s.parse::<ipnet::IpNet>() {
                return Some(net);
            }
            if let Ok(ip) = s.parse::<IpAddr>() {
                return Some(ipnet::IpNet::from(ip));
            }
            warn!(input = s, "Failed to parse trusted network entry");
            None
        })
        .collect()
}

/// The caller set by [`auth_middleware`]
pub(crate) fn auth_user(request: &Request) -> Result<AuthUser, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::unauthorized("Unauthorized"))
}

/// Read and parse a JSON request body
pub(crate) async fn read_json<T: DeserializeOwned>(request: Request) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))
}

/// Create the application router
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        sessions: SessionStore::new(config.token_ttl),
        config: config.clone(),
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login));

    let protected_routes = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::get_me))
        .route("/users", get(handlers::list_users))
        // Categories
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/categories/seed", post(handlers::seed_categories))
        .route(
            "/categories/:id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // Expenses
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/expenses/seed", post(handlers::seed_expenses))
        .route("/expenses/monthly", get(handlers::get_monthly_expenses))
        .route("/expenses/summary", get(handlers::get_expense_summary))
        .route("/expenses/analytics", get(handlers::get_analytics))
        .route(
            "/expenses/:id",
            put(handlers::update_expense).delete(handlers::delete_expense),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'",
    );

    let mut routes = Router::new().merge(public_routes).merge(protected_routes);

    // Sits inside the CORS layer, which answers OPTIONS requests itself
    if config.rate_limit > 0 {
        let governor_config = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor::new(config.trusted_proxies.clone()))
            .per_millisecond(refill_interval_ms(config.rate_limit))
            .burst_size(config.rate_limit)
            .finish();

        match governor_config {
            Some(governor_config) => {
                let governor_config = Arc::new(governor_config);
                let limiter = governor_config.limiter().clone();
                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    runtime.spawn(async move {
                        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
                        loop {
                            interval.tick().await;
                            limiter.retain_recent();
                        }
                    });
                }

                routes = routes
                    .layer(GovernorLayer {
                        config: governor_config,
                    })
                    .layer(middleware::map_response(rate_limited_response));
            }
            None => warn!(limit = config.rate_limit, "Invalid rate limit; limiting disabled"),
        }
    }

    let mut app = routes
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve a built frontend if provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    serve_with_config(db, host, port, static_dir, ServerConfig::from_env()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.rate_limit == 0 {
        warn!("Rate limiting disabled");
    }
    if config.allowed_origins.is_empty() {
        info!("No CORS origins configured; cross-origin requests will be rejected");
    }

    let app = create_router(db, static_dir, config)
        .into_make_service_with_connect_info::<SocketAddr>();
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: &str) -> Self {
        Self::with_status(StatusCode::CONFLICT, msg)
    }

    pub fn too_many_requests(msg: &str) -> Self {
        Self::with_status(StatusCode::TOO_MANY_REQUESTS, msg)
    }

    pub fn internal(msg: &str) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        // Domain errors carry a client-safe message and map to a 4xx
        match err.into().downcast::<outlay_core::Error>() {
            Ok(outlay_core::Error::NotFound(msg)) => Self::not_found(&msg),
            Ok(outlay_core::Error::Conflict(msg)) => Self::conflict(&msg),
            Ok(outlay_core::Error::InvalidData(msg)) => Self::bad_request(&msg),
            Ok(other) => Self::internal_from(other.into()),
            Err(err) => Self::internal_from(err),
        }
    }
}

impl AppError {
    fn internal_from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
