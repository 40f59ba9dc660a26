// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface.
//!
//! Routes are split into a public set (health, login, Google sign-in) and
//! the [`RouteGroup`]s, which are merged into one router that carries the
//! credential verifier as a route layer. A group cannot be mounted without
//! the guard.

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_auth, IdentityClaim, ProviderRegistration, UserSummary},
    config::AppConfig,
    models::{
        AnalyticsSummary, Balance, Bill, CategoryTotal, ChatMessage, ChatRequest, ChatResponse,
        ChatRole, ClearDataResponse, CreateBillRequest, CreateTransactionRequest,
        ForecastResponse, Profile, Transaction, TransactionKind, UpdateBillPaidRequest,
        UpdateProfileRequest,
    },
    state::AppState,
};

pub mod analytics;
pub mod assistant;
pub mod auth;
pub mod balance;
pub mod bills;
pub mod data;
pub mod health;
pub mod profile;
pub mod transactions;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// A set of routes that only authenticated callers may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    Identity,
    Transactions,
    Bills,
    Profile,
    AiChat,
    AiForecast,
    Analytics,
    ClearData,
    Balance,
}

impl RouteGroup {
    pub const ALL: [RouteGroup; 9] = [
        RouteGroup::Identity,
        RouteGroup::Transactions,
        RouteGroup::Bills,
        RouteGroup::Profile,
        RouteGroup::AiChat,
        RouteGroup::AiForecast,
        RouteGroup::Analytics,
        RouteGroup::ClearData,
        RouteGroup::Balance,
    ];

    /// Routes of this group, relative to `/api`.
    fn routes(self) -> Router<AppState> {
        match self {
            RouteGroup::Identity => Router::new().route("/auth/me", get(auth::me)),
            RouteGroup::Transactions => Router::new()
                .route(
                    "/transactions",
                    get(transactions::list_transactions).post(transactions::create_transaction),
                )
                .route(
                    "/transactions/{transaction_id}",
                    delete(transactions::delete_transaction),
                ),
            RouteGroup::Bills => Router::new()
                .route("/bills", get(bills::list_bills).post(bills::create_bill))
                .route("/bills/{bill_id}", delete(bills::delete_bill))
                .route("/bills/{bill_id}/paid", put(bills::set_bill_paid)),
            RouteGroup::Profile => Router::new().route(
                "/profile",
                get(profile::get_profile).put(profile::update_profile),
            ),
            RouteGroup::AiChat => Router::new().route("/ai/chat", post(assistant::chat)),
            RouteGroup::AiForecast => Router::new().route("/ai/forecast", post(assistant::forecast)),
            RouteGroup::Analytics => Router::new().route("/analytics", get(analytics::get_analytics)),
            RouteGroup::ClearData => Router::new().route("/clear-data", delete(data::clear_data)),
            RouteGroup::Balance => Router::new().route(
                "/balance",
                get(balance::get_balance).put(balance::set_balance),
            ),
        }
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/auth/google/status", get(auth::google_status))
}

/// Every [`RouteGroup`] behind the credential verifier.
fn protected_routes(state: &AppState) -> Router<AppState> {
    RouteGroup::ALL
        .into_iter()
        .fold(Router::new(), |router, group| router.merge(group.routes()))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Application routes and API docs, without transport layers.
pub fn router(state: AppState) -> Router {
    let api_routes = public_routes().merge(protected_routes(&state));

    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
}

/// Wrap the router with request IDs, tracing, CORS and the request timeout.
pub fn with_http_layers(router: Router, config: &AppConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = allowed_origins else {
        warn!("CORS_ALLOWED_ORIGINS not set, allowing any origin");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers(Any)
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        auth::login,
        auth::register,
        auth::google_login,
        auth::google_callback,
        auth::google_status,
        auth::me,
        transactions::list_transactions,
        transactions::create_transaction,
        transactions::delete_transaction,
        bills::list_bills,
        bills::create_bill,
        bills::set_bill_paid,
        bills::delete_bill,
        profile::get_profile,
        profile::update_profile,
        balance::get_balance,
        balance::set_balance,
        analytics::get_analytics,
        assistant::chat,
        assistant::forecast,
        data::clear_data
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            auth::LoginRequest,
            auth::RegisterRequest,
            auth::TokenResponse,
            auth::OAuthStatusResponse,
            auth::MeResponse,
            IdentityClaim,
            UserSummary,
            ProviderRegistration,
            Transaction,
            TransactionKind,
            CreateTransactionRequest,
            Bill,
            CreateBillRequest,
            UpdateBillPaidRequest,
            Profile,
            UpdateProfileRequest,
            Balance,
            AnalyticsSummary,
            CategoryTotal,
            ClearDataResponse,
            ChatRole,
            ChatMessage,
            ChatRequest,
            ChatResponse,
            ForecastResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Direct login and Google sign-in"),
        (name = "Transactions", description = "Income and expense records"),
        (name = "Bills", description = "Upcoming bills"),
        (name = "Profile", description = "User profile"),
        (name = "Balance", description = "Running balance"),
        (name = "Analytics", description = "Spending summaries"),
        (name = "AI", description = "Assistant chat and forecasts"),
        (name = "Data", description = "Data management")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ClaimFields, TokenCodec};
    use axum::body::to_bytes;
    use chrono::Utc;
    use std::time::Duration;
    use tower::ServiceExt;

    /// One request per protected endpoint.
    const PROTECTED_ENDPOINTS: &[(&str, &str)] = &[
        ("GET", "/api/auth/me"),
        ("GET", "/api/transactions"),
        ("POST", "/api/transactions"),
        ("DELETE", "/api/transactions/tx-1"),
        ("GET", "/api/bills"),
        ("POST", "/api/bills"),
        ("PUT", "/api/bills/bill-1/paid"),
        ("DELETE", "/api/bills/bill-1"),
        ("GET", "/api/profile"),
        ("PUT", "/api/profile"),
        ("POST", "/api/ai/chat"),
        ("POST", "/api/ai/forecast"),
        ("GET", "/api/analytics"),
        ("DELETE", "/api/clear-data"),
        ("GET", "/api/balance"),
        ("PUT", "/api/balance"),
    ];

    fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn error_code(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["error_code"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn every_protected_endpoint_rejects_missing_token() {
        let app = router(AppState::for_tests());

        for (method, uri) in PROTECTED_ENDPOINTS {
            let response = app.clone().oneshot(request(method, uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(error_code(response).await, "missing_token", "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn every_protected_endpoint_rejects_invalid_and_expired_tokens() {
        let state = AppState::for_tests();
        let now = Utc::now().timestamp();
        let expired = state
            .codec
            .issue_at(ClaimFields::new("u1", None, "Ada"), now - 7_200)
            .unwrap();
        let foreign = TokenCodec::new("another-secret", 3600)
            .issue(ClaimFields::new("u1", None, "Ada"))
            .unwrap();
        let app = router(state);

        for (method, uri) in PROTECTED_ENDPOINTS {
            let response = app
                .clone()
                .oneshot(request(method, uri, Some(&expired)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(error_code(response).await, "token_expired", "{method} {uri}");

            let response = app
                .clone()
                .oneshot(request(method, uri, Some(&foreign)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(error_code(response).await, "invalid_token", "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn valid_token_reaches_handlers() {
        let state = AppState::for_tests();
        let token = state
            .codec
            .issue(ClaimFields::new("u1", Some("ada@example.com".into()), "Ada"))
            .unwrap();
        let app = router(state);

        for uri in ["/api/transactions", "/api/bills", "/api/profile", "/api/balance", "/api/analytics"] {
            let response = app.clone().oneshot(request("GET", uri, Some(&token))).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        }

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/api/balance?token={token}"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn public_routes_need_no_token() {
        let app = router(AppState::for_tests());

        for uri in ["/health/live", "/health/ready", "/api/auth/google/status"] {
            let response = app.clone().oneshot(request("GET", uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        }
    }

    fn test_config() -> AppConfig {
        AppConfig::from_lookup(|name| {
            (name == crate::config::JWT_SECRET_ENV).then(|| AppState::TEST_SECRET.to_string())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn http_layers_set_request_id() {
        let app = with_http_layers(router(AppState::for_tests()), &test_config());

        let response = app.oneshot(request("GET", "/health/live", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test(start_paused = true)]
    async fn http_layers_cancel_requests_past_the_timeout() {
        let mut config = test_config();
        config.request_timeout = Duration::from_millis(50);
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "done"
            }),
        );
        let app = with_http_layers(slow, &config);

        let response = app.oneshot(request("GET", "/slow", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/health/live")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn restricted_cors_allows_only_listed_origins() {
        let origins = vec![
            "https://app.example.com".to_string(),
            "bad\norigin".to_string(),
        ];
        let app = router(AppState::for_tests()).layer(cors_layer(Some(origins.as_slice())));

        let response = app
            .clone()
            .oneshot(preflight("https://app.example.com"))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example.com"
        );

        let response = app.oneshot(preflight("https://evil.example.com")).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn openapi_lists_protected_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/transactions"));
        assert!(doc.paths.paths.contains_key("/api/auth/google/callback"));
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer"));
    }
}
