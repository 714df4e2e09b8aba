use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode, Uri},
    response::Redirect,
    routing::{get, post},
    Router,
};
use dashboard_core::probe::{ProbeReport, Verdict};
use dashboard_core::{
    run_cycle, DashboardEndpoints, DashboardMachine, DashboardState, HttpGet, NoopObserver, Phase,
};
use dashboard_server::config::ServerConfig;
use dashboard_server::transport::ReqwestTransport;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Accepts connections and never answers.
async fn spawn_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

async fn closed_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

fn json_route(status: StatusCode, body: &'static str) -> axum::routing::MethodRouter {
    get(move || async move { (status, [(header::CONTENT_TYPE, "application/json")], body) })
}

fn backend(agents: (StatusCode, &'static str), prds: (StatusCode, &'static str)) -> Router {
    Router::new()
        .route("/api/v1/agents", json_route(agents.0, agents.1))
        .route("/api/v1/prds", json_route(prds.0, prds.1))
        .route(
            "/api/v1/health",
            json_route(StatusCode::OK, r#"{"status":"healthy","version":"1.0.0"}"#),
        )
        .route("/api/v1/echo", post(|body: String| async move { body }))
        .route(
            "/api/v1/cache",
            get(|headers: HeaderMap| async move {
                let read = |name: header::HeaderName| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string()
                };
                format!("{}|{}", read(header::CACHE_CONTROL), read(header::PRAGMA))
            }),
        )
        .route(
            "/api/v1/moved",
            get(|| async { Redirect::temporary("/api/v1/agents") }),
        )
        .route(
            "/api/v1/query",
            get(|uri: Uri| async move { uri.query().unwrap_or_default().to_string() }),
        )
}

const ONE_ACTIVE_AGENT: &str = r#"{"agents":[{"id":"1","name":"X","status":"active"}]}"#;
const NO_PRDS: &str = r#"{"prds":[]}"#;
const ONE_PRD: &str = r#"{"prds":[{"id":"p1","title":"T","status":"completed"}]}"#;

async fn cycle(origin: &str, timeout: Duration) -> DashboardState {
    let transport = ReqwestTransport::new(origin, timeout).expect("client");
    let mut machine = DashboardMachine::with_observer(NoopObserver);
    let ticket = machine.surface_ready().expect("ticket");
    assert_eq!(machine.phase(), Phase::Loading);
    run_cycle(&mut machine, ticket, &transport, DashboardEndpoints::default()).await;
    machine.state().clone()
}

fn config_for(origin: &str) -> ServerConfig {
    ServerConfig {
        backend_origin: origin.to_string(),
        timeout: Duration::from_secs(2),
        ..ServerConfig::default()
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

#[tokio::test]
async fn both_endpoints_succeed_over_http() {
    let origin = spawn(backend(
        (StatusCode::OK, ONE_ACTIVE_AGENT),
        (StatusCode::OK, NO_PRDS),
    ))
    .await;

    let DashboardState::Ready { agents, prds } = cycle(&origin, Duration::from_secs(2)).await else {
        panic!("expected ready");
    };
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].status, "active");
    assert!(prds.is_empty());
}

#[tokio::test]
async fn agents_500_is_partial_over_http() {
    let origin = spawn(backend(
        (StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail":"boom"}"#),
        (StatusCode::OK, ONE_PRD),
    ))
    .await;

    let DashboardState::Partial {
        agents,
        prds,
        failed,
    } = cycle(&origin, Duration::from_secs(2)).await
    else {
        panic!("expected partial");
    };
    assert!(agents.is_empty());
    assert_eq!(prds.len(), 1);
    assert_eq!(failed.failure.status_code(), Some(500));
}

#[tokio::test]
async fn silent_backend_times_out_into_failed() {
    let origin = spawn_silent().await;
    let state = cycle(&origin, Duration::from_millis(300)).await;
    let DashboardState::Failed { reason, failures } = state else {
        panic!("expected failed");
    };
    assert_eq!(failures.len(), 2);
    assert_eq!(reason, "Agents: request timed out; PRDs: request timed out");
}

#[tokio::test]
async fn refused_connection_is_failed() {
    let origin = closed_origin().await;
    let DashboardState::Failed { reason, .. } = cycle(&origin, Duration::from_secs(2)).await else {
        panic!("expected failed");
    };
    assert_eq!(reason, "Agents: connection refused; PRDs: connection refused");
}

#[tokio::test]
async fn unresolvable_host_reports_the_resolver_error() {
    let state = cycle("http://no-such-host.invalid", Duration::from_secs(5)).await;
    let DashboardState::Failed { failures, .. } = state else {
        panic!("expected failed");
    };
    assert_eq!(failures.len(), 2);
    for side in &failures {
        let message = side.failure.user_message();
        assert!(!message.is_empty());
        assert_ne!(message, "connection refused");
        assert_ne!(message, "request timed out");
    }
}

#[tokio::test]
async fn native_transport_bypasses_caches() {
    let origin = spawn(backend((StatusCode::OK, ONE_ACTIVE_AGENT), (StatusCode::OK, NO_PRDS))).await;
    let transport = ReqwestTransport::new(&origin, Duration::from_secs(2)).expect("client");

    let reply = transport.get("/api/v1/cache").await.expect("reply");
    let (cache_control, pragma) = reply.body.split_once('|').expect("echoed headers");
    assert!(cache_control.contains("no-cache"), "cache-control was {cache_control:?}");
    assert!(cache_control.contains("no-store"), "cache-control was {cache_control:?}");
    assert_eq!(pragma, "no-cache");
}

#[tokio::test]
async fn proxy_passes_get_through() {
    let origin = spawn(backend(
        (StatusCode::OK, ONE_ACTIVE_AGENT),
        (StatusCode::OK, NO_PRDS),
    ))
    .await;
    let app = dashboard_server::build_router(&config_for(&origin)).expect("router");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/agents")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(&b"application/json"[..])
    );
    assert_eq!(body_text(response).await, ONE_ACTIVE_AGENT);
}

#[tokio::test]
async fn proxy_keeps_status_query_and_body() {
    let origin = spawn(backend(
        (StatusCode::SERVICE_UNAVAILABLE, r#"{"detail":"down"}"#),
        (StatusCode::OK, NO_PRDS),
    ))
    .await;
    let app = dashboard_server::build_router(&config_for(&origin)).expect("router");

    let failing = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/agents")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(failing.status(), StatusCode::SERVICE_UNAVAILABLE);

    let query = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/query?page=2&size=10")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(body_text(query).await, "page=2&size=10");

    let echoed = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/echo")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"new"}"#))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(echoed.status(), StatusCode::OK);
    assert_eq!(body_text(echoed).await, r#"{"name":"new"}"#);
}

#[tokio::test]
async fn proxy_hands_redirects_back() {
    let origin = spawn(backend((StatusCode::OK, ONE_ACTIVE_AGENT), (StatusCode::OK, NO_PRDS))).await;
    let app = dashboard_server::build_router(&config_for(&origin)).expect("router");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/moved")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/api/v1/agents")
    );
}

#[tokio::test]
async fn proxy_answers_cors_preflight() {
    let origin = spawn(backend((StatusCode::OK, ONE_ACTIVE_AGENT), (StatusCode::OK, NO_PRDS))).await;
    let app = dashboard_server::build_router(&config_for(&origin)).expect("router");

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/agents")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    let headers = response.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(methods.contains(method), "missing {method} in {methods}");
    }
}

#[tokio::test]
async fn proxy_reports_unreachable_backend() {
    let origin = closed_origin().await;
    let app = dashboard_server::build_router(&config_for(&origin)).expect("router");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/prds")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value =
        serde_json::from_str(&body_text(response).await).expect("json body");
    assert_eq!(body["detail"], "backend unreachable");
}

#[tokio::test]
async fn server_rendered_dashboard_shows_partial_state() {
    let origin = spawn(backend(
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        (StatusCode::OK, ONE_PRD),
    ))
    .await;
    let app = dashboard_server::build_router(&config_for(&origin)).expect("router");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Agents could not be loaded: request failed with status 500"));
    assert!(html.contains("PRDs (1)"));
    assert!(html.contains("<b>1</b>Total PRDs"));
}

#[tokio::test]
async fn connectivity_report_covers_every_probe() {
    let origin = spawn(backend((StatusCode::OK, ONE_ACTIVE_AGENT), (StatusCode::OK, NO_PRDS))).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let config = ServerConfig {
        bind: addr,
        external_probe_url: format!("{origin}/api/v1/missing"),
        ..config_for(&origin)
    };
    let app = dashboard_server::build_router(&config).expect("router");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let reports: Vec<ProbeReport> = reqwest::get(format!("http://{addr}/diagnostics/connectivity.json"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].verdict, Verdict::Failed);
    assert_eq!(reports[0].status_code, Some(404));
    assert_eq!(reports[1].verdict, Verdict::Success);
    assert_eq!(
        reports[1].data.as_ref().and_then(|d| d.get("status")),
        Some(&serde_json::json!("healthy"))
    );
    // relative target goes through this server's own proxy
    assert_eq!(reports[2].verdict, Verdict::Success);
    assert_eq!(reports[2].target, "/api/v1/health");
}
