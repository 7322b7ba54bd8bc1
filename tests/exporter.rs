use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use circleci_exporter::{server, Collector, ExporterConfig, InsightsClient, InsightsSource};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUILD_WORKFLOW: &str = r#"{"items":[{"name":"build","metrics":{"success_rate":0.95,"total_runs":20,"failed_runs":1,"successful_runs":19,"throughput":0.8,"mttr":120,"duration_metrics":{"min":10,"max":500,"median":80,"mean":95,"p95":300,"standard_deviation":40.5}}}],"next_page_token":""}"#;

fn config(base_url: String) -> ExporterConfig {
    ExporterConfig {
        base_url,
        project_slug: "org/repo".to_string(),
        vcs_branch: "main".to_string(),
        token: "T".to_string(),
        timeout_secs: 2,
        ..ExporterConfig::default()
    }
}

fn router_for(config: ExporterConfig) -> Router {
    let max_pages = config.max_pages;
    let client = InsightsClient::new(config).unwrap();
    server::router(Arc::new(Collector::new(Arc::new(client), max_pages)), "/metrics")
}

async fn get(router: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

/// An address nothing listens on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn mount_workflows(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/org/repo/workflows"))
        .and(query_param("circle-token", "T"))
        .and(query_param("reporting-window", "last-24-hours"))
        .and(query_param("branch", "main"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn scrape_exposes_workflow_metrics() {
    let upstream = MockServer::start().await;
    mount_workflows(&upstream, ResponseTemplate::new(200).set_body_string(BUILD_WORKFLOW)).await;

    let (status, content_type, body) = get(router_for(config(upstream.uri())), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain; version=0.0.4"));

    for line in [
        "circleci_up 1",
        "circleci_success_rate{name=\"build\"} 0.95",
        "circleci_total_runs{name=\"build\"} 20",
        "circleci_failed_runs{name=\"build\"} 1",
        "circleci_successful_runs{name=\"build\"} 19",
        "circleci_throughput{name=\"build\"} 0.8",
        "circleci_mttr{name=\"build\"} 120",
        "circleci_duration_min{name=\"build\"} 10",
        "circleci_duration_max{name=\"build\"} 500",
        "circleci_duration_median{name=\"build\"} 80",
        "circleci_duration_mean{name=\"build\"} 95",
        "circleci_duration_p95{name=\"build\"} 300",
        "circleci_duration_standard_deviation{name=\"build\"} 40.5",
    ] {
        assert!(body.lines().any(|l| l == line), "missing `{line}` in:\n{body}");
    }
    assert_eq!(body.lines().filter(|l| l.starts_with("circleci_up")).count(), 1);
}

#[tokio::test]
async fn upstream_error_status_reports_down() {
    let upstream = MockServer::start().await;
    mount_workflows(&upstream, ResponseTemplate::new(500).set_body_string(BUILD_WORKFLOW)).await;

    let (status, _, body) = get(router_for(config(upstream.uri())), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let samples: Vec<_> = body.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(samples, vec!["circleci_up 0"]);
}

#[tokio::test]
async fn unreachable_upstream_reports_down() {
    let (status, _, body) = get(router_for(config(closed_port_url())), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let samples: Vec<_> = body.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(samples, vec!["circleci_up 0"]);
}

#[tokio::test]
async fn malformed_body_reports_up_only() {
    let upstream = MockServer::start().await;
    let response = ResponseTemplate::new(200).set_body_string("<html>oops</html>");
    mount_workflows(&upstream, response).await;

    let (status, _, body) = get(router_for(config(upstream.uri())), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let samples: Vec<_> = body.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(samples, vec!["circleci_up 1"]);
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(BUILD_WORKFLOW)
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&upstream)
        .await;

    let mut config = config(upstream.uri());
    config.timeout_secs = 1;
    let (_, _, body) = get(router_for(config), "/metrics").await;

    assert!(body.lines().any(|l| l == "circleci_up 0"));
}

#[tokio::test]
async fn client_follows_page_token() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/org/repo/workflows"))
        .and(query_param("page-token", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"items":[{"name":"deploy","metrics":{"total_runs":3}}],"next_page_token":""}"#,
        ))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/org/repo/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"items":[{"name":"build","metrics":{"total_runs":20}}],"next_page_token":"p2"}"#,
        ))
        .expect(1)
        .mount(&upstream)
        .await;

    let mut config = config(upstream.uri());
    config.max_pages = 5;
    let (_, _, body) = get(router_for(config), "/metrics").await;

    assert!(body.lines().any(|l| l == "circleci_total_runs{name=\"build\"} 20"));
    assert!(body.lines().any(|l| l == "circleci_total_runs{name=\"deploy\"} 3"));
}

#[tokio::test]
async fn client_returns_raw_body() {
    let upstream = MockServer::start().await;
    mount_workflows(&upstream, ResponseTemplate::new(200).set_body_string(BUILD_WORKFLOW)).await;

    let client = InsightsClient::new(config(upstream.uri())).unwrap();
    let body = client.fetch_workflow_metrics(None).await.unwrap();
    assert_eq!(body, BUILD_WORKFLOW.as_bytes());
}

#[tokio::test]
async fn client_error_hides_token() {
    let mut config = config(closed_port_url());
    config.token = "very-secret".to_string();
    let err = InsightsClient::new(config)
        .unwrap()
        .fetch_workflow_metrics(None)
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(!err.to_string().contains("very-secret"));
    assert!(!format!("{:?}", err).contains("very-secret"));
}

#[tokio::test]
async fn landing_page_and_unknown_paths() {
    let router = router_for(config(closed_port_url()));

    let (status, content_type, body) = get(router.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(body.contains("<a href='/metrics'>Metrics</a>"));

    let (status, _, _) = get(router, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_sends_page_token_intact() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/org/repo/workflows"))
        .and(query_param("circle-token", "T"))
        .and(query_param("page-token", "ab+c/d=="))
        .respond_with(ResponseTemplate::new(200).set_body_string(BUILD_WORKFLOW))
        .expect(1)
        .mount(&upstream)
        .await;

    let client = InsightsClient::new(config(upstream.uri())).unwrap();
    let body = client.fetch_workflow_metrics(Some("ab+c/d==")).await.unwrap();
    assert_eq!(body, BUILD_WORKFLOW.as_bytes());
}

#[tokio::test]
async fn zero_timeout_waits_for_slow_upstream() {
    let upstream = MockServer::start().await;
    mount_workflows(
        &upstream,
        ResponseTemplate::new(200)
            .set_body_string(BUILD_WORKFLOW)
            .set_delay(std::time::Duration::from_millis(1500)),
    )
    .await;

    let mut config = config(upstream.uri());
    config.timeout_secs = 0;
    let (status, _, body) = get(router_for(config), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.lines().any(|l| l == "circleci_up 1"), "body:\n{body}");
    assert!(body.lines().any(|l| l == "circleci_total_runs{name=\"build\"} 20"));
}
