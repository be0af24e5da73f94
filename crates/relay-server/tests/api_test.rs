//! Integration tests: drive the router and verify the HTTP contract.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use relay_core::events::decode_stream;
use relay_core::testing::ScriptedAgent;
use relay_core::{
    AgentCapability, FailureKind, MetricsRegistry, RelaySettings, StepStatus, WorkflowMessage,
};
use relay_server::state::AppState;
use tower::ServiceExt;

fn test_state(agents: Vec<Arc<dyn AgentCapability>>, settings: RelaySettings) -> AppState {
    relay_server::create_app_state(settings, agents, Arc::new(MetricsRegistry::new()))
        .expect("Failed to build app state")
}

fn two_agents() -> Vec<Arc<dyn AgentCapability>> {
    vec![
        ScriptedAgent::succeeding("A", "x").shared(),
        ScriptedAgent::succeeding("B", "y").shared(),
    ]
}

fn process_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = relay_server::build_router(test_state(two_agents(), RelaySettings::default()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["app"], "Relay Three-Agent Service");
}

#[tokio::test]
async fn test_process_streams_full_chain() {
    let state = test_state(two_agents(), RelaySettings::default());
    let app = relay_server::build_router(state.clone());

    let response = app.oneshot(process_request(r#"{"query":"hi"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let body = body_string(response).await;
    assert!(body.starts_with("data: {"));

    let messages = decode_stream(&body).unwrap();
    assert_eq!(messages.len(), 5);

    let statuses: Vec<_> = messages[..4]
        .iter()
        .map(|m| {
            let e = m.as_progress().unwrap();
            (e.status, e.current_agent.clone())
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            (StepStatus::Started, "A".to_string()),
            (StepStatus::Completed, "A".to_string()),
            (StepStatus::Started, "B".to_string()),
            (StepStatus::Completed, "B".to_string()),
        ]
    );

    let result = messages[4].as_final().unwrap();
    assert_eq!(result.workflow, "A -> B");
    assert_eq!(result.final_output.as_deref(), Some("y"));

    assert_eq!(state.metrics.requests_total(), 1);
    assert_eq!(state.metrics.duration_count(), 1);
}

#[tokio::test]
async fn test_process_failed_step_ends_stream() {
    let agents = vec![
        ScriptedAgent::always_failing("A", FailureKind::Fatal, "malformed instruction").shared(),
        ScriptedAgent::succeeding("B", "y").shared(),
    ];
    let state = test_state(agents, RelaySettings::default());
    let app = relay_server::build_router(state.clone());

    let response = app.oneshot(process_request(r#"{"query":"hi"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let messages = decode_stream(&body_string(response).await).unwrap();
    assert_eq!(messages.len(), 2);
    let failed = messages[1].as_progress().unwrap();
    assert_eq!(failed.status, StepStatus::Failed);
    assert_eq!(failed.message, "malformed instruction");
    assert!(!messages.iter().any(WorkflowMessage::is_final));

    assert_eq!(state.metrics.agent_errors_total(), 1);
    assert_eq!(state.metrics.duration_count(), 0);
}

#[tokio::test]
async fn test_process_timeout_message() {
    let agents = vec![
        ScriptedAgent::delayed("A", Duration::from_secs(5), "late").shared(),
        ScriptedAgent::succeeding("B", "y").shared(),
    ];
    let settings = RelaySettings {
        agent_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let app = relay_server::build_router(test_state(agents, settings));

    let response = app.oneshot(process_request(r#"{"query":"hi"}"#)).await.unwrap();
    let messages = decode_stream(&body_string(response).await).unwrap();

    assert_eq!(messages.len(), 2);
    let failed = messages[1].as_progress().unwrap();
    assert_eq!(failed.status, StepStatus::Failed);
    assert_eq!(failed.current_agent, "A");
    assert_eq!(failed.message, "A timed out after 50ms");
}

#[tokio::test]
async fn test_process_rejects_invalid_queries() {
    let state = test_state(two_agents(), RelaySettings::default());

    for (body, expected) in [
        (r#"{"query":""}"#, "Invalid 'query' in request"),
        (r#"{"query":"   "}"#, "Invalid 'query' in request"),
        (r#"{"nope":1}"#, "Invalid 'query' in request"),
        ("{{{", "Invalid request body"),
    ] {
        let app = relay_server::build_router(state.clone());
        let response = app.oneshot(process_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"], expected);
    }

    // Rejected requests never reach the orchestrator.
    assert_eq!(state.metrics.requests_total(), 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let state = test_state(two_agents(), RelaySettings::default());

    let app = relay_server::build_router(state.clone());
    let response = app.oneshot(process_request(r#"{"query":"hi"}"#)).await.unwrap();
    body_string(response).await;

    let app = relay_server::build_router(state);
    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = body_string(response).await;
    assert!(text.contains("requests_total 1"));
    assert!(text.contains("agent_errors_total 0"));
    assert!(text.contains("request_duration_seconds_count 1"));
}

#[tokio::test]
async fn test_live_server_over_tcp() {
    let settings = RelaySettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    let config = relay_server::ServerConfig::from(&settings);
    let state = test_state(
        vec![
            ScriptedAgent::echo("A").shared(),
            ScriptedAgent::echo("B").shared(),
        ],
        settings,
    );
    let addr = relay_server::start_server(config, state).await.unwrap();
    let base_url = format!("http://{}", addr);

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/process", base_url))
        .json(&serde_json::json!({ "query": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let messages = decode_stream(&resp.text().await.unwrap()).unwrap();
    assert_eq!(
        messages.last().unwrap().as_final().unwrap().final_output.as_deref(),
        Some("B(A(hello))")
    );

    let resp = client
        .post(format!("{}/process", base_url))
        .json(&serde_json::json!({ "query": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
