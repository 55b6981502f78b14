//! Webhook delivery against a wiremock receiver

use a2a_agents::a2a::executor::{MessageSendConfiguration, PushNotificationConfig};
use a2a_agents::a2a::types::TaskState;
use a2a_agents::webhook::{job_result_artifact, TaskNotification, WebhookClient, WebhookConfig};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> WebhookClient {
    WebhookClient::new(Duration::from_secs(10)).unwrap()
}

fn config(server: &MockServer) -> WebhookConfig {
    WebhookConfig {
        url: format!("{}/api/webhooks/a2a", server.uri()),
        token: "tok-123".to_string(),
    }
}

#[tokio::test]
async fn test_notification_is_posted_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/a2a"))
        .and(header("Authorization", "Bearer tok-123"))
        .and(body_partial_json(json!({
            "id": "task-1",
            "contextId": "ctx-1",
            "kind": "task",
            "status": {"state": "working", "message": "Starting job execution"},
            "artifacts": []
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notification =
        TaskNotification::new("task-1", Some("ctx-1"), TaskState::Working, "Starting job execution");
    assert!(client().notify(&config(&server), &notification).await);
}

#[tokio::test]
async fn test_missing_context_id_is_sent_as_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"contextId": "default"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notification = TaskNotification::new("task-1", None, TaskState::Completed, "done");
    assert!(client().notify(&config(&server), &notification).await);
}

#[tokio::test]
async fn test_only_204_counts_as_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let notification = TaskNotification::new("task-1", None, TaskState::Working, "x");
    assert!(!client().notify(&config(&server), &notification).await);
}

#[tokio::test]
async fn test_unreachable_receiver_is_not_delivered() {
    let config = WebhookConfig {
        url: "http://127.0.0.1:1/hook".to_string(),
        token: "t".to_string(),
    };
    let notification = TaskNotification::new("task-1", None, TaskState::Working, "x");
    assert!(!WebhookClient::new(Duration::from_secs(1)).unwrap().notify(&config, &notification).await);
}

#[tokio::test]
async fn test_slow_receiver_hits_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = WebhookClient::new(Duration::from_millis(200)).unwrap();
    let notification = TaskNotification::new("task-1", None, TaskState::Working, "x");
    let started = std::time::Instant::now();
    assert!(!client.notify(&config(&server), &notification).await);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_client_builds_from_config_section() {
    let config = a2a_agents::config::AppConfig::default();
    assert!(WebhookClient::from_config(&config.webhook).is_ok());
}

#[tokio::test]
async fn test_job_result_artifact_is_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let notification = TaskNotification::new(
        "task-1-job-0",
        Some("ctx-1"),
        TaskState::Completed,
        "Completed: Research",
    )
    .with_artifact(job_result_artifact("task-1-job-0", "Found 3 trends"));
    assert!(client().notify(&config(&server), &notification).await);

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let data = &body["artifacts"][0]["parts"][0]["data"];
    assert_eq!(body["artifacts"][0]["parts"][0]["kind"], "data");
    assert_eq!(data["jobId"], "task-1-job-0");
    assert_eq!(data["result"], "Found 3 trends");
    assert!(data["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn test_config_from_push_notification_settings() {
    let configuration = MessageSendConfiguration {
        push_notification_config: Some(PushNotificationConfig {
            url: Some("http://localhost:3000/hook".to_string()),
            token: Some("abc".to_string()),
        }),
        ..Default::default()
    };
    assert_eq!(
        WebhookConfig::from_configuration(Some(&configuration)),
        Some(WebhookConfig {
            url: "http://localhost:3000/hook".to_string(),
            token: "abc".to_string(),
        })
    );

    let without_token = MessageSendConfiguration {
        push_notification_config: Some(PushNotificationConfig {
            url: Some("http://localhost:3000/hook".to_string()),
            token: None,
        }),
        ..Default::default()
    };
    assert_eq!(WebhookConfig::from_configuration(Some(&without_token)), None);
    assert_eq!(WebhookConfig::from_configuration(None), None);
}
