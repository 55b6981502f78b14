//! JSON-RPC 2.0 agent endpoint
//!
//! One [`AgentServer`] wraps one [`AgentExecutor`]. `message/send` runs the
//! executor to completion, folding each emitted event into the task store,
//! and answers with the resulting task.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;
use warp::Filter;

use super::executor::{AgentExecutor, EventQueue, RequestContext};
use super::jsonrpc::{
    error_codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse, MessageSendParams, TaskIdParams,
    JSONRPC_VERSION, METHOD_MESSAGE_SEND, METHOD_TASKS_CANCEL, METHOD_TASKS_GET,
};
use super::task_store::InMemoryTaskStore;
use super::types::{
    new_agent_text_message, Event, Message, Task, TaskState, TaskStatus, TaskStatusUpdateEvent,
};
use crate::error::{sanitize_error_message, AgentError, AgentResult};
use crate::observability::health::{self, HealthCheck, HealthReporter};
use crate::observability::metrics::metrics;
use crate::request_span;

const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// HTTP front for a single agent executor
pub struct AgentServer {
    executor: Arc<dyn AgentExecutor>,
    store: InMemoryTaskStore,
    health: HealthReporter,
}

impl AgentServer {
    pub fn new(executor: Arc<dyn AgentExecutor>) -> Self {
        let health = HealthReporter::new(executor.card().name);
        Self {
            executor,
            store: InMemoryTaskStore::new(),
            health,
        }
    }

    /// Register a component check reported by `GET /health`
    pub fn with_health_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.health.add_health_check(check);
        self
    }

    pub fn store(&self) -> &InMemoryTaskStore {
        &self.store
    }

    pub fn agent_name(&self) -> String {
        self.executor.card().name
    }

    /// Handle one raw JSON-RPC request body
    pub async fn handle(&self, body: &[u8]) -> JsonRpcResponse {
        let raw: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                debug!("Unparseable JSON-RPC body: {}", e);
                return JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(error_codes::PARSE_ERROR, "Parse error"),
                );
            }
        };

        let id = raw.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                return JsonRpcResponse::failure(
                    id,
                    JsonRpcError::new(error_codes::INVALID_REQUEST, format!("Invalid request: {e}")),
                );
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return JsonRpcResponse::failure(
                request.id,
                JsonRpcError::new(
                    error_codes::INVALID_REQUEST,
                    format!("Unsupported jsonrpc version '{}'", request.jsonrpc),
                ),
            );
        }

        metrics().request_received(&request.method);
        debug!(method = %request.method, "JSON-RPC request");

        let outcome = match request.method.as_str() {
            METHOD_MESSAGE_SEND => match parse_params::<MessageSendParams>(request.params) {
                Ok(params) => self.on_message_send(params).await,
                Err(e) => return JsonRpcResponse::failure(request.id, e),
            },
            METHOD_TASKS_GET => match parse_params::<TaskIdParams>(request.params) {
                Ok(params) => self.on_get_task(params).await,
                Err(e) => return JsonRpcResponse::failure(request.id, e),
            },
            METHOD_TASKS_CANCEL => match parse_params::<TaskIdParams>(request.params) {
                Ok(params) => self.on_cancel_task(params).await,
                Err(e) => return JsonRpcResponse::failure(request.id, e),
            },
            other => {
                return JsonRpcResponse::failure(
                    request.id,
                    JsonRpcError::new(
                        error_codes::METHOD_NOT_FOUND,
                        format!("Method not found: {other}"),
                    ),
                );
            }
        };

        match outcome {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(e) => {
                warn!(error = %e, "JSON-RPC request failed");
                JsonRpcResponse::failure(request.id, e.to_jsonrpc_error())
            }
        }
    }

    async fn on_message_send(&self, params: MessageSendParams) -> AgentResult<Value> {
        let started = Instant::now();
        let mut message = params.message;

        let current_task = match &message.task_id {
            Some(id) => self.store.get(id).await,
            None => None,
        };
        let task_id = current_task
            .as_ref()
            .map(|t| t.id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let context_id = message
            .context_id
            .clone()
            .or_else(|| current_task.as_ref().map(|t| t.context_id.clone()))
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        message.task_id = Some(task_id.clone());
        message.context_id = Some(context_id.clone());

        if current_task.is_some() {
            self.store
                .apply(&task_id, &context_id, &Event::Message(message.clone()))
                .await;
        } else {
            self.store
                .save(Task::new_submitted(
                    task_id.clone(),
                    context_id.clone(),
                    message.clone(),
                ))
                .await;
        }

        let ctx = RequestContext::new(task_id.clone(), context_id.clone(), message)
            .with_configuration(params.configuration)
            .with_current_task(current_task);

        let span = request_span!(
            agent = %self.agent_name(),
            task_id = %task_id,
            context_id = %context_id
        );

        async move {
            info!("Handling message/send");
            let (queue, mut receiver) = EventQueue::new();
            let executor = self.executor.clone();
            let handle = tokio::spawn(
                async move { executor.execute(&ctx, &queue).await }.in_current_span(),
            );

            let mut reply_message: Option<Message> = None;
            let mut saw_task_event = false;
            while let Some(event) = receiver.recv().await {
                match &event {
                    Event::Message(m) if !saw_task_event => reply_message = Some(m.clone()),
                    Event::Message(_) => {}
                    _ => saw_task_event = true,
                }
                self.store.apply(&task_id, &context_id, &event).await;
            }

            let outcome = handle
                .await
                .map_err(|e| AgentError::internal_error(format!("executor panicked: {e}")))
                .and_then(|result| result);

            self.settle(&task_id, &context_id, outcome).await;

            let task = self
                .store
                .get(&task_id)
                .await
                .ok_or_else(|| AgentError::task_not_found(&task_id))?;
            record_outcome(task.status.state, started);
            info!(state = ?task.status.state, "message/send finished");

            match reply_message {
                Some(message) if !saw_task_event => Ok(serde_json::to_value(message)?),
                _ => Ok(serde_json::to_value(task)?),
            }
        }
        .instrument(span)
        .await
    }

    /// Close out a task once its executor has returned
    async fn settle(&self, task_id: &str, context_id: &str, outcome: AgentResult<()>) {
        let Some(task) = self.store.get(task_id).await else {
            return;
        };

        match outcome {
            Err(e) => {
                error!(error = %e, "Executor failed");
                if task.status.state.is_terminal() {
                    return;
                }
                let text = sanitize_error_message(&e.to_string());
                let status = TaskStatus::new(TaskState::Failed).with_message(
                    new_agent_text_message(text, Some(context_id), Some(task_id)),
                );
                self.store
                    .apply(
                        task_id,
                        context_id,
                        &TaskStatusUpdateEvent::new(task_id, context_id, status, true).into(),
                    )
                    .await;
            }
            Ok(()) => {
                if matches!(task.status.state, TaskState::Submitted | TaskState::Working) {
                    let status = TaskStatus::new(TaskState::Completed);
                    self.store
                        .apply(
                            task_id,
                            context_id,
                            &TaskStatusUpdateEvent::new(task_id, context_id, status, true).into(),
                        )
                        .await;
                }
            }
        }
    }

    async fn on_get_task(&self, params: TaskIdParams) -> AgentResult<Value> {
        let task = self
            .store
            .get(&params.id)
            .await
            .ok_or_else(|| AgentError::task_not_found(&params.id))?;
        Ok(serde_json::to_value(task)?)
    }

    async fn on_cancel_task(&self, params: TaskIdParams) -> AgentResult<Value> {
        let task = self
            .store
            .get(&params.id)
            .await
            .ok_or_else(|| AgentError::task_not_found(&params.id))?;

        if task.status.state.is_terminal() {
            return Err(AgentError::task_not_cancelable(&task.id));
        }

        let message = task
            .history
            .first()
            .cloned()
            .unwrap_or_else(|| Message::user_text(""));
        let ctx = RequestContext::new(task.id.clone(), task.context_id.clone(), message)
            .with_current_task(Some(task.clone()));

        let (queue, mut receiver) = EventQueue::new();
        self.executor.cancel(&ctx, &queue).await?;
        drop(queue);

        let mut canceled = false;
        while let Some(event) = receiver.recv().await {
            if let Event::StatusUpdate(update) = &event {
                canceled |= update.status.state == TaskState::Canceled;
            }
            self.store.apply(&task.id, &task.context_id, &event).await;
        }
        if !canceled {
            let status = TaskStatus::new(TaskState::Canceled);
            self.store
                .apply(
                    &task.id,
                    &task.context_id,
                    &TaskStatusUpdateEvent::new(&task.id, &task.context_id, status, true).into(),
                )
                .await;
        }

        let task = self
            .store
            .get(&task.id)
            .await
            .ok_or_else(|| AgentError::task_not_found(&task.id))?;
        Ok(serde_json::to_value(task)?)
    }

    /// Every route an agent serves
    pub fn routes(
        self: Arc<Self>,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let card_server = self.clone();
        let card_route = warp::path!(".well-known" / "agent.json")
            .and(warp::get())
            .map(move || warp::reply::json(&card_server.executor.card()));

        let rpc_server = self.clone();
        let rpc_route = warp::path::end()
            .and(warp::post())
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(warp::body::bytes())
            .and_then(move |body: bytes::Bytes| {
                let server = rpc_server.clone();
                async move {
                    let response = server.handle(&body).await;
                    Ok::<_, Infallible>(warp::reply::json(&response))
                }
            });

        let health_routes = health::routes(Arc::new(self.health.clone()));

        card_route
            .or(rpc_route)
            .or(health_routes)
            .with(warp::cors().allow_any_origin())
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params).map_err(|e| {
        JsonRpcError::new(error_codes::INVALID_PARAMS, format!("Invalid params: {e}"))
    })
}

fn record_outcome(state: TaskState, started: Instant) {
    match state {
        TaskState::Completed => metrics().task_completed(started.elapsed()),
        TaskState::Failed | TaskState::Rejected => metrics().task_failed(started.elapsed()),
        TaskState::InputRequired => metrics().task_input_required(),
        _ => {}
    }
}

/// Serve an agent until `shutdown` resolves
pub async fn serve<F>(server: Arc<AgentServer>, addr: SocketAddr, shutdown: F) -> AgentResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let name = server.agent_name();
    let (bound, running) = warp::serve(server.routes())
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| AgentError::internal_error(format!("Failed to bind {addr}: {e}")))?;

    info!(agent = %name, addr = %bound, "Agent server listening");
    running.await;
    info!(agent = %name, "Agent server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2a::agent_card::AgentCard;
    use crate::a2a::executor::TaskUpdater;
    use crate::a2a::types::Part;
    use async_trait::async_trait;
    use serde_json::json;

    /// Echoes the input back as an artifact, or fails on "boom"
    struct EchoExecutor;

    #[async_trait]
    impl AgentExecutor for EchoExecutor {
        fn card(&self) -> AgentCard {
            AgentCard::new("Echo Agent", "Echoes input", "http://localhost:1")
        }

        async fn execute(&self, ctx: &RequestContext, queue: &EventQueue) -> AgentResult<()> {
            let input = ctx.get_user_input();
            if input == "boom" {
                return Err(AgentError::internal_error("exploded with token=abc123"));
            }
            if input == "just talk" {
                return queue.enqueue(new_agent_text_message("hello", None, None));
            }
            let updater = TaskUpdater::new(queue.clone(), &ctx.task_id, &ctx.context_id);
            updater.update_status(TaskState::Working, None, false)?;
            updater.add_artifact(vec![Part::text(input)], "echo")?;
            Ok(())
        }
    }

    fn server() -> AgentServer {
        AgentServer::new(Arc::new(EchoExecutor))
    }

    fn send_body(text: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "message/send",
            "params": {
                "message": {
                    "role": "user",
                    "parts": [{"kind": "text", "text": text}],
                    "messageId": "m-1"
                }
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_message_send_returns_completed_task() {
        let server = server();
        let response = server.handle(&send_body("ping")).await;

        assert_eq!(response.id, json!(7));
        let result = response.result.unwrap();
        assert_eq!(result["kind"], "task");
        assert_eq!(result["status"]["state"], "completed");
        assert_eq!(result["artifacts"][0]["name"], "echo");
        assert_eq!(result["artifacts"][0]["parts"][0]["text"], "ping");

        let task_id = result["id"].as_str().unwrap();
        assert!(server.store().get(task_id).await.is_some());
    }

    #[tokio::test]
    async fn test_message_only_reply() {
        let response = server().handle(&send_body("just talk")).await;
        let result = response.result.unwrap();
        assert_eq!(result["kind"], "message");
        assert_eq!(result["parts"][0]["text"], "hello");
    }

    #[tokio::test]
    async fn test_executor_error_marks_task_failed() {
        let response = server().handle(&send_body("boom")).await;
        let result = response.result.unwrap();
        assert_eq!(result["status"]["state"], "failed");

        let text = result["status"]["message"]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("exploded"));
        assert!(!text.contains("abc123"));
    }

    #[tokio::test]
    async fn test_tasks_get_and_unknown_task() {
        let server = server();
        let sent = server.handle(&send_body("ping")).await.result.unwrap();
        let id = sent["id"].as_str().unwrap();

        let body = serde_json::to_vec(&json!({
            "jsonrpc": "2.0", "id": 2, "method": "tasks/get", "params": {"id": id}
        }))
        .unwrap();
        let fetched = server.handle(&body).await.result.unwrap();
        assert_eq!(fetched["id"], json!(id));

        let body = serde_json::to_vec(&json!({
            "jsonrpc": "2.0", "id": 3, "method": "tasks/get", "params": {"id": "nope"}
        }))
        .unwrap();
        let error = server.handle(&body).await.error.unwrap();
        assert_eq!(error.code, error_codes::TASK_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancel_finished_task_is_rejected() {
        let server = server();
        let sent = server.handle(&send_body("ping")).await.result.unwrap();

        let body = serde_json::to_vec(&json!({
            "jsonrpc": "2.0", "id": 4, "method": "tasks/cancel", "params": {"id": sent["id"]}
        }))
        .unwrap();
        let error = server.handle(&body).await.error.unwrap();
        assert_eq!(error.code, error_codes::TASK_NOT_CANCELABLE);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();

        let error = server.handle(b"{not json").await.error.unwrap();
        assert_eq!(error.code, error_codes::PARSE_ERROR);

        let body = br#"{"jsonrpc":"1.0","id":1,"method":"message/send","params":{}}"#;
        assert_eq!(
            server.handle(body).await.error.unwrap().code,
            error_codes::INVALID_REQUEST
        );

        let body = br#"{"jsonrpc":"2.0","id":1,"method":"tasks/resubscribe","params":{}}"#;
        assert_eq!(
            server.handle(body).await.error.unwrap().code,
            error_codes::METHOD_NOT_FOUND
        );

        let body = br#"{"jsonrpc":"2.0","id":1,"method":"message/send","params":{"nope":1}}"#;
        assert_eq!(
            server.handle(body).await.error.unwrap().code,
            error_codes::INVALID_PARAMS
        );
    }

    #[tokio::test]
    async fn test_routes_serve_card_and_rpc() {
        let routes = Arc::new(server()).routes();

        let card = warp::test::request()
            .method("GET")
            .path("/.well-known/agent.json")
            .reply(&routes)
            .await;
        assert_eq!(card.status(), 200);
        let card: Value = serde_json::from_slice(card.body()).unwrap();
        assert_eq!(card["name"], "Echo Agent");

        let rpc = warp::test::request()
            .method("POST")
            .path("/")
            .body(send_body("over http"))
            .reply(&routes)
            .await;
        assert_eq!(rpc.status(), 200);
        let rpc: Value = serde_json::from_slice(rpc.body()).unwrap();
        assert_eq!(rpc["result"]["status"]["state"], "completed");

        let health = warp::test::request().path("/health").reply(&routes).await;
        assert_eq!(health.status(), 200);
    }
}
