//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use baton::prelude::*;

/// A scripted model: returns queued responses in order, optionally
/// repeating the last one forever, and can truncate its event streams to
/// simulate a provider that never sends the completion marker.
pub struct FakeModel {
    script: Mutex<VecDeque<ModelResponse>>,
    repeat: Option<ModelResponse>,
    truncate_streams: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<ModelRequest>>,
}

impl FakeModel {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            repeat: None,
            truncate_streams: false,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns the same response for every call.
    pub fn repeating(response: ModelResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(response),
            truncate_streams: false,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Event streams end without a completion marker.
    pub fn truncated(responses: Vec<ModelResponse>) -> Self {
        Self {
            truncate_streams: true,
            ..Self::new(responses)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<ModelResponse> {
        if let Some(response) = self.script.lock().unwrap().pop_front() {
            return Ok(response);
        }
        if let Some(response) = &self.repeat {
            return Ok(response.clone());
        }
        Err(ModelError::internal("fake model script exhausted").into())
    }

    fn record(&self, request: &ModelRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
    }
}

#[async_trait]
impl Model for FakeModel {
    fn name(&self) -> &str {
        "fake-model"
    }

    async fn get_response(&self, request: ModelRequest) -> Result<ModelResponse> {
        self.record(&request);
        self.next_response()
    }

    async fn stream_response(&self, request: ModelRequest) -> Result<ModelEventStream> {
        self.record(&request);
        let response = self.next_response()?;

        let mut events = vec![ModelStreamEvent::Created {
            response_id: response.response_id.clone(),
        }];
        for item in &response.output {
            if let Some(text) = item.message_text() {
                events.push(ModelStreamEvent::TextDelta { delta: text });
            }
            events.push(ModelStreamEvent::ItemDone { item: item.clone() });
        }
        if !self.truncate_streams {
            events.push(ModelStreamEvent::Completed {
                response_id: response.response_id.clone(),
                usage: response.usage,
            });
        }

        Ok(Box::pin(futures::stream::iter(
            events.into_iter().map(Ok::<_, Error>),
        )))
    }
}

/// A response consisting of one assistant message.
pub fn text_response(text: &str) -> ModelResponse {
    items_response(vec![ResponseItem::assistant_message(text)])
}

/// A response with the given output items and fixed usage.
pub fn items_response(items: Vec<ResponseItem>) -> ModelResponse {
    ModelResponse {
        output: items,
        usage: Usage::new(10, 5),
        response_id: Some(format!("resp_{}", items_fingerprint())),
    }
}

fn items_fingerprint() -> usize {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A function tool that immediately returns `result`.
pub fn simple_tool(name: &str, result: Value) -> Tool {
    let value = result;
    Tool::Function(FunctionTool::from_fn(
        name,
        format!("Test tool {name}"),
        serde_json::json!({"type": "object", "properties": {}}),
        move |_args| {
            let value = value.clone();
            async move { Ok(value) }
        },
    ))
}

/// A function tool that sleeps before returning `result`, to exercise
/// completion-order independence.
pub fn slow_tool(name: &str, result: Value, delay_ms: u64) -> Tool {
    let value = result;
    Tool::Function(FunctionTool::from_fn(
        name,
        format!("Slow test tool {name}"),
        serde_json::json!({"type": "object", "properties": {}}),
        move |_args| {
            let value = value.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(value)
            }
        },
    ))
}

/// A function tool that always fails.
pub fn failing_tool(name: &str, with_fallback: bool) -> Tool {
    let tool = FunctionTool::from_fn(
        name,
        format!("Failing test tool {name}"),
        serde_json::json!({"type": "object", "properties": {}}),
        |_args| async move { Err(ToolError::execution("deliberate failure")) },
    );
    let tool = if with_fallback {
        tool.on_error_default()
    } else {
        tool
    };
    Tool::Function(tool)
}

/// An input guardrail with a fixed verdict.
pub struct FixedInputCheck {
    pub trip: bool,
}

#[async_trait]
impl InputGuardrailCheck for FixedInputCheck {
    async fn check(
        &self,
        _ctx: &RunContext,
        _agent: &Agent,
        _input: &RunInput,
    ) -> Result<GuardrailOutput> {
        if self.trip {
            Ok(GuardrailOutput::tripwire("fixed trip"))
        } else {
            Ok(GuardrailOutput::pass())
        }
    }
}

/// An output guardrail with a fixed verdict.
pub struct FixedOutputCheck {
    pub trip: bool,
}

#[async_trait]
impl OutputGuardrailCheck for FixedOutputCheck {
    async fn check(
        &self,
        _ctx: &RunContext,
        _agent: &Agent,
        _output: &Value,
    ) -> Result<GuardrailOutput> {
        if self.trip {
            Ok(GuardrailOutput::tripwire("output trip"))
        } else {
            Ok(GuardrailOutput::pass())
        }
    }
}

/// A computer surface that records every action it performs.
pub struct FakeComputer {
    pub actions: Mutex<Vec<String>>,
}

impl FakeComputer {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
        }
    }

    pub fn performed(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    fn record(&self, action: &str) {
        self.actions.lock().unwrap().push(action.to_string());
    }
}

#[async_trait]
impl Computer for FakeComputer {
    fn environment(&self) -> Environment {
        Environment::Browser
    }

    fn dimensions(&self) -> (u32, u32) {
        (1280, 720)
    }

    async fn screenshot(&self) -> std::result::Result<String, ToolError> {
        self.record("screenshot");
        Ok("iVBORw0KGgo=".to_string())
    }

    async fn click(
        &self,
        x: i64,
        y: i64,
        _button: MouseButton,
    ) -> std::result::Result<(), ToolError> {
        self.record(&format!("click:{x},{y}"));
        Ok(())
    }

    async fn double_click(&self, x: i64, y: i64) -> std::result::Result<(), ToolError> {
        self.record(&format!("double_click:{x},{y}"));
        Ok(())
    }

    async fn drag(&self, path: &[Point]) -> std::result::Result<(), ToolError> {
        self.record(&format!("drag:{}", path.len()));
        Ok(())
    }

    async fn keypress(&self, keys: &[String]) -> std::result::Result<(), ToolError> {
        self.record(&format!("keypress:{}", keys.join("+")));
        Ok(())
    }

    async fn move_mouse(&self, x: i64, y: i64) -> std::result::Result<(), ToolError> {
        self.record(&format!("move:{x},{y}"));
        Ok(())
    }

    async fn scroll(
        &self,
        _x: i64,
        _y: i64,
        scroll_x: i64,
        scroll_y: i64,
    ) -> std::result::Result<(), ToolError> {
        self.record(&format!("scroll:{scroll_x},{scroll_y}"));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> std::result::Result<(), ToolError> {
        self.record(&format!("type:{text}"));
        Ok(())
    }

    async fn wait(&self) -> std::result::Result<(), ToolError> {
        self.record("wait");
        Ok(())
    }
}

/// A tool server exposing a fixed set of tools over the protocol boundary.
pub struct FakeToolServer {
    pub fail_calls: bool,
}

#[async_trait]
impl ToolServer for FakeToolServer {
    fn name(&self) -> &str {
        "fake-server"
    }

    async fn list_tools(&self) -> std::result::Result<Vec<ToolDefinition>, ToolError> {
        Ok(vec![ToolDefinition::new(
            "server_echo",
            "Echo from the server.",
            serde_json::json!({
                "type": "object",
                "properties": { "message": { "type": "string" } },
                "required": ["message"]
            }),
        )])
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<Value, ToolError> {
        if self.fail_calls {
            return Err(ToolError::server("server unavailable"));
        }
        match name {
            "server_echo" => Ok(arguments
                .get("message")
                .cloned()
                .unwrap_or(Value::Null)),
            other => Err(ToolError::not_found(other)),
        }
    }
}
