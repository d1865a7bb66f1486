use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{InvokeRequest, LlmClient, LlmError};

/// Answers from a fixed script and remembers every request.
/// An exhausted script yields `EmptyResponse`.
#[derive(Default)]
pub struct ScriptedLlm {
    answers: Mutex<VecDeque<Result<Value, LlmError>>>,
    calls: Mutex<Vec<InvokeRequest>>,
    always_fail: bool,
}

impl ScriptedLlm {
    pub fn new(answers: Vec<Result<Value, LlmError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<InvokeRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn invoke(&self, request: &InvokeRequest) -> Result<Value, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        if self.always_fail {
            return Err(LlmError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
