//! Scripted LLM used by tests.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;

use super::client::{CompletionRequest, LlmClient};

#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_err(&self, msg: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Err(msg.into()));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<String> {
        self.requests.lock().unwrap().push(req);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
            None => Err(anyhow::anyhow!("no scripted reply left")),
        }
    }
}
