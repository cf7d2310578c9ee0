//! Shared fixtures: a scripted completion provider and sample payloads

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::error::{mapping::map_provider_error, ErrorContext, Result, ServiceError};
use crate::services::{CompletionProvider, CompletionRequest};

/// What the scripted provider answers for one call
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Status(u16),
}

/// Provider that answers from per-model scripts and records every call
///
/// The last reply of a script repeats once the others are used up.
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<CompletionRequest>>,
    configured: bool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            configured: true,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn script(self, model: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(model.to_string(), replies.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_models(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.clone());

        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            let queue = scripts.get_mut(&request.model);
            match queue {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Status(status)) => {
                let status = StatusCode::from_u16(status).unwrap();
                Err(map_provider_error(
                    status,
                    "",
                    ErrorContext::for_service("scripted").model(request.model.as_str()),
                ))
            }
            None => Err(ServiceError::upstream(format!("model {} does not exist", request.model))),
        }
    }
}

/// Analysis payload for the "turned down a job offer" narrative
pub fn job_offer_analysis() -> Value {
    json!({
        "label": "Regret by Inaction",
        "confidence": 88,
        "intensity": 6.8,
        "affectedDomain": "Career",
        "emotionalTone": {"primary": "regretful", "secondary": ["stuck", "envious"]},
        "reflection": "Choosing safety made sense with what you knew then.",
        "perspective": "The startup's success was not knowable three years ago.",
        "currentImpact": "You feel undervalued in your current role.",
        "futureProjection": "Left alone, this may harden into risk aversion.",
        "irreversibleLimitation": "That particular equity window has closed.",
        "threatAnalysis": {
            "stress": {"level": "Medium", "score": 3},
            "anxiety": {"level": "Medium", "score": 3},
            "motivationLoss": {"level": "High", "score": 4},
            "healthRisk": {"level": "Low", "score": 2}
        },
        "insights": ["Inaction regrets grow with time", "You value security and growth"],
        "suggestions": ["Talk to your manager about growth", "Explore startup roles now"]
    })
}

pub fn fenced(value: &Value) -> String {
    format!("```json\n{}\n```", serde_json::to_string_pretty(value).unwrap())
}

/// Completion response body in the OpenAI wire format
pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 420, "completion_tokens": 310, "total_tokens": 730}
    })
}
