//! Ties provider construction, selection, and tracing together behind one
//! entry point used by the agent orchestrator and the scheduler's report
//! summary call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use hydra_core::config::AiConfig;
use rusqlite::Connection;

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};
use crate::{registry, selection, tracer};

pub struct AiGateway {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    preferred: String,
    db: Arc<Mutex<Connection>>,
}

impl AiGateway {
    pub fn new(config: &AiConfig, db: Connection) -> rusqlite::Result<Self> {
        tracer::init_db(&db)?;
        Ok(Self {
            providers: registry::build_providers(&config.providers),
            preferred: config.provider.clone(),
            db: Arc::new(Mutex::new(db)),
        })
    }

    pub fn is_available(&self) -> bool {
        selection::select(&self.providers, &self.preferred, false).is_some()
    }

    /// Single-shot text call.
    pub async fn call(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.dispatch(req, false).await
    }

    /// Function-calling call.
    pub async fn call_with_tools(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.dispatch(req, true).await
    }

    async fn dispatch(&self, req: &ChatRequest, with_tools: bool) -> Result<ChatResponse, ProviderError> {
        let require_tools = with_tools && !req.tools.is_empty();
        let provider = selection::select(&self.providers, &self.preferred, require_tools)
            .ok_or_else(|| ProviderError::Unavailable("no AI provider configured".to_string()))?;

        let prompt_text: String = req.messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join(" ");
        let prompt_tokens_est = tracer::estimate_tokens(&prompt_text);
        let started = Instant::now();

        let result = if with_tools { provider.call_with_tools(req).await } else { provider.call(req).await };
        let duration_ms = started.elapsed().as_millis();

        let success = result.is_ok();
        let model = req.model.clone().unwrap_or_else(|| provider.default_model().to_string());
        let response_tokens_est = result.as_ref().map(|r| tracer::estimate_tokens(&r.content)).unwrap_or(0);
        let tool_call_summary = result
            .as_ref()
            .map(|r| r.tool_calls.iter().map(|tc| tc.name.clone()).collect::<Vec<_>>().join(","))
            .unwrap_or_default();

        let trace = tracer::CallTrace {
            provider: provider.name().to_string(),
            model,
            prompt_tokens_est,
            response_tokens_est,
            duration_ms,
            success,
            tool_call_summary,
        };
        if let Ok(conn) = self.db.lock() {
            let _ = tracer::record(&conn, &trace);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_gateway_reports_not_available() {
        let config = AiConfig::default();
        let gateway = AiGateway::new(&config, Connection::open_in_memory().unwrap()).unwrap();
        assert!(!gateway.is_available());
    }
}
