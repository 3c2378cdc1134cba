use std::time::Duration;

use async_trait::async_trait;
use planbot_protocol::Document;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::EnrichmentConfig;

/// Best-effort generator of a contextual reply for a matched plan. Any
/// failure is reported as `None`.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, plan: &Document, full_text: &str) -> Option<String>;
}

/// Always falls back to the static reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnrichment;

#[async_trait]
impl Enricher for NoEnrichment {
    async fn enrich(&self, _plan: &Document, _full_text: &str) -> Option<String> {
        None
    }
}

const SYSTEM_PROMPT: &str = "You are the WarrenPlanBot, an expert Reddit bot that is trusted \
around the world to answer questions about Senator Warren's plans. You are kind and optimistic, \
and support Elizabeth Warren for president.

Always answer the query using the provided context information, and not prior knowledge.
Some rules to follow:
1. Never directly reference the given context in your answer.
2. Avoid statements like 'Based on the context, ...' or 'The context information ...' or 'the \
relevant plan' or anything along those lines.
3. Include information about the plan provided in the given context";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Prompt carrying the plan's title, summary and full text plus the user's
/// whole message.
#[must_use]
pub fn plan_context_prompt(plan: &Document, user_input: &str) -> String {
    format!(
        "Context information is below.\n\n\
         ---------------------\n\n\
         The title of Senator Warren's plan: \"{}\"\n\n\
         A summary of this plan: {}\n\n\
         The full text of this plan is:\n\n{}\n\
         -----------\n\
         Given the context information and not prior knowledge, answer the question.\n\n\
         Query: {user_input}\n\
         Answer:\n",
        plan.display_title,
        plan.summary,
        plan.full_text.as_deref().unwrap_or_default()
    )
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    finish_reason: Option<String>,
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-style chat-completions call at temperature 0.
#[derive(Debug, Clone)]
pub struct ChatCompletionEnricher {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionEnricher {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }

    /// Reads the bearer token from the configured environment variable.
    pub fn from_config(config: &EnrichmentConfig) -> reqwest::Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            log::warn!(
                "{} is not set; enrichment requests will be unauthenticated",
                config.api_key_env
            );
        }
        Self::new(&config.endpoint, &config.model, api_key)
    }

    async fn complete(&self, plan: &Document, full_text: &str) -> reqwest::Result<ChatResponse> {
        let prompt = plan_context_prompt(plan, full_text);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.0,
        };
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        request.send().await?.error_for_status()?.json().await
    }
}

#[async_trait]
impl Enricher for ChatCompletionEnricher {
    async fn enrich(&self, plan: &Document, full_text: &str) -> Option<String> {
        log::info!("Generating enriched reply for plan {}", plan.id);
        let response = match self.complete(plan, full_text).await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("Enrichment request failed: {err}");
                return None;
            }
        };
        let choice = response.choices.into_iter().next()?;
        if choice.finish_reason.as_deref() != Some("stop") {
            log::warn!(
                "Enrichment did not complete (finish_reason={:?})",
                choice.finish_reason
            );
            return None;
        }
        choice.message.content.filter(|text| !text.trim().is_empty())
    }
}
