//! Dashboard Chat Service
//!
//! Answers questions about analyzed datasets by forwarding them to the
//! completion provider with a context block built from recent completed
//! analyses. Provider failures degrade to a fixed apology reply, so the chat
//! surface itself never errors; follow-up suggestions are keyword-routed from
//! the user's message and always capped at three.

use std::sync::Arc;

use tracing::warn;

use crate::ai::provider::CompletionProvider;
use crate::constants::chat;
use crate::storage::CompletedAnalysis;
use crate::types::KpiValue;

const SYSTEM_PROMPT: &str = "You are a business intelligence analyst assistant for a data \
dashboard. Answer questions about the user's analyzed datasets using the provided analysis \
context. Be concise and specific; cite figures from the context when they support your answer. \
If the context does not cover the question, say so rather than inventing numbers.";

const FALLBACK_MESSAGE: &str = "I'm sorry, I couldn't process your question right now. Please \
try again in a moment, or explore the dashboard for KPIs, trends, and insights from your \
latest analysis.";

/// Reply surfaced to the dashboard chat panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub message: String,
    pub suggestions: Vec<String>,
    /// True when the provider failed and the apology fallback was used
    pub fallback: bool,
}

pub struct ChatService {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl ChatService {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }

    /// Answer a user message against recent analysis context.
    pub async fn reply(&self, message: &str, context: &[CompletedAnalysis]) -> ChatReply {
        let suggestions = suggestions_for(message);

        let Some(provider) = &self.provider else {
            return ChatReply {
                message: FALLBACK_MESSAGE.to_string(),
                suggestions,
                fallback: true,
            };
        };

        let prompt = build_user_prompt(message, context);
        match provider.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(answer) => ChatReply {
                message: answer,
                suggestions,
                fallback: false,
            },
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "chat completion failed");
                ChatReply {
                    message: FALLBACK_MESSAGE.to_string(),
                    suggestions,
                    fallback: true,
                }
            }
        }
    }
}

/// Render the context block plus the user's question. Only the most recent
/// analyses are included, and only headline fields from each.
fn build_user_prompt(message: &str, context: &[CompletedAnalysis]) -> String {
    let mut prompt = String::new();

    if context.is_empty() {
        prompt.push_str("No analyses have completed yet.\n");
    } else {
        prompt.push_str("Recent analyses:\n");
        for entry in context.iter().take(chat::MAX_CONTEXT_ANALYSES) {
            let Some(payload) = &entry.analysis.payload else {
                continue;
            };
            prompt.push_str(&format!(
                "\n## {} ({} records)\n{}\n",
                entry.original_name, payload.summary.statistics.total_records,
                payload.summary.executive
            ));
            for kpi in payload.kpis.iter().take(chat::MAX_CONTEXT_KPIS) {
                let value = match &kpi.value {
                    KpiValue::Number(n) => n.to_string(),
                    KpiValue::Text(t) => t.clone(),
                };
                prompt.push_str(&format!(
                    "- {}: {}{}\n",
                    kpi.name,
                    value,
                    kpi.unit.as_deref().unwrap_or("")
                ));
            }
        }
    }

    prompt.push_str(&format!("\nQuestion: {}\n", message));
    prompt
}

/// Follow-up suggestions routed on the user's wording.
fn suggestions_for(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let picks: [&str; 3] = if lower.contains("trend") || lower.contains("forecast") {
        [
            "What drove the biggest monthly change?",
            "Is the trend seasonal?",
            "How does this compare to the overall average?",
        ]
    } else if lower.contains("kpi") || lower.contains("metric") {
        [
            "Which KPI needs the most attention?",
            "How is the data quality index calculated?",
            "Show me the highest-impact action items",
        ]
    } else {
        [
            "What are the key trends in my data?",
            "Which KPIs should I focus on?",
            "What actions do you recommend?",
        ]
    };
    picks
        .into_iter()
        .take(chat::MAX_SUGGESTIONS)
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile;
    use crate::types::{AnalysisRecord, InsightError, Result, RunStatus};
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct CannedProvider {
        answer: Option<String>,
    }

    #[async_trait]
    impl CompletionProvider for CannedProvider {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            match &self.answer {
                Some(answer) => {
                    assert!(user.contains("Question:"));
                    Ok(answer.clone())
                }
                None => Err(InsightError::Completion("boom".to_string())),
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn context_entry(name: &str) -> CompletedAnalysis {
        let mut rng = StdRng::seed_from_u64(4);
        let payload = profile::analyze(&[], name, 100, &mut rng);
        CompletedAnalysis {
            analysis: AnalysisRecord {
                id: "a1".to_string(),
                upload_id: "u1".to_string(),
                status: RunStatus::Completed,
                payload: Some(payload),
                created_at: chrono::Utc::now(),
                completed_at: Some(chrono::Utc::now()),
            },
            original_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_provider_answer_passes_through() {
        let service = ChatService::new(Some(Arc::new(CannedProvider {
            answer: Some("Revenue is trending up.".to_string()),
        })));
        let reply = service
            .reply("How is revenue?", &[context_entry("sales.csv")])
            .await;
        assert!(!reply.fallback);
        assert_eq!(reply.message, "Revenue is trending up.");
        assert_eq!(reply.suggestions.len(), 3);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let service = ChatService::new(Some(Arc::new(CannedProvider { answer: None })));
        let reply = service.reply("anything", &[]).await;
        assert!(reply.fallback);
        assert_eq!(reply.message, FALLBACK_MESSAGE);
        assert_eq!(reply.suggestions.len(), 3);
    }

    #[tokio::test]
    async fn test_no_provider_always_falls_back() {
        let service = ChatService::new(None);
        let reply = service.reply("hello", &[]).await;
        assert!(reply.fallback);
    }

    #[test]
    fn test_suggestions_route_on_keywords() {
        assert!(suggestions_for("show me the trend")[1].contains("seasonal"));
        assert!(suggestions_for("explain this KPI")[0].contains("KPI"));
        assert!(suggestions_for("hello")[0].contains("key trends"));
    }

    #[test]
    fn test_prompt_includes_context_headlines() {
        let prompt = build_user_prompt("How many records?", &[context_entry("sales.csv")]);
        assert!(prompt.contains("sales.csv"));
        assert!(prompt.contains("records"));
        assert!(prompt.contains("Question: How many records?"));
    }

    #[test]
    fn test_prompt_handles_empty_context() {
        let prompt = build_user_prompt("hi", &[]);
        assert!(prompt.contains("No analyses have completed yet."));
    }
}
