//! Three-layer, short-circuiting coreference resolution (§4.9). No
//! teacher analogue for the algorithm itself; turn formatting follows
//! the teacher's `ConversationTurn::format_for_context` convention and
//! the L3 rewrite follows the teacher's bounded single-shot cheap-model
//! call pattern (`memory::compressor`'s `Summarizer` trait).

use bv_rag_core::{ChatMessage, ChatModel, ConversationSession, TurnRole};
use bv_rag_config::domain::SharedDomainTables;
use regex::RegexSet;
use std::sync::Arc;

/// Result of coreference resolution: the (possibly rewritten) query plus
/// which layer produced it, for logging/debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreferenceLayer {
    /// L1 found no pronoun, or there is no working set to resolve against.
    Unchanged,
    /// L2 prefix injection (no external call).
    PrefixInjected,
    /// L3 accepted a cheap-model rewrite.
    ModelRewritten,
    /// L3 attempted but rejected the rewrite (too short/long, or call failed).
    ModelRewriteRejected,
}

pub struct CoreferenceOutcome {
    pub enhanced_query: String,
    pub layer: CoreferenceLayer,
}

/// L1: does `query` contain a pronoun/anaphor from the bilingual lexicon,
/// given a non-empty working set to resolve against?
fn l1_detect(tables: &SharedDomainTables, query: &str, session: &ConversationSession) -> bool {
    if session.active_regulations.is_empty() {
        return false;
    }
    let patterns = tables.read().pronoun_patterns.clone();
    let set = RegexSet::new(&patterns).expect("pronoun lexicon must compile as a RegexSet");
    set.is_match(query)
}

/// L2: prefix injection using the last assistant turn's retrieved
/// regulations, falling back to the session-level working set.
fn l2_prefix(query: &str, session: &ConversationSession) -> String {
    let regulations: Vec<String> = session
        .last_assistant_turn()
        .and_then(|turn| turn.metadata.get("retrieved_regulations"))
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .filter(|v: &Vec<String>| !v.is_empty())
        .unwrap_or_else(|| session.active_regulations.iter().cloned().collect());

    if regulations.is_empty() {
        return query.to_string();
    }

    format!("[Context: the previous question was about {}] {}", regulations.join(", "), query)
}

/// L3: single cheap-model call asking for a self-contained rewrite in
/// the user's language. Accepted only if the rewrite's length falls
/// within 0.3x-3x the original and is at least 5 characters.
async fn l3_rewrite(
    fast_model: &Arc<dyn ChatModel>,
    query: &str,
    session: &ConversationSession,
    recent_turns: usize,
) -> Option<String> {
    let context: String = session
        .turns
        .iter()
        .rev()
        .take(recent_turns)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|t| format!("{}: {}", role_label(t.role), t.content))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Conversation so far:\n{context}\n\nRewrite the following question as a \
         self-contained question in the same language, resolving any pronoun or \
         implicit reference to the conversation above. Reply with only the \
         rewritten question.\n\nQuestion: {query}"
    );

    let messages = vec![
        ChatMessage::system("You rewrite follow-up questions to be self-contained."),
        ChatMessage::user(prompt),
    ];

    let completion = fast_model.complete(&messages).await.ok()?;
    let rewrite = completion.text.trim().to_string();

    let original_len = query.chars().count() as f32;
    let rewrite_len = rewrite.chars().count() as f32;
    if rewrite.chars().count() < 5 {
        return None;
    }
    if rewrite_len < original_len * 0.3 || rewrite_len > original_len * 3.0 {
        return None;
    }
    Some(rewrite)
}

fn role_label(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "User",
        TurnRole::Assistant => "Assistant",
    }
}

/// Runs the three layers in order, short-circuiting at the first one
/// that resolves the query. `fast_model` is optional: when absent, L3
/// is skipped and an L2 result (or the unchanged query) is returned.
pub async fn resolve(
    tables: &SharedDomainTables,
    query: &str,
    session: &ConversationSession,
    fast_model: Option<&Arc<dyn ChatModel>>,
    recent_turns: usize,
) -> CoreferenceOutcome {
    if !l1_detect(tables, query, session) {
        return CoreferenceOutcome { enhanced_query: query.to_string(), layer: CoreferenceLayer::Unchanged };
    }

    let prefixed = l2_prefix(query, session);

    let Some(model) = fast_model else {
        return CoreferenceOutcome { enhanced_query: prefixed, layer: CoreferenceLayer::PrefixInjected };
    };

    match l3_rewrite(model, query, session, recent_turns).await {
        Some(rewrite) => CoreferenceOutcome { enhanced_query: rewrite, layer: CoreferenceLayer::ModelRewritten },
        None => CoreferenceOutcome { enhanced_query: prefixed, layer: CoreferenceLayer::ModelRewriteRejected },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_rag_config::domain::{shared, DomainTables};
    use chrono::Utc;
    use uuid::Uuid;

    fn session_with_regulations(regs: &[&str]) -> ConversationSession {
        let mut session = ConversationSession::new(Uuid::new_v4(), None, Utc::now());
        for r in regs {
            session.touch_regulation(r);
        }
        session
    }

    #[tokio::test]
    async fn test_no_pronoun_returns_unchanged() {
        let tables = shared(DomainTables::built_in());
        let session = session_with_regulations(&["SOLAS III/31"]);
        let outcome = resolve(&tables, "what is the tonnage threshold", &session, None, 6).await;
        assert_eq!(outcome.layer, CoreferenceLayer::Unchanged);
        assert_eq!(outcome.enhanced_query, "what is the tonnage threshold");
    }

    #[tokio::test]
    async fn test_empty_working_set_returns_unchanged() {
        let tables = shared(DomainTables::built_in());
        let session = ConversationSession::new(Uuid::new_v4(), None, Utc::now());
        let outcome = resolve(&tables, "does this apply to it?", &session, None, 6).await;
        assert_eq!(outcome.layer, CoreferenceLayer::Unchanged);
    }

    #[tokio::test]
    async fn test_pronoun_with_working_set_injects_prefix() {
        let tables = shared(DomainTables::built_in());
        let session = session_with_regulations(&["SOLAS III/31", "SOLAS II-1/3-6"]);
        let outcome = resolve(&tables, "does this apply to FPSO?", &session, None, 6).await;
        assert_eq!(outcome.layer, CoreferenceLayer::PrefixInjected);
        assert!(outcome.enhanced_query.starts_with("[Context: the previous question was about"));
        assert!(outcome.enhanced_query.contains("SOLAS III/31"));
    }
}
