//! Turn addition and `build_llm_context` assembly (§4.9). Turn
//! formatting follows the teacher's `ConversationTurn::format_for_
//! context` convention (`role: content` lines); pre-summarization
//! follows the teacher's bounded single-shot cheap-model call pattern.

use bv_rag_config::domain::SharedDomainTables;
use bv_rag_core::{ChatMessage, ChatModel, ConversationSession, InputMode, Turn, TurnRole};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::coreference::{self, CoreferenceOutcome};

static REGULATION_REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([A-Z][A-Za-z\-]{1,12}(?:\s?[IVX]+(?:-\d+)?)?/\d+(?:\.\d+)*)\b")
        .expect("valid regex")
});

/// Appends a user turn, updating `active_ship_type`/`active_topics` by a
/// plain keyword scan against the domain tables' ship-type map and topic
/// hints.
pub fn append_user_turn(
    session: &mut ConversationSession,
    content: &str,
    input_mode: InputMode,
    tables: &SharedDomainTables,
    now: chrono::DateTime<chrono::Utc>,
) {
    let lower = content.to_lowercase();
    let tables = tables.read();

    if session.active_ship_type.is_none() {
        if let Some((_, canonical)) = tables.ship_type_map.iter().find(|(k, _)| lower.contains(k)) {
            session.active_ship_type = Some((*canonical).to_string());
        }
    }

    for hint in &tables.topic_hints {
        let topic = hint.trigger_term.to_lowercase();
        if lower.contains(&topic) && !session.active_topics.contains(&hint.trigger_term) {
            session.active_topics.push(hint.trigger_term.clone());
        }
    }

    session.turns.push(Turn::user(content, input_mode, now));
    session.last_activity = now;
}

/// Appends an assistant turn. Reads `metadata["retrieved_regulations"]`
/// and additionally regex-extracts citations from `answer_text`, pushing
/// all of them onto the working set with LRU trimming at
/// `MAX_ACTIVE_REGULATIONS`.
pub fn append_assistant_turn(
    session: &mut ConversationSession,
    answer_text: &str,
    metadata: std::collections::HashMap<String, serde_json::Value>,
    now: chrono::DateTime<chrono::Utc>,
) {
    let retrieved: Vec<String> = metadata
        .get("retrieved_regulations")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();

    let extracted: Vec<String> =
        REGULATION_REF_PATTERN.captures_iter(answer_text).map(|c| c[1].to_string()).collect();

    for reg in retrieved.into_iter().chain(extracted) {
        session.touch_regulation(&reg);
    }

    let mut turn = Turn::assistant(answer_text, now);
    turn.metadata = metadata;
    session.turns.push(turn);
    session.last_activity = now;
}

/// `build_llm_context(session, current_query)`: takes the most recent
/// `2 * max_turns` messages, pre-summarising the early portion with a
/// single cheap-model call bounded to `summary_token_budget` tokens if
/// the total exceeds that window, then runs coreference resolution.
/// Returns `(messages, enhanced_query)`.
pub async fn build_llm_context(
    tables: &SharedDomainTables,
    session: &ConversationSession,
    current_query: &str,
    max_turns: usize,
    summary_token_budget: usize,
    fast_model: Option<&Arc<dyn ChatModel>>,
    coreference_recent_turns: usize,
) -> (Vec<ChatMessage>, String) {
    let window = max_turns * 2;
    let mut messages = Vec::new();

    if session.turns.len() > window {
        let split = session.turns.len() - window;
        let (early, recent) = session.turns.split_at(split);
        if let Some(model) = fast_model {
            if let Some(summary) = summarize(model, early, summary_token_budget).await {
                messages.push(ChatMessage::system(format!("Earlier conversation summary: {summary}")));
            }
        }
        for turn in recent {
            messages.push(to_chat_message(turn));
        }
    } else {
        for turn in &session.turns {
            messages.push(to_chat_message(turn));
        }
    }

    let CoreferenceOutcome { enhanced_query, .. } =
        coreference::resolve(tables, current_query, session, fast_model, coreference_recent_turns).await;

    (messages, enhanced_query)
}

fn to_chat_message(turn: &Turn) -> ChatMessage {
    match turn.role {
        TurnRole::User => ChatMessage::user(turn.content.clone()),
        TurnRole::Assistant => ChatMessage::assistant(turn.content.clone()),
    }
}

async fn summarize(model: &Arc<dyn ChatModel>, turns: &[Turn], token_budget: usize) -> Option<String> {
    if turns.is_empty() {
        return None;
    }
    let transcript: String = turns
        .iter()
        .map(|t| format!("{}: {}", role_label(t.role), t.content))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Summarize the following conversation in at most {token_budget} tokens, \
         preserving regulation identifiers, ship parameters and any stated preferences:\n\n{transcript}"
    );
    let messages = vec![
        ChatMessage::system("You compress conversation history for a retrieval pipeline."),
        ChatMessage::user(prompt),
    ];
    model.complete(&messages).await.ok().map(|c| c.text.trim().to_string())
}

fn role_label(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "User",
        TurnRole::Assistant => "Assistant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_rag_config::domain::{shared, DomainTables};
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_append_user_turn_detects_ship_type() {
        let tables = shared(DomainTables::built_in());
        let mut session = ConversationSession::new(Uuid::new_v4(), None, Utc::now());
        append_user_turn(&mut session, "Does this apply to a tanker?", InputMode::Text, &tables, Utc::now());
        assert!(session.active_ship_type.is_some());
    }

    #[test]
    fn test_append_assistant_turn_extracts_citations() {
        let mut session = ConversationSession::new(Uuid::new_v4(), None, Utc::now());
        let mut metadata = std::collections::HashMap::new();
        metadata.insert("retrieved_regulations".to_string(), json!(["SOLAS III/31"]));
        append_assistant_turn(
            &mut session,
            "Per [SOLAS II-1/3-6], this does apply.",
            metadata,
            Utc::now(),
        );
        assert!(session.active_regulations.contains(&"SOLAS III/31".to_string()));
        assert!(session.active_regulations.iter().any(|r| r.contains("II-1/3-6")));
    }

    #[tokio::test]
    async fn test_build_llm_context_short_session_no_summary() {
        let tables = shared(DomainTables::built_in());
        let mut session = ConversationSession::new(Uuid::new_v4(), None, Utc::now());
        append_user_turn(&mut session, "What is SOLAS III/31?", InputMode::Text, &tables, Utc::now());
        let (messages, enhanced) =
            build_llm_context(&tables, &session, "What is SOLAS III/31?", 10, 200, None, 6).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(enhanced, "What is SOLAS III/31?");
    }
}
