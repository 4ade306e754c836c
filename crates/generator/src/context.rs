//! Context packing (§4.10): system prompt, ship-parameter/practical-
//! knowledge blocks and per-document evidence blocks, injected as a
//! sequence of system messages ahead of the conversation turns, mirroring
//! the context-message-per-section convention the prompt builder this
//! crate is grounded on uses for its own RAG/personalization blocks.

use std::collections::HashMap;

use bv_rag_config::constants::generator::CONTEXT_BLOCK_CHAR_LIMIT;
use bv_rag_core::{ChatMessage, QueryClassification};
use bv_rag_rag::RankedHit;

use crate::GenerationRequest;

const SYSTEM_PROMPT: &str = r#"You are a marine regulatory surveyor assistant. Marine surveyors rely on
your answers to check compliance against IMO conventions, classification
society rules and IACS requirements, so accuracy and traceability matter
more than fluency.

## Non-negotiable rules
1. Lead with your conclusion, then support it.
2. Every factual claim must cite the regulation it comes from using the
   bracketed form `[Document Reg/N.n.m]`.
3. If the retrieved evidence is insufficient to answer, say so explicitly.
   Never invent a numeric value, table entry or regulation number that is
   not present in the evidence below.
4. If the retrieved evidence comes from a regulation branch that does not
   match the ship type in question (for example a tanker question
   answered from a non-tanker branch), refuse or explicitly flag the
   mismatch instead of answering as if it applied.
5. Distinguish mandatory ("shall") language from recommended ("should")
   language; do not blur the two.
6. Reply in the language the surveyor asked in, but keep regulatory terms
   (document titles, chapter/regulation numbers) in their original
   English form."#;

/// Packs one sequence of `ChatMessage`s: the system prompt and evidence
/// sections, the prior conversation, and `enhanced_query` as the final
/// user turn. `estimate_tokens` is the chosen model's own estimator, so
/// the cumulative budget matches what that model will actually see.
pub fn pack_messages(
    req: &GenerationRequest<'_>,
    max_context_tokens: usize,
    estimate_tokens: impl Fn(&str) -> usize,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(req.conversation.len() + 4);
    let mut budget_used = estimate_tokens(SYSTEM_PROMPT);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));

    if let Some(prefs) = req.user_preferences.filter(|p| !p.is_empty()) {
        push_block(&mut messages, &mut budget_used, &estimate_tokens, max_context_tokens, prefs);
    }

    if let Some(ship_block) = ship_parameter_block(req.classification).filter(|b| !b.is_empty()) {
        push_block(&mut messages, &mut budget_used, &estimate_tokens, max_context_tokens, &ship_block);
    }

    if !req.knowledge.is_empty() {
        let knowledge_block = req
            .knowledge
            .iter()
            .map(|m| m.entry.to_markdown())
            .collect::<Vec<_>>()
            .join("\n");
        push_block(&mut messages, &mut budget_used, &estimate_tokens, max_context_tokens, &knowledge_block);
    }

    let evidence = evidence_blocks(req.candidates, req.has_graph_interpretations);
    for block in &evidence {
        if budget_used >= max_context_tokens {
            break;
        }
        push_block(&mut messages, &mut budget_used, &estimate_tokens, max_context_tokens, block);
    }

    messages.extend(req.conversation.iter().cloned());
    messages.push(ChatMessage::user(req.enhanced_query));

    messages
}

fn push_block(
    messages: &mut Vec<ChatMessage>,
    budget_used: &mut usize,
    estimate_tokens: &impl Fn(&str) -> usize,
    max_context_tokens: usize,
    block: &str,
) {
    let cost = estimate_tokens(block);
    if *budget_used + cost > max_context_tokens {
        return;
    }
    *budget_used += cost;
    messages.push(ChatMessage::system(block.to_string()));
}

fn ship_parameter_block(classification: &QueryClassification) -> Option<String> {
    let info = &classification.ship_info;
    if info.ship_type.is_none() && info.length_metres.is_none() && info.tonnage.is_none() {
        return None;
    }
    let mut lines = vec!["## Ship parameters".to_string()];
    if let Some(ref t) = info.ship_type {
        lines.push(format!("Ship type: {t}"));
    }
    if let Some(l) = info.length_metres {
        lines.push(format!("Length: {l} m"));
    }
    if let Some(t) = info.tonnage {
        lines.push(format!("Gross tonnage: {t}"));
    }
    Some(lines.join("\n"))
}

/// Groups candidates by document and renders one `**[breadcrumb]**
/// (Source: URL)\n{text}` block per document, truncated at
/// `CONTEXT_BLOCK_CHAR_LIMIT`. Appends a one-line interpretation hint
/// when the retriever's graph leg contributed any hits.
fn evidence_blocks(candidates: &[RankedHit], has_graph_interpretations: bool) -> Vec<String> {
    let mut by_document: HashMap<&str, Vec<&RankedHit>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for hit in candidates {
        let document = hit.metadata.get("document").map(String::as_str).unwrap_or("unknown");
        if !by_document.contains_key(document) {
            order.push(document);
        }
        by_document.entry(document).or_default().push(hit);
    }

    let mut blocks: Vec<String> = order
        .into_iter()
        .map(|document| {
            let hits = &by_document[document];
            let mut block = String::new();
            for hit in hits.iter() {
                let breadcrumb = hit.metadata.get("breadcrumb").map(String::as_str).unwrap_or(document);
                let url = hit.metadata.get("url").map(String::as_str).unwrap_or("");
                let mut text = hit.text.clone();
                if text.chars().count() > CONTEXT_BLOCK_CHAR_LIMIT {
                    text = text.chars().take(CONTEXT_BLOCK_CHAR_LIMIT).collect::<String>();
                    text.push('\u{2026}');
                }
                block.push_str(&format!("**[{breadcrumb}]** (Source: {url})\n{text}\n\n"));
            }
            block
        })
        .collect();

    if has_graph_interpretations {
        blocks.push(
            "Note: an interpretive circular related to this topic exists in the reference graph; \
             check whether it affects the applicable reading before answering."
                .to_string(),
        );
    }

    blocks
}

pub fn has_graph_interpretations(candidates: &[RankedHit]) -> bool {
    candidates.iter().any(|c| c.source == bv_rag_rag::HitSource::Graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_rag_core::{EnhancedQuery, Intent, ShipInfo};

    fn classification() -> QueryClassification {
        QueryClassification {
            intent: Intent::Specification,
            top_k: 5,
            model_hint: bv_rag_core::ModelHint::Fast,
            ship_info: ShipInfo { ship_type: Some("tanker".into()), length_metres: Some(120.0), tonnage: None },
            concept_hint: None,
        }
    }

    #[test]
    fn test_ship_parameter_block_includes_type_and_length() {
        let block = ship_parameter_block(&classification()).unwrap();
        assert!(block.contains("tanker"));
        assert!(block.contains("120"));
    }

    #[test]
    fn test_evidence_blocks_group_by_document() {
        let mut meta_a = HashMap::new();
        meta_a.insert("document".to_string(), "SOLAS".to_string());
        meta_a.insert("breadcrumb".to_string(), "SOLAS > II-2 > Reg 9".to_string());
        meta_a.insert("url".to_string(), "https://example/solas".to_string());

        let candidates = vec![RankedHit {
            chunk_id: "c1".into(),
            text: "Fire integrity requirements.".into(),
            score: 0.9,
            metadata: meta_a,
            source: bv_rag_rag::HitSource::Dense,
        }];

        let blocks = evidence_blocks(&candidates, false);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("SOLAS > II-2 > Reg 9"));
        assert!(blocks[0].contains("Fire integrity"));
    }

    #[test]
    fn test_pack_messages_ends_with_enhanced_query() {
        let classification = classification();
        let enhanced = EnhancedQuery {
            enhanced_text: "what applies".into(),
            matched_terms: Vec::new(),
            regulation_hints: Vec::new(),
        };
        let req = GenerationRequest {
            classification: &classification,
            enhanced: &enhanced,
            candidates: &[],
            knowledge: &[],
            conversation: &[],
            enhanced_query: "what applies to a 120m tanker?",
            user_preferences: None,
            has_graph_interpretations: false,
        };

        let messages = pack_messages(&req, 8192, |t| t.chars().count() / 4 + 1);
        assert_eq!(messages.last().unwrap().content, "what applies to a 120m tanker?");
    }
}
