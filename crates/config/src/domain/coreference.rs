//! Bilingual pronoun/anaphor lexicon for coreference layer 1 (§4.9).

/// Regex alternation fragments (already escaped where needed) detecting
/// a pronoun or anaphor referring back to prior conversation state. A
/// match here, with a non-empty active-regulations working set, triggers
/// layer 2 (prefix injection).
pub fn default_pronoun_patterns() -> Vec<String> {
    vec![
        "这个".into(), "那个".into(), "该".into(), "它".into(), "它们".into(),
        "前面".into(), "上面".into(), "上述".into(), "同样".into(), "这条".into(), "那条".into(),
        "this".into(), "that".into(), r"\bit\b".into(), "the above".into(), "same".into(),
        "aforementioned".into(), r"\bthese\b".into(), r"\bthose\b".into(),
    ]
}
