//! Removal of model reasoning markup from completion text.
//!
//! Reasoning models such as Qwen3 emit their chain of thought inside
//! `<think>...</think>` before the actual answer. Those blocks are dropped
//! before the reply is shown or stored.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

static THINK_BLOCK: OnceLock<Regex> = OnceLock::new();

fn think_block() -> &'static Regex {
    // `(?s)` lets a block span lines; `.*?` pairs each opener with the next closer.
    THINK_BLOCK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("static regex"))
}

/// Remove every `<think>...</think>` block, tags included.
///
/// Matching is case-sensitive and non-nesting. Text without a complete block
/// is returned unchanged; whitespace is left for the caller to trim.
pub fn strip_reasoning(text: &str) -> Cow<'_, str> {
    think_block().replace_all(text, "")
}
