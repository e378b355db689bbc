use indoc::formatdoc;

use crate::{chat::ChatMessage, qdrant::PointResult};

/// Folds retrieved extracts and the conversation so far into a single
/// completion prompt.
#[must_use]
pub fn build_prompt(question: &str, history: &[ChatMessage], sources: &[PointResult]) -> String {
    let extracts = sources
        .iter()
        .map(|p| p.payload.text.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n");

    let transcript = history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    formatdoc!(
        "You are answering questions about a document the user uploaded. Use only the extracts below.
        If the answer is not contained in them, say you don't know. Don't make up an answer and don't
        answer questions unrelated to the document.

        EXTRACTS:
        {extracts}

        CONVERSATION SO FAR:
        {transcript}

        QUESTION: {question}
        ANSWER:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chat::Role,
        qdrant::{ChunkPayload, PointResult},
    };

    fn point(text: &str) -> PointResult {
        PointResult {
            id: "0".to_string(),
            score: 0.9,
            payload: ChunkPayload {
                text: text.to_string(),
                source: "notes.txt".to_string(),
                chunk_index: 0,
            },
        }
    }

    #[test]
    fn prompt_contains_question_extracts_and_history() {
        let history = vec![
            ChatMessage::now(Role::User, "What is this?".to_string()),
            ChatMessage::now(Role::Assistant, "A test document.".to_string()),
        ];

        let prompt = build_prompt(
            "Who wrote it?",
            &history,
            &[point("Written by the test suite.")],
        );

        assert!(prompt.contains("QUESTION: Who wrote it?"));
        assert!(prompt.contains("Written by the test suite."));
        assert!(prompt.contains("user: What is this?"));
        assert!(prompt.contains("assistant: A test document."));
    }

    #[test]
    fn prompt_renders_without_prior_turns() {
        let prompt = build_prompt("First question?", &[], &[point("extract")]);

        assert!(prompt.contains("QUESTION: First question?"));
        assert!(prompt.ends_with("ANSWER:"));
    }
}
