use std::path::PathBuf;

use async_fn_stream::try_fn_stream;
use futures::Stream;
use tracing::debug;

use crate::{
    chain::build_prompt,
    chat::{save_transcript, BusyGuard, ChatMessage, Role},
    error::Result,
    openai::OpenAI,
    qdrant::Qdrant,
};

const SEARCH_LIMIT: usize = 4;

/// Runs a single question/answer exchange against a claimed session,
/// yielding the answer word by word once generation completes.
pub(crate) fn exchange(
    guard: BusyGuard,
    openai: OpenAI,
    qdrant: Qdrant,
    transcript: PathBuf,
    message: String,
) -> impl Stream<Item = Result<String>> {
    try_fn_stream(|emitter| async move {
        let session = guard.session();

        session.push(ChatMessage::now(Role::User, message.clone()));

        let query = openai.raw_embed(&message).await?;
        let results = qdrant
            .collection(&session.asset_id)
            .query(query, SEARCH_LIMIT)
            .await?;

        if let Some(top) = results.first() {
            debug!("retrieved {} chunks, top score {:.3}", results.len(), top.score);
        }

        let history = session.history();
        let prompt = build_prompt(&message, &history[..history.len() - 1], &results);
        let answer = openai.complete(&prompt).await?;

        session.push(ChatMessage::now(Role::Assistant, answer.clone()));
        save_transcript(&transcript, &session.history()).await?;

        for word in answer.split_whitespace() {
            emitter.emit(format!("{word} ")).await;
        }

        drop(guard);

        Ok(())
    })
}
