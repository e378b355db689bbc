use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use chrono::{DateTime, Utc};
use futures::Stream;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    openai::OpenAI,
    qdrant::Qdrant,
    stream,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub(crate) fn now(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

pub(crate) struct ChatSession {
    pub(crate) asset_id: String,
    busy: AtomicBool,
    history: Mutex<Vec<ChatMessage>>,
}

impl ChatSession {
    fn new(asset_id: String) -> Self {
        Self {
            asset_id,
            busy: AtomicBool::new(false),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Claims the session's single exchange slot. The loser of a race
    /// observes [`Error::Busy`] without blocking.
    fn try_claim(self: &Arc<Self>) -> Result<BusyGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Ok(BusyGuard(self.clone()))
        } else {
            Err(Error::Busy)
        }
    }

    pub(crate) fn push(&self, message: ChatMessage) {
        self.history.lock().unwrap().push(message);
    }

    pub(crate) fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().unwrap().clone()
    }
}

/// Clears the busy flag when the exchange finishes, or when the response
/// stream is dropped mid-flight.
pub(crate) struct BusyGuard(Arc<ChatSession>);

impl BusyGuard {
    pub(crate) fn session(&self) -> Arc<ChatSession> {
        self.0.clone()
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::Release);
    }
}

/// Process-wide registry of chat threads. Sessions are created lazily and
/// never removed, so a thread id stays valid for the life of the process.
pub struct ChatRegistry {
    sessions: RwLock<HashMap<String, Arc<ChatSession>>>,
    openai: OpenAI,
    qdrant: Qdrant,
    transcript_dir: PathBuf,
}

impl ChatRegistry {
    /// # Errors
    ///
    /// Fails if the transcript directory cannot be created.
    pub fn new(openai: OpenAI, qdrant: Qdrant, transcript_dir: impl Into<PathBuf>) -> Result<Self> {
        let transcript_dir = transcript_dir.into();
        std::fs::create_dir_all(&transcript_dir)?;

        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            openai,
            qdrant,
            transcript_dir,
        })
    }

    /// Starts a chat thread bound to a processed asset.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AssetNotFound`] when the asset has no backing
    /// collection; no thread id is allocated in that case.
    pub async fn start_session(&self, asset_id: &str) -> Result<String> {
        if !self.qdrant.collection_exists(asset_id).await? {
            return Err(Error::AssetNotFound(asset_id.to_string()));
        }

        let thread_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(thread_id.clone(), Arc::new(ChatSession::new(asset_id.to_string())));

        info!("started chat thread {thread_id} for asset {asset_id}");

        Ok(thread_id)
    }

    /// Runs one message exchange, returning a stream of answer tokens.
    ///
    /// The busy flag is claimed before this returns, so of two racing
    /// callers the second gets [`Error::Busy`] immediately. The retrieval
    /// and generation calls happen inside the stream, outside any
    /// registry-level lock.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ThreadNotFound`] or [`Error::Busy`] up front;
    /// retrieval and generation failures surface as stream items.
    pub async fn send_message(
        &self,
        thread_id: &str,
        message: &str,
    ) -> Result<impl Stream<Item = Result<String>>> {
        let session = self.session(thread_id).await?;
        let guard = session.try_claim()?;

        debug!("claimed chat thread {thread_id}");

        Ok(stream::exchange(
            guard,
            self.openai.clone(),
            self.qdrant.clone(),
            self.transcript_path(thread_id),
            message.to_string(),
        ))
    }

    /// # Errors
    ///
    /// Fails with [`Error::ThreadNotFound`] for unknown thread ids.
    pub async fn status(&self, thread_id: &str) -> Result<bool> {
        let session = self.session(thread_id).await?;

        Ok(session.busy.load(Ordering::Acquire))
    }

    /// Returns the full message history, in arrival order.
    ///
    /// Threads from a previous run only exist as transcripts on disk, so
    /// ids missing from the registry fall back to those.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ThreadNotFound`] when the id is in neither.
    pub async fn history(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        if let Ok(session) = self.session(thread_id).await {
            return Ok(session.history());
        }

        // Thread ids are uuids; anything else must not reach the filesystem,
        // or a crafted id could read files outside the transcript dir.
        if Uuid::parse_str(thread_id).is_err() {
            return Err(Error::ThreadNotFound(thread_id.to_string()));
        }

        match tokio::fs::read(self.transcript_path(thread_id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(_) => Err(Error::ThreadNotFound(thread_id.to_string())),
        }
    }

    async fn session(&self, thread_id: &str) -> Result<Arc<ChatSession>> {
        self.sessions
            .read()
            .await
            .get(thread_id)
            .cloned()
            .ok_or_else(|| Error::ThreadNotFound(thread_id.to_string()))
    }

    fn transcript_path(&self, thread_id: &str) -> PathBuf {
        self.transcript_dir.join(format!("{thread_id}.json"))
    }
}

pub(crate) async fn save_transcript(path: &Path, history: &[ChatMessage]) -> Result<()> {
    tokio::fs::write(path, serde_json::to_vec_pretty(history)?).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::{
        io::{Read, Write},
        net::TcpListener,
    };

    fn registry(dir: &Path) -> ChatRegistry {
        std::env::set_var("QDRANT_URL", "http://localhost:6333");

        ChatRegistry::new(OpenAI::new(), Qdrant::new(), dir).unwrap()
    }

    /// A Qdrant that answers 404 to everything, like a server with no
    /// collections at all.
    fn empty_qdrant() -> Qdrant {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let mut stream = stream;
                let mut buffer = [0_u8; 1024];
                let _ = stream.read(&mut buffer);
                let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n");
            }
        });

        Qdrant::with_base_url(format!("http://{address}"))
    }

    fn exchange(session: &ChatSession, n: usize) {
        session.push(ChatMessage::now(Role::User, format!("question {n}")));
        session.push(ChatMessage::now(Role::Assistant, format!("answer {n}")));
    }

    #[tokio::test]
    async fn claim_is_exclusive_until_released() {
        let session = Arc::new(ChatSession::new("asset".to_string()));

        let guard = session.try_claim().unwrap();
        assert!(matches!(session.try_claim(), Err(Error::Busy)));

        drop(guard);
        assert!(session.try_claim().is_ok());
    }

    #[tokio::test]
    async fn racing_claims_have_a_single_winner() {
        let session = Arc::new(ChatSession::new("asset".to_string()));

        let claims = join_all((0..32).map(|_| {
            let session = session.clone();
            tokio::spawn(async move { session.try_claim() })
        }))
        .await;

        let winners = claims
            .into_iter()
            .filter(|c| matches!(c, Ok(Ok(_))))
            .count();

        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn history_grows_by_two_per_exchange_in_arrival_order() {
        let session = Arc::new(ChatSession::new("asset".to_string()));

        for n in 0..5 {
            exchange(&session, n);
        }

        let history = session.history();
        assert_eq!(history.len(), 10);

        for (n, pair) in history.chunks(2).enumerate() {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[0].content, format!("question {n}"));
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[1].content, format!("answer {n}"));
        }
    }

    #[tokio::test]
    async fn unknown_thread_ids_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        assert!(matches!(
            registry.status("missing").await,
            Err(Error::ThreadNotFound(_))
        ));
        assert!(matches!(
            registry.history("missing").await,
            Err(Error::ThreadNotFound(_))
        ));
        assert!(matches!(
            registry.send_message("missing", "hello").await.err(),
            Some(Error::ThreadNotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_asset_fails_without_registering_a_thread() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ChatRegistry::new(OpenAI::new(), empty_qdrant(), dir.path()).unwrap();

        let err = registry.start_session("ghost").await.unwrap_err();

        assert!(matches!(err, Error::AssetNotFound(id) if id == "ghost"));
        assert!(registry.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn history_falls_back_to_the_on_disk_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        let thread_id = Uuid::new_v4().to_string();

        let messages = vec![
            ChatMessage::now(Role::User, "hi".to_string()),
            ChatMessage::now(Role::Assistant, "hello".to_string()),
        ];
        save_transcript(&dir.path().join(format!("{thread_id}.json")), &messages)
            .await
            .unwrap();

        let loaded = registry.history(&thread_id).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].role, Role::User);
        assert_eq!(loaded[1].content, "hello");
        assert_eq!(loaded[0].timestamp, messages[0].timestamp);
    }

    #[tokio::test]
    async fn non_uuid_thread_ids_never_reach_the_transcript_dir() {
        let parent = tempfile::tempdir().unwrap();
        let transcripts = parent.path().join("transcripts");
        let registry = registry(&transcripts);

        let messages = vec![ChatMessage::now(Role::User, "secret".to_string())];
        save_transcript(&parent.path().join("secret.json"), &messages)
            .await
            .unwrap();

        assert!(matches!(
            registry.history("../secret").await,
            Err(Error::ThreadNotFound(_))
        ));
    }
}
