//! Scripted gateway that replays canned results.
//!
//! Used by the session and API test suites in place of the real provider.
//! Results are queued per operation and consumed in order; once a queue is
//! empty the fallback error (if any) is returned instead.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use guide_core::UploadedArtifact;

use crate::error::GatewayError;
use crate::{ChatSession, ChunkStream, ModelGateway};

/// One scripted chat turn.
#[derive(Debug, Clone)]
enum ScriptedTurn {
    /// The send succeeds and the reply yields these items in order.
    Reply(Vec<Result<String, GatewayError>>),
    /// The send itself fails.
    Fail(GatewayError),
}

#[derive(Debug, Default)]
struct ChatScript {
    turns: VecDeque<ScriptedTurn>,
    sent: Vec<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory [`ModelGateway`] driven by queued results.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    insights: Mutex<VecDeque<Result<String, GatewayError>>>,
    facts: Mutex<VecDeque<Result<String, GatewayError>>>,
    chat: Arc<Mutex<ChatScript>>,
    fallback: Option<GatewayError>,
    insight_calls: AtomicUsize,
    fact_calls: AtomicUsize,
    last_question: Mutex<Option<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `err` unless a queued result says otherwise.
    pub fn failing(err: GatewayError) -> Self {
        Self {
            fallback: Some(err),
            ..Self::default()
        }
    }

    pub fn with_insight(self, result: Result<String, GatewayError>) -> Self {
        lock(&self.insights).push_back(result);
        self
    }

    pub fn with_fact(self, result: Result<String, GatewayError>) -> Self {
        lock(&self.facts).push_back(result);
        self
    }

    pub fn with_facts<I, S>(self, facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.facts).extend(facts.into_iter().map(|f| Ok(f.into())));
        self
    }

    /// Queue a successful chat turn whose reply yields `chunks`.
    pub fn with_chat_reply<I, S>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = chunks.into_iter().map(|c| Ok(c.into())).collect();
        lock(&self.chat).turns.push_back(ScriptedTurn::Reply(items));
        self
    }

    /// Queue a chat turn whose reply fails after yielding `chunks`.
    pub fn with_chat_reply_then_error<I, S>(self, chunks: I, err: GatewayError) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<_> = chunks.into_iter().map(|c| Ok(c.into())).collect();
        items.push(Err(err));
        lock(&self.chat).turns.push_back(ScriptedTurn::Reply(items));
        self
    }

    /// Queue a chat turn whose send fails outright.
    pub fn with_chat_error(self, err: GatewayError) -> Self {
        lock(&self.chat).turns.push_back(ScriptedTurn::Fail(err));
        self
    }

    pub fn insight_calls(&self) -> usize {
        self.insight_calls.load(Ordering::SeqCst)
    }

    pub fn fact_calls(&self) -> usize {
        self.fact_calls.load(Ordering::SeqCst)
    }

    /// Messages sent through any chat handle opened from this gateway.
    pub fn sent_messages(&self) -> Vec<String> {
        lock(&self.chat).sent.clone()
    }

    /// The question attached to the most recent insight request.
    pub fn last_question(&self) -> Option<String> {
        lock(&self.last_question).clone()
    }

    fn exhausted(&self, what: &str) -> GatewayError {
        self.fallback
            .clone()
            .unwrap_or_else(|| GatewayError::Service(format!("no scripted {} left", what)))
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn generate_insight(&self, artifact: &UploadedArtifact) -> Result<String, GatewayError> {
        self.insight_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_question) = artifact.question.clone();
        let next = lock(&self.insights).pop_front();
        next.unwrap_or_else(|| Err(self.exhausted("insight")))
    }

    async fn generate_fact(&self) -> Result<String, GatewayError> {
        self.fact_calls.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.facts).pop_front();
        next.unwrap_or_else(|| Err(self.exhausted("fact")))
    }

    fn start_chat(&self) -> Box<dyn ChatSession> {
        Box::new(ScriptedChat {
            script: Arc::clone(&self.chat),
            fallback: self.fallback.clone(),
            history: Arc::new(AtomicUsize::new(0)),
        })
    }
}

/// Chat handle produced by [`ScriptedGateway`].
#[derive(Debug)]
pub struct ScriptedChat {
    script: Arc<Mutex<ChatScript>>,
    fallback: Option<GatewayError>,
    history: Arc<AtomicUsize>,
}

#[async_trait]
impl ChatSession for ScriptedChat {
    async fn send_turn(&mut self, message: &str) -> Result<ChunkStream, GatewayError> {
        let turn = {
            let mut script = lock(&self.script);
            script.sent.push(message.to_string());
            script.turns.pop_front()
        };

        let items = match turn {
            Some(ScriptedTurn::Reply(items)) => items,
            Some(ScriptedTurn::Fail(err)) => return Err(err),
            None => {
                return Err(self
                    .fallback
                    .clone()
                    .unwrap_or_else(|| GatewayError::Service("no scripted chat turn left".into())))
            }
        };

        // User turn, then the model turn once the reply has been handed out.
        self.history.fetch_add(2, Ordering::SeqCst);
        Ok(Box::pin(futures_util::stream::iter(items)))
    }

    fn history_len(&self) -> usize {
        self.history.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Tests
// =============================================================================
