//! Runtime for executing conversations
//!
//! Each conversation is owned by one task that serializes user commands,
//! progress ticks and generation outcomes through the transition function.
//! Everyone else reads cloned snapshots.

mod executor;


pub use executor::ConversationRuntime;

use crate::form::Question;
use crate::generation::{FormGenerator, GenerationErrorKind};
use crate::progress::{ProgressConfig, ProgressStage};
use crate::state_machine::{ChatMessage, ConvContext, Event, Phase, TransitionError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch, RwLock};

/// Read-only copy of a conversation's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSnapshot {
    pub conversation_id: String,
    pub messages: Vec<ChatMessage>,
    pub phase: Phase,
    pub stage_index: usize,
    pub epoch: u64,
    pub committed_questions: Vec<Question>,
    pub stages: Vec<ProgressStage>,
}

impl ConversationSnapshot {
    /// Snapshot of a conversation nobody has touched yet
    pub fn initial(context: &ConvContext, stages: Vec<ProgressStage>) -> Self {
        Self {
            conversation_id: context.conversation_id.clone(),
            messages: Vec::new(),
            phase: Phase::Idle,
            stage_index: 0,
            epoch: 0,
            committed_questions: Vec::new(),
            stages,
        }
    }
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Snapshot { snapshot: ConversationSnapshot },
    GenerationDone {
        success: bool,
        question_count: usize,
        error_kind: Option<GenerationErrorKind>,
    },
    Error { message: String },
}

/// User command awaiting the transition result
pub struct Command {
    pub event: Event,
    pub reply: oneshot::Sender<Result<(), TransitionError>>,
}

/// Why a command was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Prompt is empty")]
    EmptyInput,
    #[error("Cannot submit while {phase}; reset the conversation first")]
    InvalidState { phase: Phase },
    #[error("Conversation runtime has stopped")]
    RuntimeStopped,
}

impl From<TransitionError> for SubmitError {
    fn from(error: TransitionError) -> Self {
        match error {
            TransitionError::EmptyInput => SubmitError::EmptyInput,
            TransitionError::InvalidState { phase } => SubmitError::InvalidState { phase },
        }
    }
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot_rx: watch::Receiver<ConversationSnapshot>,
}

impl ConversationHandle {
    /// Start a runtime task for `context` and return its handle.
    ///
    /// The task stops once every handle, including the one a
    /// [`RuntimeManager`] keeps, has been dropped.
    pub fn spawn<G>(context: ConvContext, generator: G, progress: ProgressConfig) -> Self
    where
        G: FormGenerator + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (snapshot_tx, snapshot_rx) = watch::channel(ConversationSnapshot::initial(
            &context,
            progress.stages(),
        ));

        let runtime = ConversationRuntime::new(
            context,
            generator,
            progress,
            command_rx,
            event_rx,
            event_tx,
            broadcast_tx.clone(),
            snapshot_tx,
        );
        tokio::spawn(runtime.run());

        Self {
            command_tx,
            broadcast_tx,
            snapshot_rx,
        }
    }

    /// Start generating a form from `prompt`
    pub async fn submit(&self, prompt: impl Into<String>) -> Result<(), SubmitError> {
        self.dispatch(Event::Submit {
            prompt: prompt.into(),
        })
        .await
    }

    /// Reset and submit in one step
    pub async fn resubmit(&self, prompt: impl Into<String>) -> Result<(), SubmitError> {
        self.dispatch(Event::Resubmit {
            prompt: prompt.into(),
        })
        .await
    }

    /// Return the conversation to its initial empty state
    pub async fn reset(&self) -> Result<(), SubmitError> {
        self.dispatch(Event::Reset).await
    }

    async fn dispatch(&self, event: Event) -> Result<(), SubmitError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command { event, reply })
            .await
            .map_err(|_| SubmitError::RuntimeStopped)?;
        reply_rx
            .await
            .map_err(|_| SubmitError::RuntimeStopped)?
            .map_err(SubmitError::from)
    }

    /// Current state of the conversation
    pub fn snapshot(&self) -> ConversationSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver that observes every published snapshot
    #[cfg(test)]
    pub fn watch(&self) -> watch::Receiver<ConversationSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Subscribe to SSE events
    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Manager for all conversation runtimes
pub struct RuntimeManager {
    generator: Arc<dyn FormGenerator>,
    progress: ProgressConfig,
    runtimes: RwLock<HashMap<String, ConversationHandle>>,
}

impl RuntimeManager {
    pub fn new(generator: Arc<dyn FormGenerator>, progress: ProgressConfig) -> Self {
        Self {
            generator,
            progress,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Start a fresh conversation
    pub async fn create(&self) -> (String, ConversationHandle) {
        let conversation_id = uuid::Uuid::new_v4().to_string();
        let context = ConvContext::new(&conversation_id, self.progress.max_stage);
        let handle = ConversationHandle::spawn(context, Arc::clone(&self.generator), self.progress);

        self.runtimes
            .write()
            .await
            .insert(conversation_id.clone(), handle.clone());

        tracing::info!(conv_id = %conversation_id, "Created conversation");
        (conversation_id, handle)
    }

    /// Forget a conversation. Its runtime stops once callers drop their handles.
    pub async fn remove(&self, conversation_id: &str) -> bool {
        let removed = self.runtimes.write().await.remove(conversation_id).is_some();
        if removed {
            tracing::info!(conv_id = %conversation_id, "Removed conversation");
        }
        removed
    }

    /// Look up a running conversation
    pub async fn get(&self, conversation_id: &str) -> Option<ConversationHandle> {
        self.runtimes.read().await.get(conversation_id).cloned()
    }

    /// Stage labels shared by every conversation
    pub fn stages(&self) -> Vec<ProgressStage> {
        self.progress.stages()
    }
}
