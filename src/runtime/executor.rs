//! Conversation runtime executor

use super::{Command, ConversationSnapshot, SseEvent};

use crate::generation::FormGenerator;
use crate::progress::{ProgressConfig, ProgressSimulator, ProgressStage};
use crate::state_machine::{
    transition, ChatMessage, ConvContext, ConvState, Effect, Event, TransitionError,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Single writer of one conversation's state and message log
pub struct ConversationRuntime<G>
where
    G: FormGenerator + 'static,
{
    context: ConvContext,
    state: ConvState,
    /// Append-only between resets
    messages: Vec<ChatMessage>,
    /// Next message sequence number, never rewound
    next_sequence: u64,
    stages: Vec<ProgressStage>,
    generator: Arc<G>,
    progress: ProgressSimulator,
    command_rx: mpsc::Receiver<Command>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot_tx: watch::Sender<ConversationSnapshot>,
}

impl<G> ConversationRuntime<G>
where
    G: FormGenerator + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: ConvContext,
        generator: G,
        progress: ProgressConfig,
        command_rx: mpsc::Receiver<Command>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        snapshot_tx: watch::Sender<ConversationSnapshot>,
    ) -> Self {
        Self {
            context,
            state: ConvState::default(),
            messages: Vec::new(),
            next_sequence: 1,
            stages: progress.stages(),
            generator: Arc::new(generator),
            progress: ProgressSimulator::new(progress),
            command_rx,
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(conv_id = %self.context.conversation_id, "Starting conversation runtime");

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    // Every handle is gone
                    let Some(Command { event, reply }) = command else {
                        break;
                    };
                    let result = self.process_event(event);
                    let _ = reply.send(result);
                }
                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::error!(
                            conv_id = %self.context.conversation_id,
                            error = %e,
                            "Error handling event"
                        );
                        let _ = self.broadcast_tx.send(SseEvent::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        self.progress.stop();
        tracing::info!(conv_id = %self.context.conversation_id, "Conversation runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let event_name = event.name();
        if let Some(epoch) = event.epoch().filter(|epoch| *epoch != self.state.epoch) {
            tracing::debug!(
                conv_id = %self.context.conversation_id,
                event = event_name,
                epoch,
                current_epoch = self.state.epoch,
                "Dropping stale event"
            );
        }
        let result = match transition(&self.state, &self.context, event) {
            Ok(result) => result,
            Err(e) => {
                tracing::info!(
                    conv_id = %self.context.conversation_id,
                    event = event_name,
                    phase = %self.state.phase,
                    error = %e,
                    "Rejected event"
                );
                return Err(e);
            }
        };

        if result.new_state != self.state {
            tracing::debug!(
                conv_id = %self.context.conversation_id,
                event = event_name,
                from = %self.state.phase,
                to = %result.new_state.phase,
                epoch = result.new_state.epoch,
                stage = result.new_state.stage_index,
                "State transition"
            );
        }
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    /// Execute an effect. Anything slow is spawned and reports back as an event.
    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage { role, content } => {
                let message = ChatMessage {
                    id: uuid::Uuid::new_v4().to_string(),
                    sequence: self.next_sequence,
                    role,
                    content,
                    timestamp: Utc::now(),
                };
                self.next_sequence += 1;
                self.messages.push(message);
            }

            Effect::ClearMessages => {
                self.messages.clear();
            }

            Effect::StartProgress { epoch } => {
                self.progress.start(epoch, self.event_tx.clone());
            }

            Effect::StopProgress => {
                if self.progress.is_running() {
                    tracing::debug!(conv_id = %self.context.conversation_id, "Stopping progress");
                }
                self.progress.stop();
            }

            Effect::RequestGeneration { epoch, prompt } => {
                let generator = Arc::clone(&self.generator);
                let event_tx = self.event_tx.clone();
                let conv_id = self.context.conversation_id.clone();

                // Not cancelled by reset; the outcome is dropped as stale instead
                tokio::spawn(async move {
                    tracing::info!(conv_id = %conv_id, epoch, "Requesting form generation (background)");

                    let event = match generator.generate(&prompt).await {
                        Ok(questions) => Event::GenerationComplete { epoch, questions },
                        Err(error) => {
                            tracing::warn!(
                                conv_id = %conv_id,
                                epoch,
                                kind = ?error.kind,
                                error = %error,
                                "Form generation failed"
                            );
                            Event::GenerationFailed { epoch, error }
                        }
                    };

                    if event_tx.send(event).await.is_err() {
                        tracing::debug!(conv_id = %conv_id, epoch, "Runtime gone before generation finished");
                    }
                });
            }

            Effect::PublishSnapshot => {
                let snapshot = self.snapshot();
                self.snapshot_tx.send_replace(snapshot.clone());
                let _ = self.broadcast_tx.send(SseEvent::Snapshot { snapshot });
            }

            Effect::NotifyGenerationDone {
                success,
                question_count,
                error_kind,
            } => {
                let _ = self.broadcast_tx.send(SseEvent::GenerationDone {
                    success,
                    question_count,
                    error_kind,
                });
            }
        }
    }

    fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            conversation_id: self.context.conversation_id.clone(),
            messages: self.messages.clone(),
            phase: self.state.phase,
            stage_index: self.state.stage_index,
            epoch: self.state.epoch,
            committed_questions: self.state.committed_questions.clone(),
            stages: self.stages.clone(),
        }
    }
}
