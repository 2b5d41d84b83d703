use crate::config::DialogConfig;
use crate::event::TurnEvent;
use crate::gate::PauseGate;
use crate::prompt::build_system_prompt;
use crate::state::{DialogSnapshot, DialogState};
use colloquy_agent::{LlmClient, StreamEvent, TurnRequest};
use colloquy_core::{ColloquyError, ColloquyResult, DialogMessage};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// Ordered events of one stream; an `Err` item is always the last one.
pub type EventStream = ReceiverStream<ColloquyResult<TurnEvent>>;

type EventSender = mpsc::Sender<ColloquyResult<TurnEvent>>;

/// Pacing and buffering knobs that are not part of a dialog's config.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Wait between the end of one turn and the start of the next.
    pub inter_turn_delay: Duration,
    /// Capacity of the event channel between the loop and the transport.
    pub event_buffer: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            inter_turn_delay: Duration::from_millis(300),
            event_buffer: 64,
        }
    }
}

struct Inner {
    state: DialogState,
    /// A turn has started streaming but is not yet appended.
    turn_in_flight: bool,
    /// Bumped whenever a loop is started or stopped; a loop only commits
    /// turns while its generation is current.
    generation: u64,
}

/// Drives the alternating turns of one two-participant dialog.
///
/// The turn loop runs on its own task and reports through an [`EventStream`].
/// Control operations ([`pause`](Self::pause), [`resume`](Self::resume),
/// [`inject`](Self::inject)) may be called from other tasks at any time; the
/// shared state lock is never held across an await point.
pub struct DialogEngine {
    session_id: String,
    inner: Mutex<Inner>,
    gate: PauseGate,
    llm: Arc<LlmClient>,
    options: EngineOptions,
    task: Mutex<Option<AbortHandle>>,
}

impl DialogEngine {
    /// Fill in default role labels and compute both system prompts.
    pub fn new(
        session_id: impl Into<String>,
        mut config: DialogConfig,
        llm: Arc<LlmClient>,
        options: EngineOptions,
    ) -> Self {
        for participant in [&mut config.participant_a, &mut config.participant_b] {
            if participant.role_label.is_empty() {
                participant.role_label = participant.provider.default_label().to_string();
            }
        }
        let prompt_a = build_system_prompt(&config.participant_a, &config);
        let prompt_b = build_system_prompt(&config.participant_b, &config);
        config.participant_a.system_prompt = prompt_a;
        config.participant_b.system_prompt = prompt_b;

        Self {
            session_id: session_id.into(),
            inner: Mutex::new(Inner {
                state: DialogState::new(config),
                turn_in_flight: false,
                generation: 0,
            }),
            gate: PauseGate::new(),
            llm,
            options,
            task: Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Start the turn loop and return its events.
    ///
    /// Opening a new stream stops the loop feeding any previous one; a turn
    /// that was still streaming there is discarded and replayed.
    pub fn stream(self: &Arc<Self>) -> EventStream {
        let (tx, rx) = mpsc::channel(self.options.event_buffer.max(1));

        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.turn_in_flight = false;
            inner.generation
        };

        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move { engine.run(generation, tx).await });
        if let Some(previous) = self.task.lock().replace(handle.abort_handle()) {
            debug!(session_id = %self.session_id, "Replacing previous dialog stream");
            previous.abort();
        }

        ReceiverStream::new(rx)
    }

    /// Stop the running loop, if any, and drop its provider connection.
    pub fn shutdown(&self) {
        self.inner.lock().generation += 1;
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!(session_id = %self.session_id, "Dialog loop stopped");
        }
    }

    pub fn pause(&self) {
        self.gate.pause();
    }

    pub fn resume(&self) {
        self.gate.resume();
    }

    /// Flip the pause state and return the new value.
    pub fn toggle_pause(&self) -> bool {
        if self.gate.is_paused() {
            self.gate.resume();
            false
        } else {
            self.gate.pause();
            true
        }
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.lock().state.is_finished()
    }

    pub fn snapshot(&self) -> DialogSnapshot {
        let inner = self.inner.lock();
        DialogSnapshot {
            state: inner.state.clone(),
            finished: inner.state.is_finished(),
            paused: self.gate.is_paused(),
        }
    }

    /// Append a moderator message and, when it names a participant who is
    /// not up next, make that participant the next speaker.
    ///
    /// Role labels are matched as case-insensitive substrings, participant A
    /// first. Skipping a turn also raises `max_turns` by one so the number of
    /// model turns still to come is unchanged. A turn that is streaming counts
    /// as taken when deciding who is next.
    pub fn inject(&self, message: &str) -> ColloquyResult<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.state.is_finished() {
            return Err(ColloquyError::DialogAlreadyFinished);
        }

        let active = inner.state.current_participant().provider;
        inner
            .state
            .messages
            .push(DialogMessage::moderator(active, message));

        let lowered = message.to_lowercase();
        let addressed = [
            &inner.state.config.participant_a,
            &inner.state.config.participant_b,
        ]
        .iter()
        .position(|p| {
            let label = p.role_label.to_lowercase();
            !label.is_empty() && lowered.contains(&label)
        });

        if let Some(slot) = addressed {
            let next_turn = inner.state.current_turn + u32::from(inner.turn_in_flight);
            if next_turn as usize % 2 != slot {
                inner.state.current_turn += 1;
                inner.state.config.max_turns += 1;
                info!(
                    session_id = %self.session_id,
                    next_turn = next_turn + 1,
                    max_turns = inner.state.config.max_turns,
                    "Moderator addressed a participant, reordering turns"
                );
            }
        }

        Ok(())
    }

    async fn run(self: Arc<Self>, generation: u64, tx: EventSender) {
        info!(session_id = %self.session_id, "Dialog loop started");

        let result = self.drive(generation, &tx).await;

        {
            let mut inner = self.inner.lock();
            if inner.generation == generation {
                inner.turn_in_flight = false;
            }
        }

        match result {
            Ok(()) => debug!(session_id = %self.session_id, "Dialog loop ended"),
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "Dialog loop failed");
                let _ = tx.send(Err(e)).await;
            }
        }
    }

    /// The turn loop. Returns `Ok` when the dialog ends or the consumer goes
    /// away; provider failures propagate unchanged.
    async fn drive(&self, generation: u64, tx: &EventSender) -> ColloquyResult<()> {
        loop {
            let next = {
                let mut inner = self.inner.lock();
                if inner.generation != generation {
                    return Ok(());
                }
                if inner.state.is_finished() {
                    None
                } else {
                    inner.turn_in_flight = true;
                    let state = &inner.state;
                    Some((
                        state.current_turn,
                        state.current_participant().clone(),
                        state.messages.clone(),
                        state.config.token_delay(),
                    ))
                }
            };
            let Some((turn, participant, transcript, token_delay)) = next else {
                break;
            };

            debug!(
                session_id = %self.session_id,
                turn,
                provider = %participant.provider,
                "Turn started"
            );
            let started = TurnEvent::TurnStart {
                turn,
                provider: participant.provider,
                role_label: participant.role_label.clone(),
            };
            if !emit(tx, started).await {
                return Ok(());
            }

            let (mut tokens, reader) = self
                .llm
                .stream_tokens(TurnRequest {
                    system_prompt: &participant.system_prompt,
                    transcript: &transcript,
                    speaker: participant.provider,
                })
                .await?;

            while let Some(event) = tokens.recv().await {
                let StreamEvent::TextDelta { text } = event else {
                    continue;
                };
                if !self.checkpoint(tx).await {
                    return Ok(());
                }
                let token = TurnEvent::Token {
                    turn,
                    provider: participant.provider,
                    role_label: participant.role_label.clone(),
                    token: text,
                };
                if !emit(tx, token).await {
                    return Ok(());
                }
                if !token_delay.is_zero() {
                    tokio::time::sleep(token_delay).await;
                }
            }

            // The reader accumulates every forwarded delta; its text is the turn.
            let completion = reader.await.map_err(|e| {
                ColloquyError::ProviderUnavailable(format!("provider stream task failed: {e}"))
            })??;
            debug!(
                session_id = %self.session_id,
                turn,
                stop_reason = %completion.stop_reason,
                "Provider stream exhausted"
            );

            // End of stream is a token boundary too.
            if !self.checkpoint(tx).await {
                return Ok(());
            }

            let finished = {
                let mut inner = self.inner.lock();
                if inner.generation != generation {
                    return Ok(());
                }
                inner.state.messages.push(DialogMessage::model(
                    participant.provider,
                    participant.role_label.clone(),
                    completion.text.clone(),
                ));
                inner.state.current_turn += 1;
                inner.turn_in_flight = false;
                inner.state.is_finished()
            };

            let ended = TurnEvent::TurnEnd {
                turn,
                provider: participant.provider,
                role_label: participant.role_label,
                content: completion.text,
                finished,
            };
            if !emit(tx, ended).await {
                return Ok(());
            }
            if finished {
                break;
            }

            // A pause requested during the delay still holds the next turn.
            if !self.options.inter_turn_delay.is_zero() {
                tokio::time::sleep(self.options.inter_turn_delay).await;
            }
            if !self.checkpoint(tx).await {
                return Ok(());
            }
        }

        let total_turns = self.inner.lock().state.current_turn;
        info!(session_id = %self.session_id, total_turns, "Dialog finished");
        emit(tx, TurnEvent::DialogEnd { total_turns }).await;
        Ok(())
    }

    /// Suspend while paused. Returns `false` if the consumer went away.
    async fn checkpoint(&self, tx: &EventSender) -> bool {
        if self.gate.is_paused() {
            debug!(session_id = %self.session_id, "Dialog paused at checkpoint");
        }
        tokio::select! {
            _ = self.gate.wait_open() => !tx.is_closed(),
            _ = tx.closed() => false,
        }
    }
}

async fn emit(tx: &EventSender, event: TurnEvent) -> bool {
    tx.send(Ok(event)).await.is_ok()
}
