//! Thread orchestrator: runs one conversation turn end to end
//!
//! A turn reads the thread, records the user message, trims the window,
//! composes the prompt, calls the model and records the reply. Turns on the
//! same thread are serialized; turns on different threads run concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use threadchat_llm::LlmService;
use tokio::sync::OwnedMutexGuard;
use tracing::Instrument;

use crate::domain::entities::{Message, ThreadId, TurnInput, TurnOutput, DEFAULT_LANGUAGE};
use crate::domain::prompt::{resolve_language, PromptTemplate};
use crate::domain::state::{TurnEvent, TurnState, TurnStateMachine};
use crate::domain::trim::{TrimPolicy, WindowUnit};
use crate::error::TurnError;
use crate::repository::HistoryStore;

/// Default bound on a single model call
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub trim: TrimPolicy,
    pub template: PromptTemplate,
    pub default_language: String,
    /// Model name passed to the service; empty selects the service default
    pub model: String,
    pub model_timeout: Duration,
    /// Remove the user message of a turn whose model call failed
    pub rollback_on_failure: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            trim: TrimPolicy::default(),
            template: PromptTemplate::default(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            model: String::new(),
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            rollback_on_failure: true,
        }
    }
}

impl OrchestratorConfig {
    /// Load orchestrator configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let max_units = match std::env::var("TRIM_MAX_UNITS") {
            Ok(v) => v
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("Invalid TRIM_MAX_UNITS: {}", v))?,
            Err(_) => defaults.trim.max_units,
        };
        if max_units < 2 {
            return Err(anyhow::anyhow!(
                "TRIM_MAX_UNITS must be at least 2 to fit an instruction and a user message"
            ));
        }

        let include_system = parse_bool("TRIM_INCLUDE_SYSTEM", defaults.trim.include_system)?;

        let unit = match std::env::var("TRIM_UNIT") {
            Ok(v) => v.parse::<WindowUnit>().map_err(anyhow::Error::msg)?,
            Err(_) => defaults.trim.unit,
        };

        let template = match std::env::var("SYSTEM_PROMPT") {
            Ok(custom) if !custom.trim().is_empty() => PromptTemplate::new(custom),
            _ => {
                let preset =
                    std::env::var("PROMPT_PRESET").unwrap_or_else(|_| "assistant".to_string());
                PromptTemplate::preset(&preset).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Unknown PROMPT_PRESET: {}. Supported presets: assistant, pirate",
                        preset
                    )
                })?
            }
        };

        let default_language = std::env::var("DEFAULT_LANGUAGE")
            .ok()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(defaults.default_language);

        let model_timeout = match std::env::var("MODEL_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(
                v.parse()
                    .map_err(|_| anyhow::anyhow!("Invalid MODEL_TIMEOUT_SECS: {}", v))?,
            ),
            Err(_) => defaults.model_timeout,
        };

        let rollback_on_failure =
            parse_bool("ROLLBACK_FAILED_TURNS", defaults.rollback_on_failure)?;

        Ok(Self {
            trim: TrimPolicy {
                max_units,
                include_system,
                unit,
            },
            template,
            default_language,
            model: std::env::var("LLM_MODEL").unwrap_or_default(),
            model_timeout,
            rollback_on_failure,
        })
    }
}

fn parse_bool(var: &str, default: bool) -> Result<bool> {
    match std::env::var(var) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid {}: {} (expected true or false)", var, v)),
        Err(_) => Ok(default),
    }
}


type ThreadLocks = Arc<Mutex<HashMap<ThreadId, Arc<tokio::sync::Mutex<()>>>>>;

/// Runs conversation turns against an injected store and model service
pub struct ThreadOrchestrator {
    store: Arc<dyn HistoryStore>,
    llm: Arc<dyn LlmService>,
    config: OrchestratorConfig,
    thread_locks: ThreadLocks,
}

impl ThreadOrchestrator {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        llm: Arc<dyn LlmService>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            llm,
            config,
            thread_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Full history of a thread; empty for unseen threads
    pub async fn history(&self, thread_id: &str) -> Result<Vec<Message>, TurnError> {
        let thread_id = ThreadId::parse(thread_id)?;
        Ok(self.store.get(&thread_id).await?)
    }

    /// Threads with recorded history
    pub async fn threads(&self) -> Result<Vec<ThreadId>, TurnError> {
        Ok(self.store.thread_ids().await?)
    }

    /// Run one turn: one user message in, one assistant reply out
    pub async fn invoke(&self, input: TurnInput) -> Result<TurnOutput, TurnError> {
        let thread_id = ThreadId::parse(input.thread_id)?;
        let user_message = Message::user(input.user_text)?;
        let language = resolve_language(input.language.as_deref(), &self.config.default_language);

        let span = tracing::info_span!("turn", thread_id = %thread_id, language = %language);
        self.run_turn(thread_id, user_message, language)
            .instrument(span)
            .await
    }

    fn thread_lock(&self, thread_id: &ThreadId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .thread_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(thread_id.clone()).or_default().clone()
    }

    async fn run_turn(
        &self,
        thread_id: ThreadId,
        user_message: Message,
        language: String,
    ) -> Result<TurnOutput, TurnError> {
        let lock = self.thread_lock(&thread_id).lock_owned().await;
        let mut guard = TurnGuard {
            store: self.store.clone(),
            locks: self.thread_locks.clone(),
            thread_id: thread_id.clone(),
            baseline: 0,
            restore_on_drop: false,
            lock: Some(lock),
        };

        let mut state = TurnState::Composing;

        let mut history = self.store.get(&thread_id).await?;
        guard.baseline = history.len();
        guard.restore_on_drop = self.config.rollback_on_failure;

        self.store.append(&thread_id, user_message.clone()).await?;
        history.push(user_message);

        let window = self.config.trim.apply(&history);
        if window.is_empty() {
            // Nothing sendable: the user message alone exceeds the window
            guard.release(true).await;
            return Err(TurnError::InvalidInput(
                "Message does not fit in the context window".to_string(),
            ));
        }

        tracing::debug!(
            history = history.len(),
            window = window.len(),
            "Trimmed history for model call"
        );

        let request = self
            .config
            .template
            .compose(window, &language)
            .into_request(&self.config.model);
        state = TurnStateMachine::transition(state, TurnEvent::PromptComposed)?;

        let outcome = match tokio::time::timeout(
            self.config.model_timeout,
            self.llm.complete(request),
        )
        .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "model call exceeded {}s timeout",
                self.config.model_timeout.as_secs_f32()
            )),
        };

        match outcome {
            Ok(response) => {
                state = TurnStateMachine::transition(state, TurnEvent::ReplyReceived)?;
                self.store
                    .append(&thread_id, Message::assistant(response.content.clone()))
                    .await?;
                guard.release(false).await;

                tracing::info!(
                    state = %state,
                    model = %response.model,
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    "Turn completed"
                );

                Ok(TurnOutput {
                    reply_text: response.content,
                })
            }
            Err(reason) => {
                state = TurnStateMachine::transition(state, TurnEvent::ModelFailed)?;
                guard.release(self.config.rollback_on_failure).await;

                tracing::warn!(
                    state = %state,
                    rolled_back = self.config.rollback_on_failure,
                    error = %reason,
                    "Turn failed"
                );

                Err(TurnError::ModelUnavailable(reason))
            }
        }
    }
}

/// Holds a thread's lock for the length of a turn.
///
/// Dropped without `release` (the turn was cancelled or bailed out early),
/// it restores the thread to `baseline` in a spawned task that keeps the
/// lock until the history is restored, so the next turn never sees the
/// abandoned user message.
struct TurnGuard {
    store: Arc<dyn HistoryStore>,
    locks: ThreadLocks,
    thread_id: ThreadId,
    baseline: usize,
    restore_on_drop: bool,
    lock: Option<OwnedMutexGuard<()>>,
}

impl TurnGuard {
    /// Finish the turn, restoring the thread first when `restore` is set
    async fn release(mut self, restore: bool) {
        if restore {
            restore_history(self.store.as_ref(), &self.thread_id, self.baseline).await;
        }
        self.restore_on_drop = false;
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let Some(lock) = self.lock.take() else {
            return;
        };

        if !self.restore_on_drop {
            drop(lock);
            release_thread_lock(&self.locks, &self.thread_id);
            return;
        }

        let store = self.store.clone();
        let locks = self.locks.clone();
        let thread_id = self.thread_id.clone();
        let baseline = self.baseline;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(thread_id = %thread_id, baseline, "Turn abandoned, restoring history");
                handle.spawn(async move {
                    restore_history(store.as_ref(), &thread_id, baseline).await;
                    drop(lock);
                    release_thread_lock(&locks, &thread_id);
                });
            }
            Err(_) => {
                tracing::error!(
                    thread_id = %thread_id,
                    baseline,
                    "Turn abandoned outside a runtime, history not restored"
                );
            }
        }
    }
}

/// Truncate back to `baseline`. Failures are logged, never surfaced, so the
/// caller still reports the turn's own outcome.
async fn restore_history(store: &dyn HistoryStore, thread_id: &ThreadId, baseline: usize) {
    if let Err(e) = store.truncate(thread_id, baseline).await {
        tracing::error!(
            thread_id = %thread_id,
            baseline,
            error = %e,
            "Failed to restore thread history"
        );
    }
}

/// Forget a thread's lock once no turn holds or awaits it
fn release_thread_lock(locks: &ThreadLocks, thread_id: &ThreadId) {
    let mut locks = locks.lock().unwrap_or_else(PoisonError::into_inner);
    if locks
        .get(thread_id)
        .is_some_and(|lock| Arc::strong_count(lock) == 1)
    {
        locks.remove(thread_id);
    }
}
