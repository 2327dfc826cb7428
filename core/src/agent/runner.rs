//! Agent loop orchestration
//!
//! The only component with cross-cutting control flow: perceive, decide,
//! act, bounded by a hard step budget. One session at a time, gated by a
//! busy flag; a second goal submitted while running is rejected, not
//! queued. Step-level failures are absorbed with a brief pause; only an
//! unreadable screen (or cancellation) ends the session early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::agent::cache::GoalCache;
use crate::agent::directive::StepStatus;
use crate::agent::executor::ActionExecutor;
use crate::agent::parser;
use crate::agent::prompt::PromptBuilder;
use crate::agent::session::{AgentSession, SessionStatus};
use crate::config::{AgentSettings, Config, TimingSettings};
use crate::error::{PilotError, Result};
use crate::llm::{InferenceGateway, InferenceService, RetryPolicy, StatusCallback};
use crate::screen::redact::redact;
use crate::screen::{NodeRegistry, ScreenProvider, TreeSerializer, VoiceIo};

pub struct AgentLoop {
    screen: Arc<dyn ScreenProvider>,
    gateway: InferenceGateway,
    executor: ActionExecutor,
    prompt: PromptBuilder,
    /// Survives between sessions on purpose: a goal-cache replay acts on
    /// whatever the last serialization pass recorded, exactly like the
    /// device build's node map. Cleared at the start of every pass and
    /// on cancellation.
    registry: tokio::sync::Mutex<NodeRegistry>,
    cache: Mutex<GoalCache>,
    voice: Option<Arc<dyn VoiceIo>>,
    status_callback: Mutex<Option<StatusCallback>>,
    busy: AtomicBool,
    cancel: CancellationToken,
    agent: AgentSettings,
    timing: TimingSettings,
}

impl AgentLoop {
    pub fn new(
        screen: Arc<dyn ScreenProvider>,
        service: Arc<dyn InferenceService>,
        config: &Config,
    ) -> Self {
        let gateway = InferenceGateway::new(service, RetryPolicy::from_settings(&config.retry));
        Self {
            executor: ActionExecutor::new(screen.clone()),
            screen,
            gateway,
            prompt: PromptBuilder::new(config.agent.history_window),
            registry: tokio::sync::Mutex::new(NodeRegistry::new()),
            cache: Mutex::new(GoalCache::new()),
            voice: None,
            status_callback: Mutex::new(None),
            busy: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            agent: config.agent.clone(),
            timing: config.timing.clone(),
        }
    }

    /// Attach a voice collaborator; model messages get spoken through it.
    pub fn with_voice(mut self, voice: Arc<dyn VoiceIo>) -> Self {
        self.voice = Some(voice);
        self
    }

    /// Set a status callback for progress lines, shared with the retry
    /// wrapper so backoff waits surface too.
    pub fn set_status_callback(&self, callback: StatusCallback) {
        self.gateway.set_status_callback(callback.clone());
        *self.status_callback.lock() = Some(callback);
    }

    /// Token that stops the loop at its next suspension point. Hand a
    /// clone to whatever owns shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether a session currently holds the loop.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Run one goal to a terminal status. Rejects with
    /// [`PilotError::SessionBusy`] while another session is running.
    pub async fn run(&self, goal: &str) -> Result<AgentSession> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            self.speak("I am busy.");
            return Err(PilotError::SessionBusy);
        }

        let result = self.drive(goal).await;

        if matches!(result, Err(PilotError::Cancelled)) {
            self.registry.lock().await.clear();
            crate::info_log!("session cancelled, registry cleared");
        }
        self.busy.store(false, Ordering::SeqCst);
        result
    }

    async fn drive(&self, goal: &str) -> Result<AgentSession> {
        let mut session = AgentSession::new(goal, self.agent.history_window);
        crate::info_log!("session {} started for goal '{}'", session.id, goal);

        // Replay path: a known goal skips perception and inference and the
        // session ends immediately. The directive is resolved against the
        // registry as the last pass left it; if the screen drifted, the
        // dispatch degrades to the vanished-target no-op.
        let cached = self.cache.lock().get(goal);
        if let Some(cached) = cached {
            self.report("Memory hit");
            crate::info_log!("goal cache hit, replaying recorded action");
            let registry = self.registry.lock().await;
            let outcome = self.executor.dispatch(&cached, &registry).await;
            drop(registry);
            crate::debug_log!("cache replay outcome: {:?}", outcome);
            session.status = SessionStatus::Complete;
            return Ok(session);
        }

        while session.step < self.agent.max_steps {
            if self.cancel.is_cancelled() {
                return Err(PilotError::Cancelled);
            }
            session.step += 1;
            self.report(&format!("Step {}...", session.step));

            // 1. Perceive.
            let Some(tree) = self.screen.current_tree().await else {
                crate::error_log!("screen unreadable at step {}, aborting", session.step);
                self.speak("I cannot read the screen.");
                session.status = SessionStatus::Failed;
                return Ok(session);
            };

            // 2. Serialize and scrub.
            let screen_text = {
                let mut registry = self.registry.lock().await;
                let raw = TreeSerializer::serialize(&tree, &mut registry);
                redact(&raw)
            };
            let prompt = self.prompt.build(goal, &session.history, &screen_text);

            // 3. Decide. A call that fails even after retries costs this
            // step a pause, never the session.
            let raw_reply = match self.gateway.infer(&prompt, &self.cancel).await {
                Ok(text) => text,
                Err(PilotError::Cancelled) => return Err(PilotError::Cancelled),
                Err(e) => {
                    crate::error_log!("step {} inference failed: {}", session.step, e);
                    self.report("Model call failed.");
                    self.pause(self.timing.step_failure_delay()).await?;
                    continue;
                }
            };

            // 4. Validate.
            let Some(reply) = parser::parse(&raw_reply) else {
                crate::info_log!("malformed model reply at step {}", session.step);
                self.pause(self.timing.parse_retry_delay()).await?;
                continue;
            };

            if !reply.message.is_empty() {
                session.last_message = reply.message.clone();
                self.speak(&reply.message);
                self.report(&reply.message);
            }

            // 5. Branch on the claimed status.
            match reply.status {
                StepStatus::Complete => {
                    crate::info_log!(
                        "session {} complete after {} steps",
                        session.id,
                        session.step
                    );
                    self.report("Done.");
                    session.status = SessionStatus::Complete;
                    return Ok(session);
                }
                StepStatus::WaitForUser => {
                    self.speak("I need confirmation.");
                    self.report("Confirm?");
                    session.status = SessionStatus::WaitingForUser;
                    self.pause(self.timing.wait_for_user_delay()).await?;
                    session.status = SessionStatus::Running;
                }
                StepStatus::InProgress => {
                    let registry = self.registry.lock().await;
                    let outcome = self.executor.dispatch(&reply.directive, &registry).await;
                    drop(registry);

                    session.push_history(format!("Action: {}", reply.message));

                    if session.step == 1 && outcome.performed() {
                        self.cache.lock().put(goal, reply.directive.clone());
                        crate::debug_log!("cached first action for goal '{}'", goal);
                    }

                    self.pause(self.timing.settle_delay()).await?;
                }
            }
        }

        crate::error_log!(
            "session {} exhausted its {}-step budget",
            session.id,
            self.agent.max_steps
        );
        self.report("Step limit reached.");
        session.status = SessionStatus::Failed;
        Ok(session)
    }

    /// Sleep that unwinds on the stop signal.
    async fn pause(&self, wait: Duration) -> Result<()> {
        tokio::select! {
            _ = sleep(wait) => Ok(()),
            _ = self.cancel.cancelled() => Err(PilotError::Cancelled),
        }
    }

    fn speak(&self, text: &str) {
        if let Some(voice) = &self.voice {
            voice.speak(text);
        }
    }

    fn report(&self, message: &str) {
        if let Some(callback) = self.status_callback.lock().as_ref() {
            callback(message);
        }
    }
}
