//! Session state
//!
//! One [`AgentSession`] per submitted goal, created when the loop accepts
//! it and finished with a terminal status (or step exhaustion). At most
//! one session runs at a time.

use std::collections::VecDeque;

use uuid::Uuid;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    WaitingForUser,
    Complete,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

#[derive(Debug)]
pub struct AgentSession {
    pub id: Uuid,
    pub goal: String,
    /// Steps consumed so far, 0..=max_steps.
    pub step: u32,
    /// Most recent action summaries; bounded, oldest entries fall off.
    pub history: VecDeque<String>,
    pub status: SessionStatus,
    /// Last spoken model message, surfaced to the caller on exit.
    pub last_message: String,
    history_limit: usize,
}

impl AgentSession {
    pub fn new(goal: &str, history_limit: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal: goal.to_string(),
            step: 0,
            history: VecDeque::with_capacity(history_limit),
            status: SessionStatus::Running,
            last_message: String::new(),
            history_limit: history_limit.max(1),
        }
    }

    /// Append a history entry, dropping the oldest past the limit.
    pub fn push_history(&mut self, entry: String) {
        if self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }
}
