//! Action dispatch
//!
//! Maps a validated directive onto concrete screen operations. Every
//! failure mode here is absorbed: a vanished target, an unsupported
//! platform action, or a provider fault becomes a logged no-op for the
//! step, never the end of the session.

use std::sync::Arc;

use crate::agent::directive::{ActionDirective, ActionKind};
use crate::screen::{GlobalAction, NodeRegistry, ScreenProvider, SwipeGesture, UiAction};

/// Swipe from 80% to 20% of screen height when a SCROLL directive has no
/// addressable scrollable target.
const SCROLL_FALLBACK: SwipeGesture = SwipeGesture {
    from: (0.5, 0.8),
    to: (0.5, 0.2),
    duration_ms: 300,
};

/// Why a directive turned into a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The target id is absent from the current registry.
    TargetMissing,
    /// TYPE without a non-empty text payload.
    MissingText,
    /// The platform reported it cannot perform the action.
    Unsupported,
    /// The platform accepted the call but reported failure.
    ActionFailed,
    /// Action name outside the vocabulary.
    UnknownKind,
    /// Explicit NONE.
    NoAction,
}

/// Tagged outcome of one dispatch, instead of unwind-and-catch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Performed,
    Skipped(SkipReason),
}

impl DispatchOutcome {
    pub fn performed(&self) -> bool {
        matches!(self, Self::Performed)
    }
}

pub struct ActionExecutor {
    screen: Arc<dyn ScreenProvider>,
}

impl ActionExecutor {
    pub fn new(screen: Arc<dyn ScreenProvider>) -> Self {
        Self { screen }
    }

    /// Dispatch one directive against the current registry.
    pub async fn dispatch(
        &self,
        directive: &ActionDirective,
        registry: &NodeRegistry,
    ) -> DispatchOutcome {
        match directive.kind {
            ActionKind::Click => self.click(directive, registry).await,
            ActionKind::Type => self.type_text(directive, registry).await,
            ActionKind::Enter => self.enter(directive, registry).await,
            ActionKind::Scroll => self.scroll(directive, registry).await,
            ActionKind::Home => self.home().await,
            ActionKind::None => {
                crate::debug_log!("NONE action, nothing to perform");
                DispatchOutcome::Skipped(SkipReason::NoAction)
            }
            ActionKind::Unknown => {
                crate::info_log!("unknown action kind, skipping step");
                DispatchOutcome::Skipped(SkipReason::UnknownKind)
            }
        }
    }

    async fn click(&self, directive: &ActionDirective, registry: &NodeRegistry) -> DispatchOutcome {
        let Some(entry) = directive.element_id.and_then(|id| registry.get(id)) else {
            crate::info_log!(
                "click target {:?} not in registry; the UI may have changed",
                directive.element_id
            );
            return DispatchOutcome::Skipped(SkipReason::TargetMissing);
        };

        match self.screen.perform_action(entry.handle, UiAction::Click).await {
            Ok(true) => DispatchOutcome::Performed,
            Ok(false) => {
                // The node itself refused the click; its container often
                // carries the actual click handler.
                let Some(parent) = entry.parent else {
                    return DispatchOutcome::Skipped(SkipReason::ActionFailed);
                };
                crate::debug_log!("click refused, retrying on parent node");
                match self.screen.perform_action(parent, UiAction::Click).await {
                    Ok(true) => DispatchOutcome::Performed,
                    Ok(false) => DispatchOutcome::Skipped(SkipReason::ActionFailed),
                    Err(e) => {
                        crate::error_log!("parent click failed: {}", e);
                        DispatchOutcome::Skipped(SkipReason::ActionFailed)
                    }
                }
            }
            Err(e) => {
                crate::error_log!("click dispatch failed: {}", e);
                DispatchOutcome::Skipped(SkipReason::ActionFailed)
            }
        }
    }

    async fn type_text(
        &self,
        directive: &ActionDirective,
        registry: &NodeRegistry,
    ) -> DispatchOutcome {
        let Some(text) = directive.text.as_deref().filter(|t| !t.is_empty()) else {
            crate::info_log!("TYPE directive without text payload, skipping");
            return DispatchOutcome::Skipped(SkipReason::MissingText);
        };
        let Some(entry) = directive.element_id.and_then(|id| registry.get(id)) else {
            crate::info_log!("type target {:?} not in registry", directive.element_id);
            return DispatchOutcome::Skipped(SkipReason::TargetMissing);
        };

        match self
            .screen
            .perform_action(entry.handle, UiAction::SetText(text.to_string()))
            .await
        {
            Ok(true) => DispatchOutcome::Performed,
            Ok(false) => DispatchOutcome::Skipped(SkipReason::ActionFailed),
            Err(e) => {
                crate::error_log!("type dispatch failed: {}", e);
                DispatchOutcome::Skipped(SkipReason::ActionFailed)
            }
        }
    }

    async fn enter(
        &self,
        directive: &ActionDirective,
        registry: &NodeRegistry,
    ) -> DispatchOutcome {
        let Some(entry) = directive.element_id.and_then(|id| registry.get(id)) else {
            crate::info_log!("enter target {:?} not in registry", directive.element_id);
            return DispatchOutcome::Skipped(SkipReason::TargetMissing);
        };

        match self.screen.perform_action(entry.handle, UiAction::ImeEnter).await {
            Ok(true) => DispatchOutcome::Performed,
            // Platform versions without IME actions: stay silent.
            Ok(false) => DispatchOutcome::Skipped(SkipReason::Unsupported),
            Err(e) => {
                crate::error_log!("enter dispatch failed: {}", e);
                DispatchOutcome::Skipped(SkipReason::ActionFailed)
            }
        }
    }

    async fn scroll(
        &self,
        directive: &ActionDirective,
        registry: &NodeRegistry,
    ) -> DispatchOutcome {
        let target = directive
            .element_id
            .and_then(|id| registry.get(id))
            .filter(|entry| entry.scrollable);

        if let Some(entry) = target {
            match self
                .screen
                .perform_action(entry.handle, UiAction::ScrollForward)
                .await
            {
                Ok(true) => return DispatchOutcome::Performed,
                Ok(false) => {}
                Err(e) => crate::error_log!("scroll dispatch failed: {}", e),
            }
        }

        // No addressable scrollable target: synthesize a swipe instead.
        crate::debug_log!("no scrollable target, falling back to swipe gesture");
        match self.screen.dispatch_gesture(SCROLL_FALLBACK).await {
            Ok(()) => DispatchOutcome::Performed,
            Err(e) => {
                crate::error_log!("swipe gesture failed: {}", e);
                DispatchOutcome::Skipped(SkipReason::ActionFailed)
            }
        }
    }

    async fn home(&self) -> DispatchOutcome {
        match self.screen.global_action(GlobalAction::Home).await {
            Ok(()) => DispatchOutcome::Performed,
            Err(e) => {
                crate::error_log!("home action failed: {}", e);
                DispatchOutcome::Skipped(SkipReason::ActionFailed)
            }
        }
    }
}
