//! Screen access seam
//!
//! The platform's accessibility layer is consumed through the
//! [`ScreenProvider`] capability object injected into the agent loop;
//! there is no process-wide accessor instance. Implementations own any
//! thread-affinity marshalling their platform requires — the trait is
//! async precisely so they can hop onto the UI context internally.

pub mod redact;
pub mod serializer;

pub use serializer::{NodeRegistry, RegistryEntry, TreeSerializer};

use async_trait::async_trait;

use crate::error::Result;

/// Opaque per-platform token for a live UI node. Only the provider that
/// issued a handle can interpret it; the core never inspects one.
pub type NodeHandle = u64;

/// One node of a UI tree snapshot. Produced fresh on every read and never
/// mutated by the core — actions go back through the [`ScreenProvider`].
#[derive(Debug, Clone, Default)]
pub struct UiNode {
    pub handle: NodeHandle,
    pub text: String,
    pub desc: String,
    pub visible: bool,
    pub clickable: bool,
    pub editable: bool,
    pub scrollable: bool,
    pub children: Vec<UiNode>,
}

impl UiNode {
    pub fn new(handle: NodeHandle) -> Self {
        Self {
            handle,
            visible: true,
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_desc(mut self, desc: &str) -> Self {
        self.desc = desc.to_string();
        self
    }

    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn scrollable(mut self) -> Self {
        self.scrollable = true;
        self
    }

    pub fn invisible(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_children(mut self, children: Vec<UiNode>) -> Self {
        self.children = children;
        self
    }
}

/// Node-targeted operations the executor can request.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Click,
    SetText(String),
    /// Insert/submit signal for the input method. Providers on platform
    /// versions without IME actions report `Ok(false)` (not handled).
    ImeEnter,
    ScrollForward,
}

/// Navigation actions that need no target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    Home,
}

/// A synthesized swipe, described in screen-size fractions so providers
/// can scale it to real pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeGesture {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub duration_ms: u64,
}

impl SwipeGesture {
    /// Vertical swipe down the horizontal center of the screen.
    pub fn vertical(from_frac: f32, to_frac: f32, duration_ms: u64) -> Self {
        Self {
            from: (0.5, from_frac),
            to: (0.5, to_frac),
            duration_ms,
        }
    }
}

/// Capability object over the platform accessibility layer.
#[async_trait]
pub trait ScreenProvider: Send + Sync {
    /// Read the current UI tree. `None` means the screen is unreadable,
    /// which the loop treats as fatal for the session.
    async fn current_tree(&self) -> Option<UiNode>;

    /// Perform a node-targeted action. `Ok(true)` means the platform
    /// handled it, `Ok(false)` that it reported failure or does not
    /// support the action; errors are platform faults.
    async fn perform_action(&self, handle: NodeHandle, action: UiAction) -> Result<bool>;

    /// Perform a global navigation action.
    async fn global_action(&self, action: GlobalAction) -> Result<()>;

    /// Dispatch a synthesized gesture.
    async fn dispatch_gesture(&self, gesture: SwipeGesture) -> Result<()>;
}

/// Voice input/output collaborator. The loop only consumes this surface;
/// capture and synthesis internals live with the platform shell.
#[async_trait]
pub trait VoiceIo: Send + Sync {
    /// Capture one utterance, if any.
    async fn listen_once(&self) -> Option<String>;

    /// Speak a short status line. Fire-and-forget.
    fn speak(&self, text: &str);
}
