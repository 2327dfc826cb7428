pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod screen;

// Re-exports for convenience
pub use agent::runner::AgentLoop;
pub use agent::session::{AgentSession, SessionStatus};
pub use config::Config;
pub use error::{PilotError, Result};
