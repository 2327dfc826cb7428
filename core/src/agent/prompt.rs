//! Prompt construction
//!
//! One deterministic function of (goal, bounded history, redacted screen
//! text). The instruction block and output schema are fixed; snapshot
//! equality on the same inputs is a tested guarantee.

use std::collections::VecDeque;

/// Connector between history entries, oldest to newest.
const HISTORY_CONNECTOR: &str = " -> ";

const OUTPUT_SCHEMA: &str = r#"{ "status": "IN_PROGRESS" | "COMPLETE" | "WAIT_FOR_USER", "message": "reason", "action": { "action": "CLICK" | "TYPE" | "ENTER" | "SCROLL" | "HOME" | "NONE", "element_id": 123, "text": "optional" } }"#;

/// Builder for the per-step agent prompt.
pub struct PromptBuilder {
    history_window: usize,
}

impl PromptBuilder {
    pub fn new(history_window: usize) -> Self {
        Self { history_window }
    }

    /// Assemble the full prompt for one step.
    pub fn build(&self, goal: &str, history: &VecDeque<String>, screen: &str) -> String {
        format!(
            "ROLE: On-device UI automation agent.\n\
            GOAL: \"{}\"\n\
            HISTORY: [{}]\n\
            SCREEN_STATE:\n\
            {}\n\
            \n\
            INSTRUCTIONS:\n\
            1. Parse SCREEN_STATE. Interactive elements are <button>, <input> and <scroller> tags; plain text is <p>. Target elements by their numeric id.\n\
            2. To search: CLICK the <input>, TYPE the query, then send ENTER.\n\
            3. After acting, do NOT stop early. Check whether the GOAL is actually reached on screen and only return \"COMPLETE\" once it is.\n\
            4. If the target is off-screen, use \"SCROLL\".\n\
            5. Use \"WAIT_FOR_USER\" when you need explicit confirmation before a sensitive step.\n\
            \n\
            OUTPUT JSON (exactly one object, nothing before or after it):\n\
            {}",
            goal,
            self.format_history(history),
            screen,
            OUTPUT_SCHEMA
        )
    }

    /// Most recent N entries, oldest to newest.
    fn format_history(&self, history: &VecDeque<String>) -> String {
        if history.is_empty() {
            return "No actions taken yet.".to_string();
        }
        let skip = history.len().saturating_sub(self.history_window);
        history
            .iter()
            .skip(skip)
            .cloned()
            .collect::<Vec<_>>()
            .join(HISTORY_CONNECTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(entries: &[&str]) -> VecDeque<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn prompt_is_deterministic() {
        let builder = PromptBuilder::new(5);
        let history = history_of(&["Action: opened app"]);
        let a = builder.build("play some jazz", &history, "<button id=1>");
        let b = builder.build("play some jazz", &history, "<button id=1>");
        assert_eq!(a, b);
    }

    #[test]
    fn prompt_carries_goal_screen_and_schema() {
        let builder = PromptBuilder::new(5);
        let prompt = builder.build("open settings", &VecDeque::new(), "<button id=1 text=\"Settings\">");
        assert!(prompt.contains("GOAL: \"open settings\""));
        assert!(prompt.contains("<button id=1 text=\"Settings\">"));
        assert!(prompt.contains("\"IN_PROGRESS\" | \"COMPLETE\" | \"WAIT_FOR_USER\""));
        assert!(prompt.contains("HISTORY: [No actions taken yet.]"));
    }

    #[test]
    fn history_keeps_only_the_newest_window_in_order() {
        let builder = PromptBuilder::new(3);
        let history = history_of(&["one", "two", "three", "four", "five"]);
        let prompt = builder.build("g", &history, "s");
        assert!(prompt.contains("HISTORY: [three -> four -> five]"));
        assert!(!prompt.contains("one"));
        assert!(!prompt.contains("two ->"));
    }

    #[test]
    fn screen_text_is_inserted_verbatim() {
        let builder = PromptBuilder::new(5);
        let screen = "<input id=1 desc=\"Search [EMAIL_HIDDEN]\">\n  <p id=2 text=\"hi\">\n";
        let prompt = builder.build("g", &VecDeque::new(), screen);
        assert!(prompt.contains(screen));
    }
}
