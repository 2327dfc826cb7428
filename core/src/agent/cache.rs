//! Goal cache
//!
//! Remembers the first successful action for a verbatim goal string so a
//! repeat request can skip perception and inference entirely. This is a
//! heuristic: the screen may have drifted since the entry was written,
//! and the replayed directive then degrades to the executor's vanished-
//! target no-op path. The loop writes an entry only at step 1 and only
//! for a dispatched, non-terminal action.

use std::collections::HashMap;

use crate::agent::directive::ActionDirective;

#[derive(Debug, Default)]
pub struct GoalCache {
    entries: HashMap<String, ActionDirective>,
}

impl GoalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, goal: &str) -> Option<ActionDirective> {
        self.entries.get(goal).cloned()
    }

    pub fn put(&mut self, goal: &str, directive: ActionDirective) {
        self.entries.insert(goal.to_string(), directive);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::directive::ActionKind;

    #[test]
    fn keys_are_exact_goal_strings() {
        let mut cache = GoalCache::new();
        cache.put(
            "play jazz",
            ActionDirective {
                kind: ActionKind::Click,
                element_id: Some(3),
                text: None,
            },
        );

        assert!(cache.get("play jazz").is_some());
        assert!(cache.get("Play jazz").is_none());
        assert!(cache.get("play jazz ").is_none());
    }

    #[test]
    fn hit_returns_the_recorded_directive() {
        let mut cache = GoalCache::new();
        let directive = ActionDirective {
            kind: ActionKind::Type,
            element_id: Some(2),
            text: Some("weather".to_string()),
        };
        cache.put("check weather", directive.clone());
        assert_eq!(cache.get("check weather"), Some(directive));
    }
}
