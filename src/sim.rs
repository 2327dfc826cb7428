//! Scripted screen harness
//!
//! Stands in for the platform accessibility layer during development: a
//! fixture file describes a sequence of screens, and every performed
//! action advances to the next one. The last screen repeats, so the
//! model always has something to look at.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;

use screenpilot_core::error::Result;
use screenpilot_core::screen::{
    GlobalAction, NodeHandle, ScreenProvider, SwipeGesture, UiAction, UiNode,
};

#[derive(Deserialize)]
struct Fixture {
    screens: Vec<FixtureNode>,
}

#[derive(Deserialize)]
#[serde(default)]
struct FixtureNode {
    text: String,
    desc: String,
    visible: bool,
    clickable: bool,
    editable: bool,
    scrollable: bool,
    children: Vec<FixtureNode>,
}

impl Default for FixtureNode {
    fn default() -> Self {
        Self {
            text: String::new(),
            desc: String::new(),
            visible: true,
            clickable: false,
            editable: false,
            scrollable: false,
            children: Vec::new(),
        }
    }
}

pub struct ScriptedScreen {
    screens: Vec<UiNode>,
    cursor: AtomicUsize,
}

impl ScriptedScreen {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&raw)?;
        anyhow::ensure!(
            !fixture.screens.is_empty(),
            "fixture {} has no screens",
            path.display()
        );

        let mut next_handle: NodeHandle = 1;
        let screens = fixture
            .screens
            .iter()
            .map(|spec| to_node(spec, &mut next_handle))
            .collect();

        Ok(Self {
            screens,
            cursor: AtomicUsize::new(0),
        })
    }

    fn advance(&self) {
        let last = self.screens.len() - 1;
        let _ = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
                Some((c + 1).min(last))
            });
    }
}

fn to_node(spec: &FixtureNode, next_handle: &mut NodeHandle) -> UiNode {
    let handle = *next_handle;
    *next_handle += 1;
    UiNode {
        handle,
        text: spec.text.clone(),
        desc: spec.desc.clone(),
        visible: spec.visible,
        clickable: spec.clickable,
        editable: spec.editable,
        scrollable: spec.scrollable,
        children: spec
            .children
            .iter()
            .map(|child| to_node(child, next_handle))
            .collect(),
    }
}

#[async_trait]
impl ScreenProvider for ScriptedScreen {
    async fn current_tree(&self) -> Option<UiNode> {
        let index = self.cursor.load(Ordering::SeqCst).min(self.screens.len() - 1);
        Some(self.screens[index].clone())
    }

    async fn perform_action(&self, handle: NodeHandle, action: UiAction) -> Result<bool> {
        println!("[screen] node {} <- {:?}", handle, action);
        self.advance();
        Ok(true)
    }

    async fn global_action(&self, action: GlobalAction) -> Result<()> {
        println!("[screen] global {:?}", action);
        self.advance();
        Ok(())
    }

    async fn dispatch_gesture(&self, gesture: SwipeGesture) -> Result<()> {
        println!(
            "[screen] swipe {:?} -> {:?} over {}ms",
            gesture.from, gesture.to, gesture.duration_ms
        );
        self.advance();
        Ok(())
    }
}
