use crate::components::{Shape, Style};

/// A keyed, positioned shape in the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub key: String,
    pub shape: Shape,
    pub style: Style,
    /// Tooltip text.
    pub title: Option<String>,
    /// Duration a backend may use to animate the latest attribute change.
    /// Purely cosmetic; the node's state is already final.
    pub transition_ms: Option<u32>,
}

impl SceneNode {
    pub fn new(key: impl Into<String>, shape: Shape, style: Style) -> Self {
        Self {
            key: key.into(),
            shape,
            style,
            title: None,
            transition_ms: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_transition(mut self, ms: u32) -> Self {
        self.transition_ms = Some(ms);
        self
    }
}
