use crate::ir::{NodeContent, SclNode};
use serde::{Deserialize, Serialize};

/// Footprint constants for rendered nodes and for the room reserved around
/// transitions during layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingConfig {
    pub step_width: f32,
    pub step_height: f32,
    pub action_height: f32,
    pub transition_width: f32,
    pub transition_height: f32,
    pub transition_layout_min_width: f32,
    pub condition_char_width: f32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            step_width: 180.0,
            step_height: 80.0,
            action_height: 24.0,
            transition_width: 90.0,
            transition_height: 60.0,
            transition_layout_min_width: 300.0,
            condition_char_width: 10.0,
        }
    }
}

impl SizingConfig {
    pub fn rendered_size(&self, content: &NodeContent) -> (f32, f32) {
        match content {
            NodeContent::Step { actions, .. } => (
                self.step_width,
                self.step_height + self.action_height * actions.len() as f32,
            ),
            NodeContent::Transition { .. } => (self.transition_width, self.transition_height),
        }
    }

    /// Width reserved for `node` in the layout pass. Transitions reserve room
    /// for their condition text, which overflows the bar they render as.
    pub fn layout_width(&self, node: &SclNode) -> f32 {
        match &node.content {
            NodeContent::Step { .. } => node.width,
            NodeContent::Transition { condition, .. } if condition.is_empty() => {
                self.transition_layout_min_width
            }
            NodeContent::Transition { condition, .. } => {
                let text_width = condition.chars().count() as f32 * self.condition_char_width;
                text_width.max(self.transition_layout_min_width)
            }
        }
    }

    pub fn layout_size(&self, node: &SclNode) -> (f32, f32) {
        (self.layout_width(node), node.height)
    }

    /// Recomputes the rendered footprint after content was edited outside the parser.
    pub fn resize(&self, node: &mut SclNode) {
        let (width, height) = self.rendered_size(&node.content);
        node.width = width;
        node.height = height;
    }
}
