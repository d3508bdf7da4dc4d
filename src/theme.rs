use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub text_color: String,
    pub line_color: String,
    pub step_fill: String,
    pub step_border: String,
    pub transition_fill: String,
    pub action_fill: String,
    pub action_border: String,
    pub condition_color: String,
    pub label_muted_opacity: f32,
}

impl Theme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dark" | "default" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    /// Matches the editor canvas: white strokes on black.
    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            background: "#000000".to_string(),
            text_color: "#FFFFFF".to_string(),
            line_color: "#FFFFFF".to_string(),
            step_fill: "#000000".to_string(),
            step_border: "#FFFFFF".to_string(),
            transition_fill: "#FFFFFF".to_string(),
            action_fill: "#000000".to_string(),
            action_border: "#FFFFFF".to_string(),
            condition_color: "#FFFFFF".to_string(),
            label_muted_opacity: 0.7,
        }
    }

    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            background: "#FFFFFF".to_string(),
            text_color: "#1C2430".to_string(),
            line_color: "#1C2430".to_string(),
            step_fill: "#F8FAFF".to_string(),
            step_border: "#1C2430".to_string(),
            transition_fill: "#1C2430".to_string(),
            action_fill: "#FFFFFF".to_string(),
            action_border: "#7A8AA6".to_string(),
            condition_color: "#1C2430".to_string(),
            label_muted_opacity: 0.7,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
