use crate::error::{Error, Result};
use crate::layout::{EngineKind, LayoutOptions, RankDir};
use crate::sizing::SizingConfig;
use crate::theme::Theme;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub engine: EngineKind,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub margin_x: f32,
    pub margin_y: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Dagre,
            node_spacing: 80.0,
            rank_spacing: 80.0,
            margin_x: 50.0,
            margin_y: 50.0,
        }
    }
}

impl LayoutConfig {
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions {
            rank_dir: RankDir::TopBottom,
            node_spacing: self.node_spacing,
            rank_spacing: self.rank_spacing,
            margin_x: self.margin_x,
            margin_y: self.margin_y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub sizing: SizingConfig,
    pub layout: LayoutConfig,
    pub theme: Theme,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SizingConfigFile {
    step_width: Option<f32>,
    step_height: Option<f32>,
    action_height: Option<f32>,
    transition_width: Option<f32>,
    transition_height: Option<f32>,
    transition_layout_min_width: Option<f32>,
    condition_char_width: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    engine: Option<String>,
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    margin_x: Option<f32>,
    margin_y: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    text_color: Option<String>,
    line_color: Option<String>,
    step_fill: Option<String>,
    step_border: Option<String>,
    transition_fill: Option<String>,
    action_fill: Option<String>,
    action_border: Option<String>,
    condition_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    sizing: Option<SizingConfigFile>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    info!(path = path.display().to_string(); "loading configuration");
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a configuration document. Strict JSON is tried first; JSON5
/// (comments, trailing commas) is accepted as a fallback.
pub fn parse_config(contents: &str) -> Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => {
            debug!(error = json_err.to_string(); "config is not strict JSON, retrying as JSON5");
            json5::from_str(contents).map_err(|err| Error::Config(err.to_string()))?
        }
    };
    apply_config_file(Config::default(), parsed)
}

fn apply_config_file(mut config: Config, parsed: ConfigFile) -> Result<Config> {
    if let Some(name) = parsed.theme.as_deref() {
        config.theme = Theme::from_name(name)
            .ok_or_else(|| Error::Config(format!("unknown theme `{name}`")))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.step_fill {
            config.theme.step_fill = v;
        }
        if let Some(v) = vars.step_border {
            config.theme.step_border = v;
        }
        if let Some(v) = vars.transition_fill {
            config.theme.transition_fill = v;
        }
        if let Some(v) = vars.action_fill {
            config.theme.action_fill = v;
        }
        if let Some(v) = vars.action_border {
            config.theme.action_border = v;
        }
        if let Some(v) = vars.condition_color {
            config.theme.condition_color = v;
        }
    }

    if let Some(sizing) = parsed.sizing {
        if let Some(v) = sizing.step_width {
            config.sizing.step_width = v;
        }
        if let Some(v) = sizing.step_height {
            config.sizing.step_height = v;
        }
        if let Some(v) = sizing.action_height {
            config.sizing.action_height = v;
        }
        if let Some(v) = sizing.transition_width {
            config.sizing.transition_width = v;
        }
        if let Some(v) = sizing.transition_height {
            config.sizing.transition_height = v;
        }
        if let Some(v) = sizing.transition_layout_min_width {
            config.sizing.transition_layout_min_width = v;
        }
        if let Some(v) = sizing.condition_char_width {
            config.sizing.condition_char_width = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(engine) = layout.engine.as_deref() {
            config.layout.engine = EngineKind::from_token(engine)
                .ok_or_else(|| Error::Config(format!("unknown layout engine `{engine}`")))?;
        }
        if let Some(v) = layout.node_spacing {
            config.layout.node_spacing = v;
        }
        if let Some(v) = layout.rank_spacing {
            config.layout.rank_spacing = v;
        }
        if let Some(v) = layout.margin_x {
            config.layout.margin_x = v;
        }
        if let Some(v) = layout.margin_y {
            config.layout.margin_y = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
    }

    Ok(config)
}
