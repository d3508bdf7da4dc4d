use sfc_scl::{Config, EngineKind, Theme, compile_with_options, render_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SclCompileOptions {
    theme: Option<String>,
    engine: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
}

fn build_config(options: SclCompileOptions) -> Result<Config, String> {
    let mut config = Config::default();
    if let Some(name) = options.theme {
        config.theme = Theme::from_name(&name).ok_or_else(|| format!("unknown theme `{name}`"))?;
    }
    if let Some(engine) = options.engine {
        config.layout.engine =
            EngineKind::from_token(&engine).ok_or_else(|| format!("unknown layout engine `{engine}`"))?;
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    Ok(config)
}

fn parse_options(options_json: Option<String>) -> Result<Config, String> {
    let options = match options_json {
        Some(raw_options) => {
            serde_json::from_str::<SclCompileOptions>(&raw_options).map_err(|error| error.to_string())?
        }
        None => SclCompileOptions::default(),
    };
    build_config(options)
}

fn compile_document(code: &str, options_json: Option<String>) -> Result<String, String> {
    let config = parse_options(options_json)?;
    let diagram = compile_with_options(code, &config).map_err(|error| error.to_string())?;
    diagram.to_json_pretty().map_err(|error| error.to_string())
}

fn compile_svg(code: &str, options_json: Option<String>) -> Result<String, String> {
    let config = parse_options(options_json)?;
    let diagram = compile_with_options(code, &config).map_err(|error| error.to_string())?;
    Ok(render_svg(&diagram, &config.theme))
}

/// Compiles SCL text into the diagram document JSON the editor canvas loads.
#[wasm_bindgen]
pub fn compile_scl(code: &str, options_json: Option<String>) -> Result<String, JsValue> {
    compile_document(code, options_json).map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn render_scl_svg(code: &str, options_json: Option<String>) -> Result<String, JsValue> {
    compile_svg(code, options_json).map_err(|error| JsValue::from_str(&error))
}
