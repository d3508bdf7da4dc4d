use crate::compile_with_options;
use crate::config::{Config, load_config};
use crate::layout::EngineKind;
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug, info};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "sfcc", version, about = "Compile SCL step/transition text into SFC diagrams")]
pub struct Args {
    /// Input file (.scl, or .md with ```scl blocks) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. JSON and SVG default to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout engine, overriding the config file
    #[arg(long = "engine", value_enum)]
    pub engine: Option<EngineChoice>,

    /// PNG canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// PNG canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Svg,
    Png,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineChoice {
    Dagre,
    Layered,
}

impl From<EngineChoice> for EngineKind {
    fn from(choice: EngineChoice) -> Self {
        match choice {
            EngineChoice::Dagre => EngineKind::Dagre,
            EngineChoice::Layered => EngineKind::Layered,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    debug!(args:?; "parsed arguments");

    let config = resolve_config(&args)?;
    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let sources = if is_markdown {
        extract_scl_blocks(&input)
    } else {
        vec![input]
    };

    if sources.is_empty() {
        return Err(anyhow::anyhow!("No SCL blocks found in input"));
    }

    if sources.len() == 1 {
        let output = args.output.as_deref();
        return emit(&sources[0], &config, args.output_format, output);
    }

    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, sources.len())?;
    for (source, output) in sources.iter().zip(&outputs) {
        emit(source, &config, args.output_format, Some(output))?;
    }
    info!(count = outputs.len(); "compiled markdown blocks");
    Ok(())
}

fn init_logging(level: &str) {
    let log_level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(engine) = args.engine {
        config.layout.engine = engine.into();
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    Ok(config)
}

fn emit(source: &str, config: &Config, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let diagram = compile_with_options(source, config)?;
    match format {
        OutputFormat::Json => {
            let json = diagram.to_json_pretty()?;
            match output {
                Some(path) => std::fs::write(path, format!("{json}\n"))?,
                None => println!("{json}"),
            }
        }
        OutputFormat::Svg => {
            let svg = render_svg(&diagram, &config.theme);
            write_output_svg(&svg, output)?;
        }
        OutputFormat::Png => {
            let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            let svg = render_svg(&diagram, &config.theme);
            write_output_png(&svg, output, &config.render)?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn extract_scl_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut fence: Option<&str> = None;
    let mut current = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim();
        match fence {
            None => fence = detect_scl_fence(trimmed),
            Some(open) if is_fence_end(trimmed, open) => {
                fence = None;
                blocks.push(current.join("\n"));
                current.clear();
            }
            Some(_) => current.push(line),
        }
    }

    blocks
}

fn detect_scl_fence(line: &str) -> Option<&'static str> {
    for (fence, marker) in [("```", '`'), ("~~~", '~')] {
        if !line.starts_with(fence) {
            continue;
        }
        let info = line.trim_start_matches(marker).trim();
        let lang = info.split_whitespace().next().unwrap_or_default();
        if lang.eq_ignore_ascii_case("scl") || lang.eq_ignore_ascii_case("sfc") {
            return Some(fence);
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    if !line.starts_with(fence) {
        return false;
    }
    line[fence.len()..].trim().is_empty()
}

fn resolve_multi_outputs(output: Option<&Path>, format: OutputFormat, count: usize) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((1..=count)
            .map(|idx| base.join(format!("diagram-{idx}.{ext}")))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("diagram");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok((1..=count)
        .map(|idx| parent.join(format!("{stem}-{idx}.{ext}")))
        .collect())
}
