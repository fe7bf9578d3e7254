use crate::config::{LayoutEngine, load_config};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::model::TaxonomyNode;
use crate::render::{render_svg, write_output_png, write_output_svg};
use crate::session::LayoutSession;
use crate::tree::{self, validate};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "taxo", version, about = "Lay out a communications taxonomy as an org chart")]
pub struct Args {
    /// Input file (JSON array of nodes) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for JSON and SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout engine, overrides the config file
    #[arg(long = "engine", value_enum)]
    pub engine: Option<EngineArg>,

    /// Only lay out the subtree under this node id
    #[arg(long = "root")]
    pub root: Option<String>,

    /// Keep matches with their ancestors and descendants, and highlight them
    #[arg(long = "search")]
    pub search: Option<String>,

    /// Node id to draw as selected
    #[arg(long = "select")]
    pub select: Option<String>,

    /// Print structure issues and exit non-zero when there are any
    #[arg(long = "validate")]
    pub validate: bool,

    /// Emit logs as JSON lines
    #[arg(long = "log-json")]
    pub log_json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineArg {
    Tidy,
    Layered,
}

impl From<EngineArg> for LayoutEngine {
    fn from(value: EngineArg) -> Self {
        match value {
            EngineArg::Tidy => LayoutEngine::Tidy,
            EngineArg::Layered => LayoutEngine::Layered,
        }
    }
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_env("TAXO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(engine) = args.engine {
        config.layout.engine = engine.into();
    }

    let input = read_input(args.input.as_deref())?;
    let nodes = parse_nodes(&input)?;

    if args.validate {
        let issues = validate(&nodes, &config.taxonomy);
        for issue in &issues {
            println!("{issue}");
        }
        if !issues.is_empty() {
            anyhow::bail!("{} structure issue(s) found", issues.len());
        }
        return Ok(());
    }

    let nodes = select_nodes(nodes, args.root.as_deref(), args.search.as_deref());
    info!(nodes = nodes.len(), engine = ?config.layout.engine, "laying out taxonomy");

    let mut session = LayoutSession::new(config.layout.clone());
    session.sync(&nodes)?;
    session.select(args.select.as_deref());
    if let Some(term) = args.search.as_deref() {
        session.set_search_term(term);
    }
    let Some(layout) = session.layout() else {
        anyhow::bail!("layout did not produce a result");
    };

    match args.output_format {
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, layout, &nodes)?,
            None => {
                let dump = LayoutDump::from_layout(layout, &nodes);
                println!("{}", serde_json::to_string_pretty(&dump)?);
            }
        },
        OutputFormat::Svg => {
            let svg = render_svg(layout, &nodes, &config, &session.highlight(&nodes));
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render_svg(layout, &nodes, &config, &session.highlight(&nodes));
            write_output_png(&svg, &output, &config.render)?;
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn parse_nodes(input: &str) -> Result<Vec<TaxonomyNode>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(input).context("input is not a JSON array of taxonomy nodes")
}

fn select_nodes(
    nodes: Vec<TaxonomyNode>,
    root: Option<&str>,
    search: Option<&str>,
) -> Vec<TaxonomyNode> {
    let nodes = match root {
        Some(_) => tree::filter_by_subtree(&nodes, root),
        None => nodes,
    };
    match search {
        Some(term) => tree::search_by_name(&nodes, term),
        None => nodes,
    }
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
