mod demo;
mod render;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use replwatch_lib::{
    io::{csv as csv_io, text as text_io},
    registry::{ClosedWidget, TransformFailure},
    transform::install_builtins,
    MapNamespace, Registry, Session, View, WatchConfig, WidgetId, WidgetState,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "replwatch",
    version,
    about = "Headless host for namespace-bound watch widgets"
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// JSON object holding the initial namespace
    #[arg(long)]
    namespace: Option<PathBuf>,
    /// Session TOML listing the widgets to open
    #[arg(long)]
    session: PathBuf,
    /// Watch config TOML overriding the session's [config] table
    #[arg(long)]
    config: Option<PathBuf>,
    /// Load a newline-delimited series as NAME=PATH
    #[arg(long = "series", value_name = "NAME=PATH")]
    series: Vec<String>,
    /// Load every column of a CSV file as a variable
    #[arg(long = "csv", value_name = "PATH")]
    csv: Vec<PathBuf>,
    #[arg(long, default_value_t = 1)]
    ticks: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a session, run ticks (replaying scripted events) and print a JSON report
    Run {
        #[command(flatten)]
        source: SourceArgs,
        /// Write the namespace after the last tick
        #[arg(long)]
        out_namespace: Option<PathBuf>,
    },
    /// Render one widget's plot or image to a PNG via plotters
    Render {
        #[command(flatten)]
        source: SourceArgs,
        /// Index of the widget in the session file
        #[arg(long, default_value_t = 0)]
        widget: usize,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 480)]
        height: u32,
    },
    /// Write a demo namespace (and optionally a matching session)
    Demo {
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        session_out: Option<PathBuf>,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();
    match cli.command {
        Commands::Run {
            source,
            out_namespace,
        } => cmd_run(&source, out_namespace.as_deref())?,
        Commands::Render {
            source,
            widget,
            out,
            width,
            height,
        } => cmd_render(&source, widget, &out, (width, height))?,
        Commands::Demo {
            out,
            session_out,
            seed,
        } => demo::cmd_demo(&out, session_out.as_deref(), seed)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct WidgetReport<'a> {
    id: WidgetId,
    kind: &'static str,
    state: WidgetState,
    view: &'a View,
}

#[derive(Serialize)]
struct ClosedReport {
    id: WidgetId,
    kind: &'static str,
    reason: String,
}

impl From<ClosedWidget> for ClosedReport {
    fn from(closed: ClosedWidget) -> Self {
        Self {
            id: closed.id,
            kind: closed.kind,
            reason: closed.reason,
        }
    }
}

#[derive(Serialize)]
struct FailureReport {
    id: WidgetId,
    error: String,
}

impl From<TransformFailure> for FailureReport {
    fn from(failure: TransformFailure) -> Self {
        Self {
            id: failure.id,
            error: failure.error.to_string(),
        }
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    ticks: usize,
    widgets: Vec<WidgetReport<'a>>,
    closed: Vec<ClosedReport>,
    failures: Vec<FailureReport>,
}

/// A session opened against its namespace, ready to tick.
struct Loaded {
    session: Session,
    ns: MapNamespace,
    registry: Registry,
    ids: Vec<WidgetId>,
}

fn parse_series_arg(arg: &str) -> Result<(&str, &Path)> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("--series expects NAME=PATH, got {arg}"))?;
    if name.is_empty() {
        bail!("--series expects NAME=PATH, got {arg}");
    }
    Ok((name, Path::new(path)))
}

fn load(source: &SourceArgs) -> Result<Loaded> {
    let mut session = Session::read(&source.session)?;
    if let Some(path) = &source.config {
        session.config = WatchConfig::read(path)?;
    }
    let mut ns = match &source.namespace {
        Some(path) => MapNamespace::read_json(path)?,
        None => MapNamespace::new(),
    };
    for arg in &source.series {
        let (name, path) = parse_series_arg(arg)?;
        let len = text_io::load_series_variable(&mut ns, name, path)?;
        debug!("loaded {len} samples into {name}");
    }
    for path in &source.csv {
        let names = csv_io::load_csv_columns(&mut ns, path, "", b',')?;
        debug!("loaded columns {names:?} from {}", path.display());
    }
    install_builtins(&mut ns);

    let mut registry = Registry::new(session.config.clone());
    let mut ids = Vec::with_capacity(session.widgets.len());
    for (index, spec) in session.widgets.iter().enumerate() {
        let kind = spec.kind_name();
        let id = registry
            .open(spec.clone(), &ns)
            .with_context(|| format!("opening widget {index} ({kind})"))?;
        ids.push(id);
    }
    info!("opened {} widgets", ids.len());
    Ok(Loaded {
        session,
        ns,
        registry,
        ids,
    })
}

/// Run `ticks` rounds, dispatching scripted events before the tick they name.
fn drive(loaded: &mut Loaded, ticks: usize) -> Result<(Vec<ClosedReport>, Vec<FailureReport>)> {
    let mut closed = Vec::new();
    let mut failures = Vec::new();
    for tick in 0..ticks {
        for scripted in loaded.session.events.iter().filter(|e| e.tick == tick) {
            let id = *loaded
                .ids
                .get(scripted.widget)
                .ok_or_else(|| anyhow!("event targets unknown widget {}", scripted.widget))?;
            let report = loaded.registry.dispatch(id, &scripted.event, &mut loaded.ns);
            closed.extend(report.closed.into_iter().map(ClosedReport::from));
            failures.extend(report.failures.into_iter().map(FailureReport::from));
        }
        let report = loaded.registry.tick_all(&mut loaded.ns);
        closed.extend(report.closed.into_iter().map(ClosedReport::from));
        failures.extend(report.failures.into_iter().map(FailureReport::from));
    }
    Ok((closed, failures))
}

fn cmd_run(source: &SourceArgs, out_namespace: Option<&Path>) -> Result<()> {
    let mut loaded = load(source)?;
    let (closed, failures) = drive(&mut loaded, source.ticks)?;
    if let Some(path) = out_namespace {
        loaded.ns.without_functions().write_json(path)?;
    }
    let widgets = loaded
        .registry
        .ids()
        .into_iter()
        .filter_map(|id| {
            Some(WidgetReport {
                id,
                kind: loaded.registry.kind(id)?,
                state: loaded.registry.state(id)?,
                view: loaded.registry.view(id)?,
            })
        })
        .collect();
    let report = RunReport {
        ticks: source.ticks,
        widgets,
        closed,
        failures,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_render(source: &SourceArgs, widget: usize, out: &Path, size: (u32, u32)) -> Result<()> {
    let mut loaded = load(source)?;
    let (closed, _) = drive(&mut loaded, source.ticks.max(1))?;
    let id = *loaded
        .ids
        .get(widget)
        .ok_or_else(|| anyhow!("session has no widget {widget}"))?;
    if let Some(closed) = closed.iter().find(|c| c.id == id) {
        bail!("widget {widget} closed: {}", closed.reason);
    }
    let view = loaded
        .registry
        .view(id)
        .ok_or_else(|| anyhow!("widget {widget} is not open"))?;
    if let Some(figure) = &view.figure {
        render::draw_figure(out, size, figure)
    } else if let Some(image) = &view.image {
        render::draw_image(out, image)
    } else {
        bail!("widget {widget} has nothing to draw")
    }
}
