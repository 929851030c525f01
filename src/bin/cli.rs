// CLI binary: exiting on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use playwrite::describe::{describe_node, describe_registry};
use playwrite::error::AppError;
use playwrite::registry::catalog::catalog_schema;
use playwrite::registry::BindTarget;
use playwrite::session::{CommandOutcome, CommandReport, Session};
use playwrite::settings::{self, Settings};
use playwrite::state::StageHandle;

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "playwrite-cli", about = "Plain-English command scripts", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding settings.json
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script file, then fire events
    Run {
        script: PathBuf,
        /// Event to fire after the script, as target:signal
        /// (e.g. "document:load", "element:banner:click")
        #[arg(long = "fire")]
        fire: Vec<String>,
        /// Keyword catalog to load on top of the demo vocabulary
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Compile one sentence and print its tree
    Compile { sentence: String },
    /// List registered keywords
    Keywords {
        /// Print the catalog file JSON schema instead
        #[arg(long)]
        schema: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PLAYWRITE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_settings(dir: Option<&Path>) -> Result<Settings, AppError> {
    match dir {
        Some(dir) => Ok(settings::load_settings(dir)?.unwrap_or_default()),
        None => Ok(Settings::default()),
    }
}

/// `document:load` → (document, load); `element:banner:click` →
/// (element:banner, click).
fn parse_fire(raw: &str) -> Result<(BindTarget, String), AppError> {
    let (target, signal) = raw
        .rsplit_once(':')
        .filter(|(_, signal)| !signal.is_empty())
        .ok_or_else(|| AppError::from(format!("--fire expects target:signal, got \"{raw}\"")))?;
    let target = target.parse::<BindTarget>().map_err(AppError::from)?;
    Ok((target, signal.to_string()))
}

// ── Output ───────────────────────────────────────────────────────

fn print_report(report: &CommandReport) {
    let status = match &report.outcome {
        CommandOutcome::Empty => "no-op".to_string(),
        CommandOutcome::Ran(Some(value)) => format!("ran -> {value}"),
        CommandOutcome::Ran(None) => "ran".to_string(),
        CommandOutcome::Bound(id) => format!("bound {id}"),
        CommandOutcome::Failed(e) => format!("FAILED: {e}"),
    };
    println!("{}  [{status}]", report.command);
    if !report.skipped.is_empty() {
        println!("    skipped: {}", report.skipped.join(" "));
    }
}

// ── Commands ─────────────────────────────────────────────────────

fn run(
    settings: Settings,
    script: &Path,
    fire: &[String],
    raw: bool,
) -> Result<bool, AppError> {
    let stage = StageHandle::new();
    let mut session = Session::with_demo(settings, &stage)?;
    let text = std::fs::read_to_string(script)?;
    let reports = session.run_script(&text);

    let mut fired = Vec::new();
    for spec in fire {
        let (target, signal) = parse_fire(spec)?;
        let count = session.fire(&target, &signal)?;
        fired.push((spec.as_str(), count));
    }

    let stage = stage.snapshot();
    if raw {
        let out = json!({
            "commands": reports.iter().map(CommandReport::to_json).collect::<Vec<_>>(),
            "fired": fired.iter().map(|(spec, count)| json!({ "event": spec, "bindings": count })).collect::<Vec<_>>(),
            "stage": stage,
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap());
    } else {
        reports.iter().for_each(print_report);
        for (spec, count) in &fired {
            println!("fired {spec}: {count} binding(s)");
        }
        if !stage.is_empty() {
            println!("\nStage:\n{stage}");
        }
    }
    Ok(reports.iter().all(|r| !r.is_failed()))
}

fn compile(settings: Settings, sentence: &str, raw: bool) -> Result<(), AppError> {
    let session = Session::with_demo(settings, &StageHandle::new())?;
    let compiled = session.compile(sentence)?;
    if raw {
        let out = json!({
            "tree": compiled.root.as_ref().map(|root| root.to_json()),
            "skipped": compiled.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap());
        return Ok(());
    }
    match &compiled.root {
        Some(root) => println!("{}", describe_node(root)),
        None => println!("(no keywords)"),
    }
    if !compiled.skipped.is_empty() {
        println!("skipped: {}", compiled.skipped.join(" "));
    }
    Ok(())
}

fn keywords(settings: Settings, schema: bool, raw: bool) -> Result<(), AppError> {
    if schema {
        println!("{}", serde_json::to_string_pretty(&catalog_schema()).unwrap());
        return Ok(());
    }
    let session = Session::with_demo(settings, &StageHandle::new())?;
    let registry = session.registry().read();
    if raw {
        let entries: Vec<_> = registry
            .entries()
            .map(|(word, entry)| json!({ "word": word, "keyword": entry.canonical_id, "type": entry.ty }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries).unwrap());
    } else {
        println!("{}", describe_registry(&registry));
    }
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let raw = cli.json;

    let result = load_settings(cli.settings.as_deref()).and_then(|mut settings| match &cli.command {
        Commands::Run {
            script,
            fire,
            catalog,
        } => {
            if catalog.is_some() {
                settings.catalog.clone_from(catalog);
            }
            run(settings, script, fire, raw)
        }
        Commands::Compile { sentence } => compile(settings, sentence, raw).map(|()| true),
        Commands::Keywords { schema } => keywords(settings, *schema, raw).map(|()| true),
    });

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
