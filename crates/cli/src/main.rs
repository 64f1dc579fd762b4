use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use conductor_engine::{DirectoryDefinitionSource, MockAgentExecutor, RunState, WorkflowEngine};
use conductor_util::ConductorConfig;
use tracing::info;

const DEFAULT_POLL_MS: u64 = 200;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConductorConfig::load().context("failed to load conductor config")?;
    init_tracing(config.log_filter.as_deref());

    let matches = build_cli().get_matches();
    let workflows_dir = config.resolve_workflows_dir(workflows_dir_arg(&matches).as_deref());
    info!(workflows_dir = %workflows_dir.display(), "using workflow directory");

    let agents = Arc::new(MockAgentExecutor::new().with_overrides(&config.agents));
    let engine = WorkflowEngine::with_source(DirectoryDefinitionSource::new(workflows_dir), agents);

    match matches.subcommand() {
        Some(("workflows", sub)) => run_workflows_cmd(&engine, sub),
        Some(("run", sub)) => run_workflow(&engine, sub).await,
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn init_tracing(configured: Option<&str>) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_cli() -> Command {
    Command::new("conductor")
        .about("Run multi-step agent workflows")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("workflows-dir")
                .long("workflows-dir")
                .global(true)
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf))
                .help("Directory containing workflow definitions"),
        )
        .subcommand(
            Command::new("workflows")
                .about("Inspect workflow definitions")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List loaded workflow names"))
                .subcommand(
                    Command::new("show")
                        .about("Print a workflow definition as JSON")
                        .arg(Arg::new("name").required(true).help("Workflow name")),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Start a workflow run and poll it until it finishes")
                .arg(Arg::new("name").required(true).help("Workflow name"))
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .action(ArgAction::Append)
                        .value_name("KEY=VALUE")
                        .help("Workflow input; may be repeated"),
                )
                .arg(
                    Arg::new("poll-ms")
                        .long("poll-ms")
                        .action(ArgAction::Set)
                        .value_parser(value_parser!(u64))
                        .default_value("200")
                        .help("Polling interval in milliseconds"),
                ),
        )
}

/// `--workflows-dir` is global, so it may have been given at any subcommand depth.
fn workflows_dir_arg(matches: &ArgMatches) -> Option<PathBuf> {
    matches
        .subcommand()
        .and_then(|(_, sub)| workflows_dir_arg(sub))
        .or_else(|| matches.get_one::<PathBuf>("workflows-dir").cloned())
}

fn run_workflows_cmd(engine: &WorkflowEngine, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => {
            let definitions = engine.list_definitions();
            if definitions.is_empty() {
                println!("No workflows found");
            }
            for definition in definitions {
                if definition.description.is_empty() {
                    println!("{}", definition.name);
                } else {
                    println!("{}\t{}", definition.name, definition.description);
                }
            }
        }
        Some(("show", sub)) => {
            let name = sub.get_one::<String>("name").context("workflow name is required")?;
            let view = engine.get_definition(name)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        _ => unreachable!("clap requires a subcommand"),
    }
    Ok(())
}

async fn run_workflow(engine: &WorkflowEngine, matches: &ArgMatches) -> Result<()> {
    let name = matches.get_one::<String>("name").context("workflow name is required")?;
    let inputs = parse_inputs(matches.get_many::<String>("input").into_iter().flatten())?;
    let poll_ms = matches.get_one::<u64>("poll-ms").copied().unwrap_or(DEFAULT_POLL_MS);

    let run_id = engine.start_run(name, &inputs)?;
    info!(run_id = %run_id, workflow = %name, "run started");

    let mut last_printed: Option<RunState> = None;
    loop {
        let snapshot = engine.get_run(&run_id)?;
        if last_printed.as_ref() != Some(&snapshot) {
            println!("{}", serde_json::to_string(&snapshot)?);
        }
        if snapshot.is_terminal() {
            if let Some(error) = &snapshot.error {
                bail!("workflow run {run_id} failed: {error}");
            }
            return Ok(());
        }
        last_printed = Some(snapshot);
        tokio::time::sleep(Duration::from_millis(poll_ms)).await;
    }
}

fn parse_inputs<'a>(pairs: impl IntoIterator<Item = &'a String>) -> Result<HashMap<String, String>> {
    pairs
        .into_iter()
        .map(|pair| -> Result<(String, String)> {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("invalid input '{pair}': expected KEY=VALUE"))?;
            let key = key.trim();
            if key.is_empty() {
                bail!("invalid input '{pair}': key is empty");
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}
