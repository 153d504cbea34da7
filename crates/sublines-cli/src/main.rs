// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use runtime::TuiRuntime;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use sublines_app::{
    AppState, Dataset, EventSelector, ExportArtifact, ViewState, build_export, filter_view,
};
use sublines_data::DataSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SUBLINES_LOG";
const LOG_FILE_NAME: &str = "sublines.log";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let headless = options.check_only || options.export;
    init_logging(headless)?;

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `sublines --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let dataset = load_startup_dataset(&options, &config)?;

    if options.check_only {
        println!(
            "ok: {} languages, {} event types",
            dataset.len(),
            dataset.event_types().len()
        );
        return Ok(());
    }

    if options.export {
        let artifact = export_view(&dataset, &options.query, options.event.as_deref())?;
        info!(rows = artifact.row_count, "headless export");
        println!("{}", artifact.contents);
        return Ok(());
    }

    let mut runtime = TuiRuntime::new(config.export_dir()?, config.copy_ack()?);
    let mut state = AppState::new(dataset);
    sublines_tui::run_app(&mut state, &mut runtime)
}

fn load_startup_dataset(options: &CliOptions, config: &Config) -> Result<Dataset> {
    if options.demo {
        return sublines_data::demo_dataset();
    }

    let source = match &options.data {
        Some(raw) => DataSource::parse(raw)?,
        None => config.data_source()?,
    };
    sublines_data::load_dataset(&source, config.load_timeout()?).with_context(|| {
        format!(
            "cannot start without a dataset from {source}; set [data].source, SUBLINES_DATA_SOURCE, or pass --data"
        )
    })
}

/// Builds the CSV for the view described by `query` and an optional event
/// type, exactly as the interactive export would.
fn export_view(dataset: &Dataset, query: &str, event: Option<&str>) -> Result<ExportArtifact> {
    let selector = match event {
        Some(label) => EventSelector::from_label(label),
        None => EventSelector::All,
    };
    if let EventSelector::Only(event) = &selector
        && !dataset.is_known_event(event)
    {
        bail!(
            "unknown event type {:?}; expected one of: {}",
            event.as_str(),
            dataset
                .event_types()
                .iter()
                .map(|known| known.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let view = ViewState {
        query: query.to_owned(),
        selector,
    };
    Ok(build_export(&filter_view(dataset, &view)))
}

fn init_logging(headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // The terminal belongs to the UI, so interactive runs log to a file.
    let installed = if headless {
        builder.with_writer(std::io::stderr).try_init()
    } else {
        let path = sublines_data::cache_dir()?.join(LOG_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    };
    installed.map_err(|error| anyhow!("install log subscriber: {error}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    data: Option<String>,
    query: String,
    event: Option<String>,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    check_only: bool,
    export: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        data: None,
        query: String::new(),
        event: None,
        print_config_path: false,
        print_example: false,
        demo: false,
        check_only: false,
        export: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--data" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--data requires a file path or http(s) URL"))?;
                options.data = Some(value.as_ref().to_owned());
            }
            "--query" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--query requires a search string"))?;
                options.query = value.as_ref().to_owned();
            }
            "--event" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--event requires an event type"))?;
                options.event = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--export" => {
                options.export = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.demo && options.data.is_some() {
        bail!("--demo and --data are mutually exclusive; pick one dataset");
    }
    if !options.export && (!options.query.is_empty() || options.event.is_some()) {
        bail!("--query and --event only apply to --export");
    }

    Ok(options)
}

fn print_help() {
    println!("sublines: browse and export commit subject templates");
    println!("  --config <path>          Use a specific config path");
    println!("  --data <path|url>        Load the dataset from this file or http(s) URL");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with the bundled demo dataset");
    println!("  --check                  Load and validate config + dataset, then exit");
    println!("  --export                 Write the CSV export to stdout and exit");
    println!("  --query <text>           Search text for --export");
    println!("  --event <type>           Event type filter for --export");
    println!("  --help                   Show this help");
}
