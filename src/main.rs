//! gempaview - Indonesian earthquake catalog and prediction viewer.
//!
//! Terminal views over an earthquake backend's catalog and LSTM
//! predictions, plus a web dashboard with the same panels.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use gempaview::cli::{self, Cli, Command};
use gempaview::client::{ClientConfig, GempaClient};
use gempaview::models::{Quake, map_locations};
use gempaview::output::{self, Format};
use gempaview::predictions;
use gempaview::provinces;
use gempaview::server;
use gempaview::styling::{BOLD, DIM, RESET};
use gempaview::view::ViewState;
use gempaview::{chart, dedup, map, sidebar};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let config = cli.client_config();
    match cli.command {
        Command::Recent(args) => cmd_recent(&config, &args),
        Command::Map(args) => cmd_map(&config, &args),
        Command::Popup(args) => cmd_popup(&config, &args),
        Command::Predict(args) => cmd_predict(&config, &args),
        Command::Provinces => cmd_provinces(),
        Command::Risk(args) => cmd_risk(&config, &args),
        Command::Chart(args) => cmd_chart(&config, &args),
        Command::Watch(args) => cmd_watch(&config, &args),
        Command::Ui(args) => cmd_ui(&config, &args),
    }
}

/// Initialize tracing subscriber. `RUST_LOG` wins over the flags.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn connect(config: &ClientConfig) -> Result<GempaClient> {
    GempaClient::new(config).context("failed to create backend client")
}

/// Exit code for a rendered view: its error branch already told the user.
fn exit_for<T>(view: &ViewState<T>) -> ExitCode {
    if matches!(view, ViewState::Error(_)) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Fetch and normalize the newest `limit` catalog events.
fn fetch_quakes(client: &GempaClient, limit: usize) -> Result<Vec<Quake>, gempaview::GempaError> {
    let records = client.fetch_katalog(limit)?;
    Ok(Quake::from_records(&records))
}

/// Execute the `recent` command - classification and latest events.
fn cmd_recent(config: &ClientConfig, args: &cli::RecentArgs) -> Result<ExitCode> {
    let client = connect(config)?;
    let filter = args.filter.to_filter();
    let fetched = fetch_quakes(&client, args.limit).map(|quakes| filter.apply(quakes));

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.format != Format::Human {
        let quakes = fetched.context("failed to fetch earthquake catalog")?;
        output::write_quakes(&mut handle, &quakes, args.format)?;
        return Ok(ExitCode::SUCCESS);
    }

    let view = ViewState::from_result(fetched);
    sidebar::write_sidebar(&mut handle, &view)?;
    Ok(exit_for(&view))
}

/// Execute the `map` command - magnitude-colored markers on the base map.
fn cmd_map(config: &ClientConfig, args: &cli::MapArgs) -> Result<ExitCode> {
    let client = connect(config)?;
    let filter = args.filter.to_filter();
    let view = ViewState::from_result(fetch_quakes(&client, args.limit))
        .map(|quakes| map_locations(&filter.apply(quakes)));

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    map::write_quake_map(&mut handle, &view, args.grid.grid())?;
    Ok(exit_for(&view))
}

/// Execute the `popup` command - what clicking a marker shows.
fn cmd_popup(config: &ClientConfig, args: &cli::PopupArgs) -> Result<ExitCode> {
    let client = connect(config)?;
    let quakes = fetch_quakes(&client, args.limit).context("failed to fetch earthquake catalog")?;
    let locations = map_locations(&quakes);

    let location = match &args.id {
        Some(id) => locations
            .into_iter()
            .find(|l| &l.id == id)
            .with_context(|| format!("no mappable event with id {id} in the last {} records", args.limit))?,
        None => locations
            .into_iter()
            .next()
            .context("no mappable event in the catalog")?,
    };

    let view = ViewState::from_result(client.predict(&location.province)).map(|p| p.probability);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    predictions::write_popup(&mut handle, &location, &view)?;
    Ok(exit_for(&view))
}

/// Province name as the backend spells it, when it is one we know.
fn canonical_province(input: &str) -> String {
    match provinces::find_loose(input) {
        Some(province) => province.name.to_string(),
        None => {
            tracing::warn!("'{}' is not a known province, sending as-is", input.trim());
            input.trim().to_string()
        }
    }
}

/// Execute the `predict` command - one province's 30-day probability.
fn cmd_predict(config: &ClientConfig, args: &cli::PredictArgs) -> Result<ExitCode> {
    let client = connect(config)?;
    let provinsi = canonical_province(&args.provinsi);
    let result = client.predict(&provinsi);

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.format != Format::Human {
        let prediction = result.with_context(|| format!("failed to predict for {provinsi}"))?;
        output::write_prediction_json(&mut handle, &prediction, args.format)?;
        return Ok(ExitCode::SUCCESS);
    }

    let view = ViewState::from_result(result);
    predictions::write_detail(&mut handle, &view)?;
    Ok(exit_for(&view))
}

/// Execute the `provinces` command.
fn cmd_provinces() -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for province in &provinces::PROVINCES {
        writeln!(
            handle,
            "{DIM}{:<6}{RESET} {:<26} {DIM}{:>6.2}, {:>7.2}{RESET}",
            province.id, province.name, province.lat, province.lon
        )?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute the `risk` command - every province on the prediction map.
fn cmd_risk(config: &ClientConfig, args: &cli::RiskArgs) -> Result<ExitCode> {
    let client = connect(config)?;
    let report = predictions::fetch_every_province(&client, args.concurrency);

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if args.format != Format::Human {
        output::write_risks(&mut handle, &report.entries, args.format)?;
        if let Some(error) = report.error {
            anyhow::bail!(error);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let selection = args.select.as_deref().map(|name| {
        let name = canonical_province(name);
        ViewState::from_result(predictions::select(&report.entries, &name))
    });

    let view = report.into_view();
    map::write_risk_map(&mut handle, &view, args.grid.grid())?;

    if let (ViewState::Ready(_), Some(selection)) = (&view, &selection) {
        writeln!(handle)?;
        predictions::write_detail(&mut handle, selection)?;
    }
    Ok(exit_for(&view))
}

/// Execute the `chart` command - events per province.
fn cmd_chart(config: &ClientConfig, args: &cli::ChartArgs) -> Result<ExitCode> {
    let client = connect(config)?;
    let view = ViewState::from_result(fetch_quakes(&client, args.limit))
        .map(|quakes| chart::count_by_province(&quakes));

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    chart::write_chart(&mut handle, &view, args.limit, args.width.max(1))?;
    Ok(exit_for(&view))
}

/// Execute the `watch` command - print new catalog events as they appear.
fn cmd_watch(config: &ClientConfig, args: &cli::WatchArgs) -> Result<ExitCode> {
    let poll_interval = args.poll_interval.max(server::MIN_POLL_INTERVAL);
    if poll_interval != args.poll_interval {
        tracing::warn!(
            "poll interval clamped to minimum of {} seconds",
            server::MIN_POLL_INTERVAL
        );
    }

    let client = connect(config)?;
    let filter = args.filter.to_filter();
    let mut dedup = dedup::DedupeRing::with_default_capacity();

    tracing::info!(
        "watching {} (poll every {}s)",
        client.base_url(),
        poll_interval
    );

    if args.format == Format::Human {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{BOLD}gempaview watch{RESET}")?;
        writeln!(
            handle,
            "{DIM}Backend: {} | Poll: {}s | Press Ctrl+C to stop{RESET}",
            client.base_url(),
            poll_interval
        )?;
        writeln!(handle, "{DIM}{}{RESET}", "─".repeat(69))?;
    }

    let mut poll_count = 0u64;

    loop {
        poll_count += 1;

        match fetch_quakes(&client, args.limit) {
            Ok(quakes) => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                let mut new_count = 0u64;
                let mut update_count = 0u64;

                // The catalog is newest first; print in arrival order
                for quake in quakes.iter().rev() {
                    if !filter.matches(quake) {
                        continue;
                    }

                    let result = dedup.check(quake);
                    if !result.should_emit() {
                        continue;
                    }

                    if result.is_update() {
                        update_count += 1;
                        if args.format == Format::Human {
                            write!(handle, "{DIM}↻ UPDATE: {RESET}")?;
                        }
                    } else {
                        new_count += 1;
                    }

                    if let Err(e) = output::write_quakes(&mut handle, std::slice::from_ref(quake), args.format) {
                        tracing::warn!("failed to write event: {}", e);
                    }
                    let _ = handle.flush();
                }

                if new_count > 0 || update_count > 0 {
                    tracing::debug!(
                        "poll #{}: {} new, {} updates (dedup rate: {:.1}%)",
                        poll_count,
                        new_count,
                        update_count,
                        dedup.dupe_rate() * 100.0
                    );
                }
            }
            Err(e) => {
                tracing::warn!("fetch failed, will retry: {}", e);
            }
        }

        std::thread::sleep(Duration::from_secs(poll_interval));
    }
}

/// Execute the `ui` command - start the web dashboard.
fn cmd_ui(config: &ClientConfig, args: &cli::UiArgs) -> Result<ExitCode> {
    // Built outside the runtime: the blocking client must not be created
    // or dropped on an async worker.
    let client = Arc::new(connect(config)?);

    let server_config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        poll_interval: args.poll_interval.max(server::MIN_POLL_INTERVAL),
        concurrency: args.concurrency.max(1),
        ..Default::default()
    };

    let url = format!("http://{}:{}", args.host, args.port);
    println!("{BOLD}gempaview dashboard{RESET}");
    println!("{DIM}───────────────────────────────────────{RESET}");
    println!("  Local:    \x1b[96m{url}{RESET}");
    println!("  Backend:  {}", client.base_url());
    println!("  Poll:     {}s", server_config.poll_interval);
    println!("{DIM}───────────────────────────────────────{RESET}");
    println!("{DIM}Press Ctrl+C to stop{RESET}\n");

    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    runtime.block_on(server::run_server(Arc::clone(&client), server_config))?;
    drop(runtime);
    Ok(ExitCode::SUCCESS)
}
