use std::io;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{debug, error, info, warn, LevelFilter};

use rtlnorm::{Config, Fetch, LineReader, LineReceiver, Pipeline, Registry};

mod app;
mod cli;
mod spawner;

use cli::{Action, Args, CliError};
use spawner::ProcManager;

fn main() {
    match rtlnormd() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn rtlnormd() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    if args.action == Action::ListSupported {
        app::list_supported(&Registry::default(), &mut io::stdout().lock())
            .context("unable to write to stdout")?;
        return Ok(());
    }

    let config = config_setup(&args)?;
    let mut pipeline = config.pipeline_builder().build();
    let wait = Duration::from_millis(args.wait_ms);

    match &args.file {
        Some(_) => {
            let (mut reader, lines) = file_setup(&args, wait)?;
            run(&args, &mut pipeline, lines)?;
            reader.shutdown(wait);
            Ok(())
        }
        None => run_child(&args, &config, &mut pipeline, wait),
    }
}

// run rtl_433 until it exits, which is an error unless our own
// standard output was closed first
fn run_child(
    args: &Args,
    config: &Config,
    pipeline: &mut Pipeline,
    wait: Duration,
) -> Result<(), CliError> {
    let mut mgr = ProcManager::spawn(config, wait)
        .with_context(|| format!("unable to start \"{}\"", config.cmd))?;

    let stdout = mgr
        .take_stdout()
        .ok_or_else(|| anyhow!("no standard output from child process"))?;

    let result = {
        let mgr = &mgr;
        let input = stdout.inspect(|_| {
            for line in mgr.drain_stderr() {
                debug!("rtl_433: {}", line);
            }
        });
        run(args, pipeline, input)
    };

    let status = mgr.shutdown();
    if let Ok(Finish::Closed) = result {
        for line in mgr.drain_stderr() {
            debug!("rtl_433: {}", line);
        }
        return Ok(());
    }

    for line in mgr.drain_stderr() {
        error!("rtl_433: {}", line);
    }
    result?;

    match status {
        Some(status) => Err(anyhow!("rtl_433 exited: {}", status).into()),
        None => Err(anyhow!("rtl_433 exited").into()),
    }
}

/// How an action stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Finish {
    /// The input ran out
    Exhausted,

    /// Our standard output was closed
    Closed,
}

fn run<I>(args: &Args, pipeline: &mut Pipeline, input: I) -> Result<Finish, CliError>
where
    I: Iterator<Item = Fetch>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    Ok(finish(app::run(args, pipeline, input, &mut out))?)
}

// a closed stdout ends the program quietly
fn finish(result: io::Result<()>) -> Result<Finish, anyhow::Error> {
    match result {
        Ok(()) => Ok(Finish::Exhausted),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            info!("standard output closed");
            Ok(Finish::Closed)
        }
        Err(e) => Err(e).context("unable to write to stdout"),
    }
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("rtlnorm", log_filter)
            .filter_module("rtlnormd", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

// config file, then command-line overrides
fn config_setup(args: &Args) -> Result<Config, anyhow::Error> {
    let mut config = match &args.config {
        Some(path) => {
            info!("reading configuration: \"{}\"", path.display());
            Config::from_file(path)
                .with_context(|| format!("Unable to load --config \"{}\"", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(cmd) = &args.cmd {
        config.cmd = cmd.clone();
    }
    if let Some(path) = &args.path {
        config.path = Some(path.clone());
    }
    if let Some(ld_library_path) = &args.ld_library_path {
        config.ld_library_path = Some(ld_library_path.clone());
    }
    for (target, pattern) in &args.map {
        config.sensor_map.insert(target.as_str(), pattern);
    }
    config.log_unknown_sensors |= args.log_unknown;
    config.log_unmapped_sensors |= args.log_unmapped;

    config.validate().context("invalid configuration")?;

    if config.sensor_map.is_empty() && args.action == Action::ShowRecords {
        warn!("the sensor map is empty: no records will be printed");
    }
    Ok(config)
}

fn file_setup(args: &Args, wait: Duration) -> Result<(LineReader, LineReceiver), anyhow::Error> {
    if args.input_is_stdin() {
        info!("reading rtl_433 output from standard input");
        if is_terminal(&std::io::stdin()) {
            warn!("standard input is a terminal: paste rtl_433 output, then press Ctrl-D");
        }
        LineReader::with_receiver("stdin-reader", io::stdin(), wait)
            .context("unable to start reader thread")
    } else {
        let file = args.file.as_deref().unwrap_or_default();
        info!("reading rtl_433 output from file: \"{}\"", file);
        let fd = std::fs::File::open(file)
            .with_context(|| format!("Unable to open --file \"{}\"", file))?;
        LineReader::with_receiver("file-reader", fd, wait).context("unable to start reader thread")
    }
}

#[cfg(not(target_os = "windows"))]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::fd::AsRawFd,
{
    terminal_size::terminal_size_using_fd(stream.as_raw_fd()).is_some()
}

#[cfg(target_os = "windows")]
fn is_terminal<S>(stream: &S) -> bool
where
    S: std::os::windows::io::AsRawHandle,
{
    terminal_size::terminal_size_using_handle(stream.as_raw_handle()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish() {
        assert_eq!(finish(Ok(())).expect("finish"), Finish::Exhausted);
        assert_eq!(
            finish(Err(io::ErrorKind::BrokenPipe.into())).expect("finish"),
            Finish::Closed
        );
        assert!(finish(Err(io::ErrorKind::PermissionDenied.into())).is_err());
    }
}
