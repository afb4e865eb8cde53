use std::fmt::Display;
use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program runs rtl_433, decodes the weather sensor packets it prints, and writes one JSON record per line for each observation selected by the sensor map.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program runs rtl_433, decodes the weather sensor packets it prints, and writes one JSON record per line for each observation selected by the sensor map.

Every decoded observation is named by a fingerprint:

    observation.sensor_id.decoder

like "temperature.0064.AcuriteTowerPacket". The sensor map selects fingerprints with dot-separated glob patterns and renames them. Find out what your sensors report with

    rtlnormd --action show-packets

or

    rtlnormd --action show-detected

and then map what you want:

    rtlnormd --map 'outTemp=temperature.*.AcuriteTowerPacket' \
             --map 'rain_total=rain_total.*.Acurite5n1Packet'

Longer maps belong in a --config file:

    cmd = "rtl_433 -M utc -F json"
    log_unmapped_sensors = true

    [sensor_map]
    outTemp = "temperature.*.AcuriteTowerPacket"
    rain_total = "rain_total.*.Acurite5n1Packet"

    [deltas]
    rain = "rain_total"

Records include a "rain" field derived from "rain_total", and a "strikes" field derived from "strikes_total", unless [deltas] says otherwise.

Use --file to read saved rtl_433 output instead of running it.
"#;

const SOURCE: &str = "rtl_433 Options";

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even records
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// What to do
    #[arg(short, long, value_enum, default_value_t = Action::ShowRecords)]
    pub action: Action,

    /// Output to hide with --action show-packets
    #[arg(long, value_enum, value_delimiter = ',', default_value = "empty")]
    pub hide: Vec<Hide>,

    /// Add TARGET=PATTERN to the sensor map (repeatable)
    #[arg(short, long, value_name = "TARGET=PATTERN", value_parser = parse_mapping)]
    pub map: Vec<(String, String)>,

    /// Log packets which no decoder recognizes
    #[arg(long)]
    pub log_unknown: bool,

    /// Log decoded packets which the sensor map does not select
    #[arg(long)]
    pub log_unmapped: bool,

    /// Read rtl_433 output from a file (or "-" for stdin)
    ///
    /// rtl_433 is not started.
    #[arg(long)]
    #[arg(help_heading = SOURCE)]
    pub file: Option<String>,

    /// rtl_433 command line
    ///
    /// Split on whitespace, without shell interpretation.
    /// Defaults to "rtl_433 -M utc -F json".
    #[arg(long)]
    #[arg(help_heading = SOURCE)]
    pub cmd: Option<String>,

    /// Directory to prepend to PATH
    #[arg(long)]
    #[arg(help_heading = SOURCE)]
    pub path: Option<PathBuf>,

    /// LD_LIBRARY_PATH for rtl_433
    #[arg(long)]
    #[arg(help_heading = SOURCE)]
    pub ld_library_path: Option<PathBuf>,

    /// Quiet period which ends a text packet (ms)
    #[arg(long, default_value_t = 3000)]
    #[arg(hide_short_help = true)]
    #[arg(help_heading = SOURCE)]
    pub wait_ms: u64,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file.as_deref() == Some(STDIN_FILE)
    }

    /// True if `kind` of output is hidden
    pub fn is_hidden(&self, kind: Hide) -> bool {
        self.hide.contains(&kind)
    }
}

/// Program actions
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Print each selected record as JSON
    ShowRecords,

    /// Print raw output and decoded packets
    ShowPackets,

    /// Print a running count of each sensor seen
    ShowDetected,

    /// Print the supported decoders and exit
    ListSupported,
}

/// Kinds of output for --action show-packets
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hide {
    /// Raw rtl_433 output
    Out,

    /// Decoded packets
    Parsed,

    /// Output which no decoder accepted
    Unparsed,

    /// Empty output
    Empty,
}

fn parse_mapping(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((target, pattern)) if !target.trim().is_empty() && !pattern.trim().is_empty() => {
            Ok((target.trim().to_owned(), pattern.trim().to_owned()))
        }
        _ => Err(format!("expected TARGET=PATTERN, got \"{}\"", s)),
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["rtlnormd"]).expect("args");
        assert_eq!(args.action, Action::ShowRecords);
        assert_eq!(args.hide, vec![Hide::Empty]);
        assert!(args.is_hidden(Hide::Empty));
        assert!(!args.is_hidden(Hide::Parsed));
        assert!(!args.input_is_stdin());
        assert_eq!(args.wait_ms, 3000);
    }

    #[test]
    fn test_options() {
        let args = Args::try_parse_from([
            "rtlnormd",
            "--action",
            "show-packets",
            "--hide",
            "out,unparsed",
            "--map",
            "outTemp=temperature.*.AcuriteTowerPacket",
            "-m",
            "rain_total = rain_total.*.*",
            "--file",
            "-",
            "-vv",
        ])
        .expect("args");

        assert_eq!(args.action, Action::ShowPackets);
        assert_eq!(args.hide, vec![Hide::Out, Hide::Unparsed]);
        assert_eq!(
            args.map,
            vec![
                (
                    "outTemp".to_owned(),
                    "temperature.*.AcuriteTowerPacket".to_owned()
                ),
                ("rain_total".to_owned(), "rain_total.*.*".to_owned()),
            ]
        );
        assert!(args.input_is_stdin());
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_bad_mapping() {
        assert!(parse_mapping("outTemp").is_err());
        assert!(parse_mapping("=temperature.*.*").is_err());
        assert!(Args::try_parse_from(["rtlnormd", "--map", "outTemp="]).is_err());
    }
}
