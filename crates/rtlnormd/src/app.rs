//! Program actions
//!
//! Each action consumes a source of [`Fetch`] events until it is
//! exhausted and writes its results, one per line.
//!
//! ```txt
//! show-records   {"dateTime":1577836800,"usUnits":16,"outTemp":10.0}
//! show-packets   out: [...]
//!                parsed: {...}
//!                unparsed: [...]
//! show-detected  {"0064.AcuriteTowerPacket":1}
//! ```

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

use rtlnorm::{Fetch, Framer, Pipeline, Registry};

use crate::cli::{Action, Args, Hide};

/// Run the selected action
///
/// `list-supported` ignores `input`. In `--quiet` mode, nothing
/// is written, but `input` is still consumed.
pub fn run<I, W>(args: &Args, pipeline: &mut Pipeline, input: I, out: &mut W) -> io::Result<()>
where
    I: Iterator<Item = Fetch>,
    W: Write,
{
    if args.quiet {
        return run_action(args, pipeline, input, &mut io::sink());
    }
    run_action(args, pipeline, input, out)
}

/// Print each decoder's name and identifier, in order
pub fn list_supported<W: Write>(registry: &Registry, out: &mut W) -> io::Result<()> {
    for decoder in registry.iter() {
        writeln!(out, "{}: {}", decoder.name(), decoder.identifier())?;
    }
    Ok(())
}

fn run_action<I, W>(args: &Args, pipeline: &mut Pipeline, input: I, out: &mut W) -> io::Result<()>
where
    I: Iterator<Item = Fetch>,
    W: Write,
{
    match args.action {
        Action::ShowRecords => show_records(pipeline, input, out),
        Action::ShowPackets => show_packets(args, pipeline, input, out),
        Action::ShowDetected => show_detected(pipeline, input, out),
        Action::ListSupported => list_supported(pipeline.registry(), out),
    }
}

fn show_records<I, W>(pipeline: &mut Pipeline, input: I, out: &mut W) -> io::Result<()>
where
    I: Iterator<Item = Fetch>,
    W: Write,
{
    for rec in pipeline.iter(input) {
        write_json(out, &rec)?;
    }
    Ok(())
}

fn show_packets<I, W>(args: &Args, pipeline: &Pipeline, input: I, out: &mut W) -> io::Result<()>
where
    I: Iterator<Item = Fetch>,
    W: Write,
{
    let hide_empty = args.is_hidden(Hide::Empty);

    let mut framer = Framer::new();
    for block in framer.blocks(input) {
        let shown = !hide_empty || !block.is_empty();

        if shown && !args.is_hidden(Hide::Out) {
            writeln!(out, "out: {}", block)?;
        }

        match pipeline.decode(&block) {
            Some(rec) => {
                if !args.is_hidden(Hide::Parsed) {
                    write!(out, "parsed: ")?;
                    write_json(out, &rec)?;
                }
            }
            None => {
                if shown && !args.is_hidden(Hide::Unparsed) {
                    writeln!(out, "unparsed: {}", block)?;
                }
            }
        }
    }
    Ok(())
}

fn show_detected<I, W>(pipeline: &Pipeline, input: I, out: &mut W) -> io::Result<()>
where
    I: Iterator<Item = Fetch>,
    W: Write,
{
    let mut detected: BTreeMap<String, u64> = BTreeMap::new();

    let mut framer = Framer::new();
    for block in framer.blocks(input) {
        let rec = match pipeline.decode(&block) {
            Some(rec) => rec,
            None => continue,
        };

        // sensor_id.decoder
        if let Some((_, label)) = rec.keys().next().and_then(|k| k.split_once('.')) {
            *detected.entry(label.to_owned()).or_insert(0) += 1;
        }
        write_json(out, &detected)?;
    }
    Ok(())
}

fn write_json<W, T>(out: &mut W, value: &T) -> io::Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;
    use rtlnorm::{PipelineBuilder, SensorMap};

    const TOWER: &str = r#"{"time":"2020-01-01 00:00:00","model":"Acurite-Tower","id":100,"channel":"A","temperature_C":10.0,"humidity":50,"battery_low":0}"#;
    const MYSTERY: &str = r#"{"time":"2020-01-01 00:00:00","model":"Mystery"}"#;

    fn run_str(argv: &[&str], input: &[Fetch]) -> String {
        let args = Args::try_parse_from(argv).expect("args");
        let map: SensorMap = [("outTemp", "temperature.*.AcuriteTowerPacket")]
            .into_iter()
            .collect();
        let mut pipeline = PipelineBuilder::new().with_sensor_map(map).build();

        let mut out = Vec::new();
        run(&args, &mut pipeline, input.iter().cloned(), &mut out).expect("run");
        String::from_utf8(out).expect("utf-8")
    }

    fn line(l: &str) -> Fetch {
        Fetch::Line(l.to_owned())
    }

    #[test]
    fn test_show_records() {
        let out = run_str(
            &["rtlnormd"],
            &[line(TOWER), line(TOWER), line(MYSTERY), Fetch::Idle],
        );
        assert_eq!(
            out,
            "{\"dateTime\":1577836800,\"usUnits\":16,\"outTemp\":10.0}\n"
        );

        let out = run_str(&["rtlnormd", "-q"], &[line(TOWER)]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_show_packets() {
        let out = run_str(
            &["rtlnormd", "--action", "show-packets"],
            &[line(TOWER), Fetch::Idle, line(MYSTERY)],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("out: "));
        assert!(lines[1].starts_with("parsed: {\"dateTime\":1577836800,\"usUnits\":16,"));
        assert!(lines[1].contains("\"temperature.0064.AcuriteTowerPacket\":10.0"));
        assert!(lines[2].starts_with("out: "));
        assert!(lines[3].starts_with("unparsed: "));

        let out = run_str(
            &["rtlnormd", "--action", "show-packets", "--hide", "out,parsed"],
            &[line(TOWER), line(MYSTERY)],
        );
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("unparsed: "));

        let out = run_str(
            &["rtlnormd", "--action", "show-packets", "--hide", "parsed"],
            &[Fetch::Idle],
        );
        assert_eq!(out, "out: []\nunparsed: []\n");
    }

    #[test]
    fn test_show_detected() {
        let out = run_str(
            &["rtlnormd", "--action", "show-detected"],
            &[line(TOWER), line(MYSTERY), line(TOWER)],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "{\"0064.AcuriteTowerPacket\":1}",
                "{\"0064.AcuriteTowerPacket\":2}",
            ]
        );
    }

    #[test]
    fn test_list_supported() {
        let out = run_str(&["rtlnormd", "--action", "list-supported"], &[]);
        let registry = Registry::default();
        assert_eq!(out.lines().count(), registry.len());
        assert!(out.starts_with(registry.iter().next().expect("decoder").name()));
        assert!(out.contains("NexusTemperaturePacket: \"Nexus Temperature\"\n"));
    }
}
