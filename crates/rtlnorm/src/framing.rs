//! Group raw output lines into message blocks
//!
//! rtl_433 writes two kinds of output. JSON output is one object
//! per line and needs no framing. The older text output describes
//! each transmission as a stanza: a timestamped header line
//! followed by any number of `label: value` lines. Nothing marks
//! the end of a stanza, so the only reliable delimiter is the
//! *start* of the next one, or a lull in the output.
//!
//! The [`Framer`] accepts [`Fetch`] events, one per attempt to
//! read a line, and emits [`MessageBlock`]s.

use std::fmt;

use arrayvec::ArrayVec;
use lazy_static::lazy_static;
use regex::Regex;

#[cfg(not(test))]
use log::trace;

#[cfg(test)]
use std::println as trace;

lazy_static! {
    static ref TIMESTAMP_PREFIX: Regex =
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("bad framing regexp");
}

/// One attempt to read a line from the source
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetch {
    /// A line of text, with or without its line terminator
    Line(String),

    /// No line arrived within the quiet period
    ///
    /// Any partially-accumulated block is released.
    Idle,

    /// The source is stopping
    ///
    /// Any partially-accumulated block is discarded.
    Shutdown,
}

/// Lines believed to describe one transmission
///
/// A block produced by [`Framer`] is never empty unless it
/// results from a quiet period with nothing pending. Callers
/// should treat empty blocks as no-ops.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MessageBlock {
    lines: Vec<String>,
}

impl MessageBlock {
    /// Block from lines
    ///
    /// Lines are stored as given. Use [`Framer`] to obtain
    /// properly-delimited blocks from a stream.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|s| s.into()).collect(),
        }
    }

    /// All lines, in arrival order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// First line, if any
    pub fn first(&self) -> Option<&str> {
        self.lines.first().map(|s| s.as_str())
    }

    /// Lines after the first
    pub fn rest(&self) -> &[String] {
        self.lines.get(1..).unwrap_or(&[])
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if the block contains no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True if the block is a JSON object
    pub fn is_json(&self) -> bool {
        self.first().map(is_json_line).unwrap_or(false)
    }

    /// Consume, returning the lines
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl fmt::Display for MessageBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.lines)
    }
}

/// Stream framer
///
/// Accumulates text stanzas and passes JSON lines through as
/// single-line blocks. Feed it with [`push()`](#method.push) or
/// wrap a source of [`Fetch`] events with
/// [`blocks()`](#method.blocks).
///
/// ```
/// use rtlnorm::{Fetch, Framer};
///
/// let mut framer = Framer::new();
/// assert!(framer.push(Fetch::Line("2020-01-01 00:00:00 :  Nexus".into())).is_empty());
/// assert!(framer.push(Fetch::Line("House Code: 42".into())).is_empty());
///
/// // a JSON line ends the pending stanza and stands alone
/// let out = framer.push(Fetch::Line(r#"{"model":"Nexus"}"#.into()));
/// assert_eq!(out.len(), 2);
/// assert_eq!(out[0].len(), 2);
/// assert!(out[1].is_json());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Framer {
    pending: Vec<String>,
    lines_seen: u64,
}

impl Framer {
    /// New framer with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one fetch event
    ///
    /// Returns zero, one, or two completed blocks, in order.
    /// Two blocks are emitted only when a JSON line arrives while
    /// a text stanza is pending.
    pub fn push(&mut self, fetch: Fetch) -> ArrayVec<MessageBlock, 2> {
        let mut out = ArrayVec::new();
        match fetch {
            Fetch::Line(line) => {
                let line = line.trim_end_matches(['\r', '\n']);
                if line.trim().is_empty() {
                    return out;
                }

                self.lines_seen += 1;
                trace!("framer [{:<8}]: {}", self.lines_seen, line);

                if is_json_line(line) {
                    if let Some(blk) = self.take_pending() {
                        out.push(blk);
                    }
                    out.push(MessageBlock::new([line]));
                } else {
                    if TIMESTAMP_PREFIX.is_match(line) {
                        if let Some(blk) = self.take_pending() {
                            out.push(blk);
                        }
                    }
                    self.pending.push(line.to_owned());
                }
            }
            Fetch::Idle => {
                out.push(MessageBlock {
                    lines: std::mem::take(&mut self.pending),
                });
            }
            Fetch::Shutdown => {
                if !self.pending.is_empty() {
                    trace!("framer: dropping partial block at shutdown");
                }
                self.pending.clear();
            }
        }
        out
    }

    /// Release the pending block, if any
    ///
    /// Call at the end of input.
    pub fn flush(&mut self) -> Option<MessageBlock> {
        self.take_pending()
    }

    /// Discard the pending block
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Number of lines pending
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Lifetime total of non-blank lines accepted
    pub fn lines_seen(&self) -> u64 {
        self.lines_seen
    }

    /// Frame a source of fetch events
    ///
    /// The returned iterator ends when the source ends, yielding
    /// any pending block first, or when the source reports
    /// [`Fetch::Shutdown`].
    pub fn blocks<'fr, I>(&'fr mut self, source: I) -> Blocks<'fr, I::IntoIter>
    where
        I: IntoIterator<Item = Fetch>,
    {
        Blocks {
            source: source.into_iter(),
            framer: self,
            ready: ArrayVec::new(),
            done: false,
        }
    }

    fn take_pending(&mut self) -> Option<MessageBlock> {
        if self.pending.is_empty() {
            None
        } else {
            Some(MessageBlock {
                lines: std::mem::take(&mut self.pending),
            })
        }
    }
}

/// Iterator over message blocks
///
/// See [`Framer::blocks()`].
#[derive(Debug)]
pub struct Blocks<'fr, I>
where
    I: Iterator<Item = Fetch>,
{
    source: I,
    framer: &'fr mut Framer,
    ready: ArrayVec<MessageBlock, 2>,
    done: bool,
}

impl<'fr, I> Iterator for Blocks<'fr, I>
where
    I: Iterator<Item = Fetch>,
{
    type Item = MessageBlock;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.ready.is_empty() {
                return Some(self.ready.remove(0));
            }
            if self.done {
                return None;
            }

            match self.source.next() {
                Some(Fetch::Shutdown) => {
                    self.framer.push(Fetch::Shutdown);
                    self.done = true;
                }
                Some(fetch) => {
                    self.ready = self.framer.push(fetch);
                }
                None => {
                    self.done = true;
                    if let Some(blk) = self.framer.flush() {
                        self.ready.push(blk);
                    }
                }
            }
        }
    }
}

fn is_json_line(line: &str) -> bool {
    line.starts_with('{')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<Fetch> {
        src.iter().map(|s| Fetch::Line(s.to_string())).collect()
    }

    #[test]
    fn test_text_stanzas() {
        let input = lines(&[
            "2016-11-04 04:47:51 :\tAcurite 5n1 sensor",
            "\tSensor ID: 0x0BFA",
            "\tWind speed: 3.0 mph",
            "",
            "2016-11-04 04:48:09 :\tAcurite 5n1 sensor\r\n",
            "\tSensor ID: 0x0BFA\n",
        ]);

        let mut framer = Framer::new();
        let out: Vec<MessageBlock> = framer.blocks(input).collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 3);
        assert_eq!(out[0].rest()[1], "\tWind speed: 3.0 mph");
        assert_eq!(out[1].first(), Some("2016-11-04 04:48:09 :\tAcurite 5n1 sensor"));
        assert_eq!(out[1].rest(), &["\tSensor ID: 0x0BFA".to_owned()]);
        assert_eq!(framer.lines_seen(), 5);
    }

    #[test]
    fn test_json_interleaved() {
        let mut input = lines(&[
            r#"{"time":"2020-01-01 00:00:00","model":"A"}"#,
            "2020-01-01 00:00:01 : Nexus",
            "House Code: 1",
            r#"{"time":"2020-01-01 00:00:02","model":"B"}"#,
            "2020-01-01 00:00:03 : Nexus",
        ]);
        input.push(Fetch::Shutdown);
        input.extend(lines(&["never seen"]));

        let mut framer = Framer::new();
        let out: Vec<MessageBlock> = framer.blocks(input).collect();

        // trailing stanza is dropped at shutdown
        assert_eq!(out.len(), 3);
        assert!(out[0].is_json());
        assert_eq!(out[1].len(), 2);
        assert!(!out[1].is_json());
        assert!(out[2].is_json());
        assert_eq!(framer.pending_len(), 0);
    }

    #[test]
    fn test_idle_releases_pending() {
        let mut framer = Framer::new();
        assert!(framer
            .push(Fetch::Line("2020-01-01 00:00:01 : Nexus".to_owned()))
            .is_empty());

        let out = framer.push(Fetch::Idle);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 1);

        // nothing pending: idle yields an empty block
        let out = framer.push(Fetch::Idle);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_empty());
        assert!(!out[0].is_json());
    }

    #[test]
    fn test_lines_without_header() {
        // continuation lines with no header still form a block
        let input = lines(&["Temperature: 10 C", "Humidity: 50 %"]);
        let mut framer = Framer::new();
        let out: Vec<MessageBlock> = framer.blocks(input).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 2);
    }

    #[test]
    fn test_source_end_flushes() {
        let mut framer = Framer::new();
        let out: Vec<MessageBlock> = framer
            .blocks(lines(&["2020-01-01 00:00:01 : Nexus"]))
            .collect();
        assert_eq!(out.len(), 1);
        assert!(framer.flush().is_none());
    }
}
