//! Background line readers
//!
//! A child process which writes to a full pipe stalls. A
//! [`LineReader`] thread does nothing but read lines and queue
//! them, so the pipe is always drained no matter how slowly the
//! pipeline consumes. The consumer side is a [`LineReceiver`],
//! which reports a quiet period as [`Fetch::Idle`] so the
//! [`Framer`](crate::Framer) can release a pending stanza.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};

use crate::framing::Fetch;

/// Default quiet period before a pending block is released
pub const DEFAULT_WAIT: Duration = Duration::from_secs(3);

const JOIN_POLL: Duration = Duration::from_millis(10);

/// Thread which forwards lines from a byte stream to a channel
///
/// Lines are decoded as UTF-8, lossily. The thread exits when the
/// stream ends, when the receiving side hangs up, or when asked
/// to [`stop()`](#method.stop) after its next line.
#[derive(Debug)]
pub struct LineReader {
    name: String,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LineReader {
    /// Start a reader thread which sends to `sender`
    ///
    /// The thread is named `name`. Returns an error only if the
    /// thread cannot be created.
    pub fn spawn<R>(name: &str, source: R, sender: Sender<String>) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let thread_name = name.to_owned();

        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || read_lines(&thread_name, source, sender, thread_stop))?;

        debug!("{}: started", name);
        Ok(Self {
            name: name.to_owned(),
            stop,
            handle: Some(handle),
        })
    }

    /// Start a reader thread with its own channel
    ///
    /// The returned [`LineReceiver`] waits up to `wait` for each
    /// line and stops producing lines once this reader is
    /// stopped.
    pub fn with_receiver<R>(
        name: &str,
        source: R,
        wait: Duration,
    ) -> io::Result<(Self, LineReceiver)>
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let reader = Self::spawn(name, source, tx)?;
        let receiver = LineReceiver::new(rx, wait).with_stop_flag(reader.stop.clone());
        Ok((reader, receiver))
    }

    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the thread to stop
    ///
    /// The thread notices after its current read completes.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// True if the thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Stop and wait up to `timeout` for the thread to exit
    ///
    /// Returns `true` if the thread exited in time. A thread
    /// which is blocked in a read that never completes is
    /// abandoned.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        self.stop();
        let handle = match self.handle.take() {
            Some(h) => h,
            None => return true,
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!("{}: timed out waiting for thread", self.name);
                return false;
            }
            thread::sleep(JOIN_POLL);
        }

        if handle.join().is_err() {
            warn!("{}: thread panicked", self.name);
        }
        true
    }
}

/// Channel consumer which reports quiet periods
///
/// Iterates [`Fetch`] events:
///
/// * [`Fetch::Line`] for each line received
/// * [`Fetch::Idle`] when no line arrives within the wait
/// * [`Fetch::Shutdown`] once, if the stop flag is raised
///
/// Iteration ends when every sender has hung up and the channel
/// is drained.
#[derive(Debug)]
pub struct LineReceiver {
    rx: Receiver<String>,
    wait: Duration,
    stop: Option<Arc<AtomicBool>>,
    stopped: bool,
}

impl LineReceiver {
    /// Wrap a channel, waiting up to `wait` for each line
    pub fn new(rx: Receiver<String>, wait: Duration) -> Self {
        Self {
            rx,
            wait,
            stop: None,
            stopped: false,
        }
    }

    /// End iteration with [`Fetch::Shutdown`] when `flag` is set
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Take every line which is immediately available
    pub fn drain(&self) -> Vec<String> {
        self.rx.try_iter().collect()
    }

    /// Quiet period
    pub fn wait(&self) -> Duration {
        self.wait
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .map(|f| f.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}

impl Iterator for LineReceiver {
    type Item = Fetch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }
        if self.stop_requested() {
            self.stopped = true;
            return Some(Fetch::Shutdown);
        }

        match self.rx.recv_timeout(self.wait) {
            Ok(line) => Some(Fetch::Line(line)),
            Err(RecvTimeoutError::Timeout) => Some(Fetch::Idle),
            Err(RecvTimeoutError::Disconnected) => {
                self.stopped = true;
                None
            }
        }
    }
}

fn read_lines<R>(name: &str, source: R, sender: Sender<String>, stop: Arc<AtomicBool>)
where
    R: Read,
{
    let mut rd = BufReader::new(source);
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        match rd.read_until(b'\n', &mut buf) {
            Ok(0) => {
                debug!("{}: end of stream", name);
                break;
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).into_owned();
                if sender.send(line).is_err() {
                    debug!("{}: receiver hung up", name);
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("{}: read failed: {}", name, e);
                break;
            }
        }

        if stop.load(Ordering::SeqCst) {
            debug!("{}: stopping", name);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    #[test]
    fn test_reader_to_receiver() {
        let src = Cursor::new(b"first\r\nsecond\n\xfflast".to_vec());
        let (mut reader, receiver) =
            LineReader::with_receiver("test-reader", src, Duration::from_millis(500))
                .expect("spawn");
        assert_eq!(reader.name(), "test-reader");

        let got: Vec<Fetch> = receiver.collect();
        assert_eq!(
            got,
            vec![
                Fetch::Line("first\r\n".to_owned()),
                Fetch::Line("second\n".to_owned()),
                Fetch::Line("\u{fffd}last".to_owned()),
            ]
        );
        assert!(reader.shutdown(Duration::from_secs(5)));
        assert!(reader.is_finished());
    }

    #[test]
    fn test_receiver_idle_and_stop() {
        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        let flag = Arc::new(AtomicBool::new(false));
        let mut receiver =
            LineReceiver::new(rx, Duration::from_millis(5)).with_stop_flag(flag.clone());

        assert_eq!(receiver.next(), Some(Fetch::Idle));
        tx.send("abc".to_owned()).expect("send");
        assert_eq!(receiver.next(), Some(Fetch::Line("abc".to_owned())));

        flag.store(true, Ordering::SeqCst);
        assert_eq!(receiver.next(), Some(Fetch::Shutdown));
        assert_eq!(receiver.next(), None);
    }

    #[test]
    fn test_receiver_drain() {
        let (tx, rx) = crossbeam_channel::unbounded::<String>();
        let receiver = LineReceiver::new(rx, DEFAULT_WAIT);
        tx.send("a".to_owned()).expect("send");
        tx.send("b".to_owned()).expect("send");
        assert_eq!(receiver.drain(), vec!["a".to_owned(), "b".to_owned()]);
        assert!(receiver.drain().is_empty());
    }
}
