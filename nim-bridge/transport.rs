use std::{
  io::{
    BufRead,
    BufReader,
    Write,
  },
  path::Path,
  process::{
    Child,
    ChildStderr,
    ChildStdin,
    ChildStdout,
    Command,
    Stdio,
  },
  sync::mpsc::{
    Receiver,
    RecvTimeoutError,
    Sender,
    channel,
  },
  thread::{
    self,
    JoinHandle,
  },
  time::{
    Duration,
    Instant,
  },
};

use thiserror::Error;
use tracing::debug;

use crate::config::BridgeConfig;

/// Printed by the analyzer once it is ready for its first request, and again
/// after every response.
const READY_PROMPT: &[u8] = b"> ";
/// Every response ends with a blank line followed by the next prompt.
const RESPONSE_END: &[u8] = b"\r\n\r\n> ";

const READY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
enum StreamEvent {
  Data(Vec<u8>),
  Closed,
  ReadError(String),
}

/// One long-lived interactive analyzer process bound to a single file.
///
/// The analyzer speaks a line-oriented REPL: requests are single lines
/// terminated by a carriage return, responses are everything up to the next
/// prompt marker. Queries against one transport must be issued one at a
/// time; interleaving writes before reading the prior response corrupts
/// both in-flight exchanges.
pub struct AnalyzerTransport {
  child:         Child,
  stdin:         Option<ChildStdin>,
  stream_rx:     Receiver<StreamEvent>,
  buffer:        Vec<u8>,
  reader_thread: Option<JoinHandle<()>>,
  stderr_thread: Option<JoinHandle<()>>,
}

impl AnalyzerTransport {
  /// Spawns the analyzer against `file` and blocks until its first ready
  /// prompt, bounded by a timeout.
  pub fn spawn(config: &BridgeConfig, file: &Path) -> Result<Self, TransportError> {
    let mut process = Command::new(config.executable());
    process
      .arg("--colors:off")
      .arg("--stdin")
      .arg("--refresh")
      .arg(format!("--maxresults:{}", config.max_results()))
      .arg(file)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());

    let mut child = process.spawn().map_err(TransportError::Spawn)?;
    let stdin = child
      .stdin
      .take()
      .ok_or(TransportError::MissingPipe("stdin"))?;
    let stdout = child
      .stdout
      .take()
      .ok_or(TransportError::MissingPipe("stdout"))?;
    let stderr = child
      .stderr
      .take()
      .ok_or(TransportError::MissingPipe("stderr"))?;

    let (stream_tx, stream_rx) = channel();
    let reader_thread = Some(spawn_reader_thread(stdout, stream_tx));
    let stderr_thread = Some(spawn_stderr_thread(stderr));

    let mut transport = Self {
      child,
      stdin: Some(stdin),
      stream_rx,
      buffer: Vec::new(),
      reader_thread,
      stderr_thread,
    };
    transport.await_ready()?;
    Ok(transport)
  }

  fn await_ready(&mut self) -> Result<(), TransportError> {
    let deadline = Instant::now() + READY_TIMEOUT;
    loop {
      if let Some(idx) = find_marker(&self.buffer, READY_PROMPT) {
        self.buffer.drain(..idx + READY_PROMPT.len());
        return Ok(());
      }
      let remaining = deadline.saturating_duration_since(Instant::now());
      if remaining.is_zero() {
        return Err(TransportError::ReadyTimeout);
      }
      match self.stream_rx.recv_timeout(remaining) {
        Ok(StreamEvent::Data(chunk)) => self.buffer.extend_from_slice(&chunk),
        Ok(StreamEvent::Closed) | Err(RecvTimeoutError::Disconnected) => {
          return Err(TransportError::ProcessCrashed);
        },
        Ok(StreamEvent::ReadError(error)) => {
          debug!(error = %error, "analyzer stream unreadable during startup");
          return Err(TransportError::ProcessCrashed);
        },
        Err(RecvTimeoutError::Timeout) => return Err(TransportError::ReadyTimeout),
      }
    }
  }

  /// Writes one protocol line and blocks until the response delimiter
  /// appears, returning everything before it.
  ///
  /// No timeout is applied to an in-flight query: a hung analyzer blocks
  /// its session.
  pub fn query(&mut self, request: &str) -> Result<String, TransportError> {
    let stdin = self
      .stdin
      .as_mut()
      .ok_or(TransportError::ProcessCrashed)?;
    stdin
      .write_all(request.as_bytes())
      .and_then(|()| stdin.write_all(b"\r"))
      .and_then(|()| stdin.flush())
      .map_err(|err| {
        debug!(error = %err, "analyzer stdin write failed");
        TransportError::ProcessCrashed
      })?;

    loop {
      if let Some(idx) = find_marker(&self.buffer, RESPONSE_END) {
        let response = String::from_utf8_lossy(&self.buffer[..idx]).into_owned();
        self.buffer.drain(..idx + RESPONSE_END.len());
        return Ok(response);
      }
      match self.stream_rx.recv() {
        Ok(StreamEvent::Data(chunk)) => self.buffer.extend_from_slice(&chunk),
        Ok(StreamEvent::Closed) | Err(_) => return Err(TransportError::ProcessCrashed),
        Ok(StreamEvent::ReadError(error)) => {
          debug!(error = %error, "analyzer stream unreadable");
          return Err(TransportError::ProcessCrashed);
        },
      }
    }
  }

  pub fn poll_exit(&mut self) -> Result<Option<i32>, TransportError> {
    let status = self.child.try_wait().map_err(TransportError::Wait)?;
    Ok(status.and_then(|status| status.code()))
  }

  pub fn shutdown(&mut self) -> Result<Option<i32>, TransportError> {
    // Closing stdin ends the analyzer's REPL loop.
    drop(self.stdin.take());

    let exit_code = match self.child.try_wait().map_err(TransportError::Wait)? {
      Some(status) => status.code(),
      None => {
        if let Err(err) = self.child.kill()
          && err.kind() != std::io::ErrorKind::InvalidInput
        {
          return Err(TransportError::Kill(err));
        }
        self.child.wait().map_err(TransportError::Wait)?.code()
      },
    };

    join_thread(&mut self.reader_thread)?;
    join_thread(&mut self.stderr_thread)?;

    Ok(exit_code)
  }
}

impl Drop for AnalyzerTransport {
  fn drop(&mut self) {
    let _ = self.shutdown();
  }
}

fn find_marker(buffer: &[u8], marker: &[u8]) -> Option<usize> {
  if buffer.len() < marker.len() {
    return None;
  }
  buffer
    .windows(marker.len())
    .position(|window| window == marker)
}

fn spawn_reader_thread(stdout: ChildStdout, stream_tx: Sender<StreamEvent>) -> JoinHandle<()> {
  thread::Builder::new()
    .name("nim-bridge-stdout".into())
    .spawn(move || {
      let mut reader = BufReader::new(stdout);
      loop {
        let (event, consumed) = match reader.fill_buf() {
          Ok([]) => (StreamEvent::Closed, 0),
          Ok(bytes) => (StreamEvent::Data(bytes.to_vec()), bytes.len()),
          Err(err) => (StreamEvent::ReadError(err.to_string()), 0),
        };
        reader.consume(consumed);
        let done = matches!(event, StreamEvent::Closed | StreamEvent::ReadError(_));
        let _ = stream_tx.send(event);
        if done {
          break;
        }
      }
    })
    .expect("failed to spawn analyzer stdout thread")
}

fn spawn_stderr_thread(stderr: ChildStderr) -> JoinHandle<()> {
  thread::Builder::new()
    .name("nim-bridge-stderr".into())
    .spawn(move || {
      let mut reader = BufReader::new(stderr);
      let mut line = String::new();
      loop {
        line.clear();
        match reader.read_line(&mut line) {
          Ok(0) => break,
          Ok(_) => {
            let line = line.trim_end_matches(['\r', '\n']);
            if !line.is_empty() {
              debug!(line, "analyzer stderr");
            }
          },
          Err(err) => {
            debug!(error = %err, "analyzer stderr stream closed with error");
            break;
          },
        }
      }
    })
    .expect("failed to spawn analyzer stderr thread")
}

fn join_thread(handle: &mut Option<JoinHandle<()>>) -> Result<(), TransportError> {
  if let Some(handle) = handle.take() {
    handle.join().map_err(|_| TransportError::ThreadPanicked)?;
  }
  Ok(())
}

#[derive(Debug, Error)]
pub enum TransportError {
  #[error("failed to spawn analyzer process: {0}")]
  Spawn(std::io::Error),
  #[error("missing child {0} pipe")]
  MissingPipe(&'static str),
  #[error("analyzer did not print its ready prompt in time")]
  ReadyTimeout,
  #[error("analyzer process crashed")]
  ProcessCrashed,
  #[error("failed to kill analyzer process: {0}")]
  Kill(std::io::Error),
  #[error("failed to wait for analyzer process: {0}")]
  Wait(std::io::Error),
  #[error("transport thread panicked")]
  ThreadPanicked,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn marker_scan_finds_first_occurrence() {
    let buffer = b"abc\r\n\r\n> tail\r\n\r\n> ";
    assert_eq!(find_marker(buffer, RESPONSE_END), Some(3));
    assert_eq!(find_marker(b"ab", RESPONSE_END), None);
    assert_eq!(find_marker(b"", READY_PROMPT), None);
  }
}
