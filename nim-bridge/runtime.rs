use std::{
  collections::VecDeque,
  path::Path,
  sync::mpsc::{
    Receiver,
    Sender,
    TryRecvError,
    channel,
  },
  thread::{
    self,
    JoinHandle,
  },
};

use thiserror::Error;
use tracing::debug;

use crate::{
  bridge::Bridge,
  command::BridgeCommand,
  config::BridgeConfig,
  editor::EditorHost,
  event::BridgeEvent,
};

/// Owns the worker thread that drives a `Bridge`. All analyzer traffic goes
/// through this one thread, which is what serializes queries per session.
pub struct BridgeRuntime {
  command_tx: Option<Sender<BridgeCommand>>,
  event_rx:   Option<Receiver<BridgeEvent>>,
  worker:     Option<JoinHandle<()>>,
}

impl BridgeRuntime {
  pub fn new() -> Self {
    Self {
      command_tx: None,
      event_rx: None,
      worker: None,
    }
  }

  pub fn is_running(&self) -> bool {
    self.worker.is_some()
  }

  pub fn start<H>(&mut self, host: H, config: BridgeConfig) -> Result<(), RuntimeError>
  where
    H: EditorHost + 'static,
  {
    if self.is_running() {
      return Err(RuntimeError::AlreadyRunning);
    }

    let (command_tx, command_rx) = channel();
    let (event_tx, event_rx) = channel();
    let bridge = Bridge::new(host, config);

    let worker = thread::Builder::new()
      .name("nim-bridge-worker".into())
      .spawn(move || run_worker(bridge, command_rx, event_tx))
      .map_err(|_| RuntimeError::FailedToSpawnWorker)?;

    self.command_tx = Some(command_tx);
    self.event_rx = Some(event_rx);
    self.worker = Some(worker);

    Ok(())
  }

  pub fn send(&self, command: BridgeCommand) -> Result<(), RuntimeError> {
    let Some(tx) = &self.command_tx else {
      return Err(RuntimeError::NotRunning);
    };

    tx.send(command)
      .map_err(|_| RuntimeError::CommandChannelClosed)
  }

  pub fn try_recv_event(&self) -> Option<BridgeEvent> {
    let rx = self.event_rx.as_ref()?;
    match rx.try_recv() {
      Ok(event) => Some(event),
      Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
    }
  }

  pub fn shutdown(&mut self) -> Result<(), RuntimeError> {
    if !self.is_running() {
      return Ok(());
    }

    if let Some(tx) = self.command_tx.take() {
      let _ = tx.send(BridgeCommand::Shutdown);
    }

    if let Some(worker) = self.worker.take() {
      worker.join().map_err(|_| RuntimeError::WorkerPanicked)?;
    }

    self.event_rx = None;
    Ok(())
  }
}

impl Default for BridgeRuntime {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for BridgeRuntime {
  fn drop(&mut self) {
    let _ = self.shutdown();
  }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
  #[error("bridge runtime is already running")]
  AlreadyRunning,
  #[error("bridge runtime is not running")]
  NotRunning,
  #[error("failed to spawn bridge worker thread")]
  FailedToSpawnWorker,
  #[error("bridge runtime command channel is closed")]
  CommandChannelClosed,
  #[error("bridge runtime worker thread panicked")]
  WorkerPanicked,
}

fn run_worker<H: EditorHost>(
  mut bridge: Bridge<H>,
  command_rx: Receiver<BridgeCommand>,
  event_tx: Sender<BridgeEvent>,
) {
  debug!("bridge worker started");
  let _ = event_tx.send(BridgeEvent::Started);

  let mut deferred = VecDeque::new();
  loop {
    let command = match deferred.pop_front() {
      Some(command) => command,
      None => match command_rx.recv() {
        Ok(command) => command,
        Err(_) => break,
      },
    };

    match command {
      BridgeCommand::Complete {
        path,
        line,
        col,
        input,
      } => {
        let candidates = bridge.complete(&path, line, col, &input);
        let _ = event_tx.send(BridgeEvent::Completions { path, candidates });
      },
      BridgeCommand::Highlight { path } => {
        if bridge.schedule_highlight(&path) {
          loop {
            bridge.run_highlight_pass(&path);
            fold_queued_triggers(&command_rx, &mut bridge, &path, &mut deferred);
            if !bridge.finish_highlight(&path) {
              break;
            }
          }
        }
      },
      BridgeCommand::FileClosed { path } => bridge.close(&path),
      BridgeCommand::Shutdown => break,
    }
  }

  debug!("bridge worker stopped");
  let _ = event_tx.send(BridgeEvent::Stopped);
}

/// Highlight triggers that queued up during a pass fold into the
/// scheduler's pending flag instead of becoming one run each; everything
/// else keeps its arrival order via the deferred queue.
fn fold_queued_triggers<H: EditorHost>(
  command_rx: &Receiver<BridgeCommand>,
  bridge: &mut Bridge<H>,
  running: &Path,
  deferred: &mut VecDeque<BridgeCommand>,
) {
  for command in command_rx.try_iter() {
    match command {
      BridgeCommand::Highlight { path } if path == running => {
        bridge.schedule_highlight(&path);
      },
      other => deferred.push_back(other),
    }
  }
}
