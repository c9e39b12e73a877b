use std::path::Path;

use nim_wire::{
  highlight_query,
  parse_highlights,
  parse_suggestions,
  suggest_query,
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{
  debug,
  warn,
};

use crate::{
  coalesce::HighlightScheduler,
  completion::{
    self,
    Candidate,
  },
  config::BridgeConfig,
  editor::{
    self,
    EditorHost,
    HostError,
  },
  highlight::{
    self,
    HighlightState,
  },
  session::SessionRegistry,
  transport::TransportError,
};

#[derive(Debug, Error)]
pub enum BridgeError {
  #[error(transparent)]
  Transport(#[from] TransportError),
  #[error("failed to create buffer snapshot: {0}")]
  Snapshot(std::io::Error),
  #[error(transparent)]
  Host(#[from] HostError),
}

enum QueryOp {
  Suggest { line: u32, col: u32 },
  Highlight,
}

/// Ties the pieces together: one analyzer session per open file, completion
/// and highlight queries serialized against it, results pushed back across
/// the editor seam.
pub struct Bridge<H: EditorHost> {
  host:       H,
  config:     BridgeConfig,
  sessions:   SessionRegistry,
  highlights: HighlightState,
  scheduler:  HighlightScheduler,
  checked:    bool,
  disabled:   bool,
}

impl<H: EditorHost> Bridge<H> {
  pub fn new(host: H, config: BridgeConfig) -> Self {
    Self {
      host,
      config,
      sessions: SessionRegistry::new(),
      highlights: HighlightState::new(),
      scheduler: HighlightScheduler::new(),
      checked: false,
      disabled: false,
    }
  }

  pub fn session_count(&self) -> usize {
    self.sessions.len()
  }

  /// Checks once that the analyzer executable exists on the search path.
  /// A missing analyzer disables the whole integration: one warning, then
  /// every later call is a no-op.
  fn ensure_available(&mut self) -> bool {
    if !self.checked {
      self.checked = true;
      if which::which(self.config.executable()).is_err() {
        self.host.warn(&format!(
          "{} must be installed and on PATH for nim completion and highlighting to work",
          self.config.executable(),
        ));
        self.disabled = true;
      }
    }
    !self.disabled
  }

  /// Completion candidates at a 1-based line/column. Import statements are
  /// answered from the editor's module list; everything else goes through
  /// the analyzer. Failures surface one warning and yield no candidates.
  pub fn complete(&mut self, path: &Path, line: u32, col: u32, input: &str) -> Vec<Candidate> {
    if !self.ensure_available() {
      return Vec::new();
    }

    if completion::is_import_context(input) {
      return match editor::global_imports(&self.host) {
        Ok(imports) => completion::module_candidates(&imports),
        Err(err) => {
          debug!(error = %err, "global import discovery failed");
          Vec::new()
        },
      };
    }

    match self.query_with_retry(path, QueryOp::Suggest { line, col }) {
      Ok(raw) => completion::assemble(&self.host, &parse_suggestions(&raw)),
      Err(err) => {
        self.surface(path, &err);
        Vec::new()
      },
    }
  }

  /// Triggers a full-buffer highlight pass, coalescing triggers that land
  /// while one is already running.
  pub fn highlight(&mut self, path: &Path) {
    if !self.schedule_highlight(path) {
      return;
    }
    loop {
      self.run_highlight_pass(path);
      if !self.finish_highlight(path) {
        break;
      }
    }
  }

  /// Scheduler half of `highlight`, split out so a driving loop can fold
  /// triggers that arrive between passes into the pending flag.
  pub fn schedule_highlight(&mut self, path: &Path) -> bool {
    if !self.ensure_available() {
      return false;
    }
    self.scheduler.begin(path)
  }

  pub fn finish_highlight(&mut self, path: &Path) -> bool {
    self.scheduler.finish(path)
  }

  pub fn run_highlight_pass(&mut self, path: &Path) {
    let spans = match self.query_with_retry(path, QueryOp::Highlight) {
      Ok(raw) => parse_highlights(&raw),
      Err(err) => {
        self.surface(path, &err);
        return;
      },
    };
    match highlight::reconcile(&self.host, &mut self.highlights, path, &spans) {
      Ok(outcome) => {
        debug!(
          path = %path.display(),
          added = outcome.added,
          removed = outcome.removed,
          "highlights reconciled"
        );
      },
      Err(err) => {
        debug!(path = %path.display(), error = %err, "highlight application failed");
      },
    }
  }

  /// Drops the session and applied-highlight state for a closed file.
  pub fn close(&mut self, path: &Path) {
    if self.sessions.remove(path) {
      debug!(path = %path.display(), "analyzer session closed");
    }
    self.highlights.clear(path);
  }

  /// Runs one query, snapshotting the buffer first. On a crashed analyzer
  /// the dead session is dropped and the whole operation retried against a
  /// fresh process, exactly once.
  fn query_with_retry(&mut self, path: &Path, op: QueryOp) -> Result<String, BridgeError> {
    let mut respawned = false;
    loop {
      match self.run_query(path, &op) {
        Err(err @ BridgeError::Transport(TransportError::ProcessCrashed)) => {
          self.sessions.remove(path);
          if respawned {
            return Err(err);
          }
          respawned = true;
          debug!(path = %path.display(), "analyzer crashed mid-query, respawning once");
        },
        other => return other,
      }
    }
  }

  fn run_query(&mut self, path: &Path, op: &QueryOp) -> Result<String, BridgeError> {
    // The snapshot lives exactly as long as this query; the file is removed
    // on every exit path when the handle drops.
    let snapshot = NamedTempFile::new().map_err(BridgeError::Snapshot)?;
    self.host.write_buffer(path, snapshot.path())?;

    let request = match op {
      QueryOp::Suggest { line, col } => suggest_query(path, snapshot.path(), *line, *col),
      QueryOp::Highlight => highlight_query(path, snapshot.path()),
    };

    let session = self.sessions.ensure(&self.config, path)?;
    Ok(session.transport().query(&request)?)
  }

  fn surface(&self, path: &Path, err: &BridgeError) {
    warn!(path = %path.display(), error = %err, "analyzer query failed");
    self
      .host
      .warn(&format!("nim analyzer error for {}: {}", path.display(), err));
  }
}
