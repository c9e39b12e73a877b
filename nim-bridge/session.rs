use std::{
  collections::{
    HashMap,
    hash_map::Entry,
  },
  path::{
    Path,
    PathBuf,
  },
};

use tracing::debug;

use crate::{
  config::BridgeConfig,
  transport::{
    AnalyzerTransport,
    TransportError,
  },
};

/// The pairing of a file path with its live analyzer process.
pub struct Session {
  transport: AnalyzerTransport,
}

impl Session {
  pub fn transport(&mut self) -> &mut AnalyzerTransport {
    &mut self.transport
  }

  pub fn is_alive(&mut self) -> bool {
    matches!(self.transport.poll_exit(), Ok(None))
  }
}

/// Owns every analyzer process, keyed by absolute file path. Exactly one
/// live session exists per path; no other component may terminate or
/// replace a handle.
#[derive(Default)]
pub struct SessionRegistry {
  sessions: HashMap<PathBuf, Session>,
}

impl SessionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the live session for `path`, spawning one on first access.
  /// A stored session whose process has since died is replaced.
  pub fn ensure(
    &mut self,
    config: &BridgeConfig,
    path: &Path,
  ) -> Result<&mut Session, TransportError> {
    if self
      .sessions
      .get_mut(path)
      .is_some_and(|session| !session.is_alive())
    {
      debug!(path = %path.display(), "stored analyzer session is dead, respawning");
      self.sessions.remove(path);
    }

    match self.sessions.entry(path.to_path_buf()) {
      Entry::Occupied(entry) => Ok(entry.into_mut()),
      Entry::Vacant(entry) => {
        let transport = AnalyzerTransport::spawn(config, path)?;
        debug!(path = %path.display(), "analyzer session started");
        Ok(entry.insert(Session { transport }))
      },
    }
  }

  /// Drops the session for `path`, terminating its process. Returns whether
  /// one existed.
  pub fn remove(&mut self, path: &Path) -> bool {
    self.sessions.remove(path).is_some()
  }

  pub fn len(&self) -> usize {
    self.sessions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sessions.is_empty()
  }
}
