use std::path::PathBuf;

use crate::completion::Candidate;

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
  Started,
  Completions {
    path:       PathBuf,
    candidates: Vec<Candidate>,
  },
  Stopped,
}
