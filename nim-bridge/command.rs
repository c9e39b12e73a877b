use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum BridgeCommand {
  Complete {
    path:  PathBuf,
    line:  u32,
    col:   u32,
    input: String,
  },
  Highlight {
    path: PathBuf,
  },
  FileClosed {
    path: PathBuf,
  },
  Shutdown,
}
