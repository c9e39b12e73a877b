mod bridge;
mod coalesce;
mod command;
mod completion;
mod config;
mod editor;
mod event;
mod highlight;
mod runtime;
mod session;
mod transport;

pub use bridge::{
  Bridge,
  BridgeError,
};
pub use coalesce::HighlightScheduler;
pub use command::BridgeCommand;
pub use completion::Candidate;
pub use config::BridgeConfig;
pub use editor::{
  EditorHost,
  HostError,
};
pub use event::BridgeEvent;
pub use highlight::{
  HighlightState,
  ReconcileOutcome,
  reconcile,
};
pub use runtime::{
  BridgeRuntime,
  RuntimeError,
};
pub use session::{
  Session,
  SessionRegistry,
};
pub use transport::{
  AnalyzerTransport,
  TransportError,
};
