use std::{
  collections::BTreeMap,
  path::Path,
};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum HostError {
  #[error("editor failed to snapshot the buffer: {0}")]
  WriteBuffer(String),
  #[error("editor eval failed: {0}")]
  Eval(String),
  #[error("editor function call failed: {0}")]
  Call(String),
  #[error("failed to decode editor payload: {0}")]
  Decode(#[from] serde_json::Error),
}

/// Everything the bridge needs from the surrounding editor. The editor owns
/// buffers, scripting and rendering; the bridge only calls across this seam.
pub trait EditorHost: Send {
  /// Flush the in-memory buffer for `bufpath` to `dest` on disk. The
  /// analyzer reads file state from disk, not from the editor's buffer.
  fn write_buffer(&self, bufpath: &Path, dest: &Path) -> Result<(), HostError>;

  /// Evaluate an expression in the editor's scripting context.
  fn eval(&self, expr: &str) -> Result<Value, HostError>;

  /// Invoke a named editor function with arguments.
  fn call(&self, func: &str, args: Vec<Value>) -> Result<Value, HostError>;

  /// Print an error-level user message.
  fn warn(&self, message: &str);
}

#[derive(Debug, Deserialize)]
struct SignaturePayload {
  #[serde(default)]
  params: Vec<String>,
  #[serde(default)]
  reval:  Option<String>,
}

impl SignaturePayload {
  fn render(self) -> Option<String> {
    let mut detail = self.params.join(", ");
    if let Some(reval) = self.reval.filter(|reval| !reval.is_empty()) {
      detail.push_str(" => ");
      detail.push_str(&reval);
    }
    if detail.is_empty() { None } else { Some(detail) }
  }
}

/// Turns a raw signature into `"a, b => ret"` form via the editor's
/// signature parser. Anything unparseable renders as no detail at all;
/// completion still works without it.
pub fn parse_signature(host: &dyn EditorHost, raw: &str) -> Option<String> {
  if raw.is_empty() {
    return None;
  }
  let expr = format!("util#ParseSignature(\"{}\")", raw.replace('"', "\\\""));
  let value = match host.eval(&expr) {
    Ok(value) => value,
    Err(err) => {
      debug!(error = %err, "signature parse eval failed");
      return None;
    },
  };
  match serde_json::from_value::<SignaturePayload>(value) {
    Ok(payload) => payload.render(),
    Err(err) => {
      debug!(error = %err, "signature payload decode failed");
      None
    },
  }
}

/// Module name to display-kind mapping for import-statement completion,
/// supplied by the editor side. Ordered by module name.
pub fn global_imports(host: &dyn EditorHost) -> Result<BTreeMap<String, String>, HostError> {
  let value = host.eval("modules#FindGlobalImports()")?;
  Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
pub(crate) mod test_support {
  use std::{
    cell::RefCell,
    path::PathBuf,
  };

  use super::*;

  /// Scripted host: records every call, answers eval/call from canned
  /// responses in order.
  pub struct ScriptedHost {
    pub evals:    RefCell<Vec<String>>,
    pub calls:    RefCell<Vec<(String, Vec<Value>)>>,
    pub warnings: RefCell<Vec<String>>,
    pub writes:   RefCell<Vec<(PathBuf, PathBuf)>>,
    eval_results: RefCell<Vec<Result<Value, HostError>>>,
    call_results: RefCell<Vec<Result<Value, HostError>>>,
  }

  impl ScriptedHost {
    pub fn new() -> Self {
      Self {
        evals:        RefCell::new(Vec::new()),
        calls:        RefCell::new(Vec::new()),
        warnings:     RefCell::new(Vec::new()),
        writes:       RefCell::new(Vec::new()),
        eval_results: RefCell::new(Vec::new()),
        call_results: RefCell::new(Vec::new()),
      }
    }

    pub fn push_eval(&self, result: Result<Value, HostError>) {
      self.eval_results.borrow_mut().push(result);
    }

    pub fn push_call(&self, result: Result<Value, HostError>) {
      self.call_results.borrow_mut().push(result);
    }
  }

  impl EditorHost for ScriptedHost {
    fn write_buffer(&self, bufpath: &Path, dest: &Path) -> Result<(), HostError> {
      self
        .writes
        .borrow_mut()
        .push((bufpath.to_path_buf(), dest.to_path_buf()));
      std::fs::write(dest, b"").map_err(|err| HostError::WriteBuffer(err.to_string()))
    }

    fn eval(&self, expr: &str) -> Result<Value, HostError> {
      self.evals.borrow_mut().push(expr.to_string());
      if self.eval_results.borrow().is_empty() {
        return Err(HostError::Eval("no scripted eval result".into()));
      }
      self.eval_results.borrow_mut().remove(0)
    }

    fn call(&self, func: &str, args: Vec<Value>) -> Result<Value, HostError> {
      self
        .calls
        .borrow_mut()
        .push((func.to_string(), args.clone()));
      if self.call_results.borrow().is_empty() {
        return Err(HostError::Call("no scripted call result".into()));
      }
      self.call_results.borrow_mut().remove(0)
    }

    fn warn(&self, message: &str) {
      self.warnings.borrow_mut().push(message.to_string());
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use super::test_support::ScriptedHost;

  #[test]
  fn signature_with_params_and_return_value() {
    let host = ScriptedHost::new();
    host.push_eval(Ok(json!({
      "params": ["x: int", "y: int"],
      "reval": "int",
    })));
    let detail = parse_signature(&host, "proc (x: int, y: int): int");
    assert_eq!(detail.as_deref(), Some("x: int, y: int => int"));
  }

  #[test]
  fn signature_without_return_value() {
    let host = ScriptedHost::new();
    host.push_eval(Ok(json!({ "params": ["s: string"], "reval": "" })));
    assert_eq!(
      parse_signature(&host, "proc (s: string)").as_deref(),
      Some("s: string")
    );
  }

  #[test]
  fn empty_signature_skips_the_eval() {
    let host = ScriptedHost::new();
    assert_eq!(parse_signature(&host, ""), None);
    assert!(host.evals.borrow().is_empty());
  }

  #[test]
  fn unparseable_signature_renders_no_detail() {
    let host = ScriptedHost::new();
    host.push_eval(Ok(json!({ "params": [], "reval": "" })));
    assert_eq!(parse_signature(&host, "()"), None);
  }

  #[test]
  fn global_imports_decode_sorted() {
    let host = ScriptedHost::new();
    host.push_eval(Ok(json!({ "strutils": "G", "os": "G" })));
    let imports = global_imports(&host).expect("imports");
    let names: Vec<_> = imports.keys().cloned().collect();
    assert_eq!(names, vec!["os", "strutils"]);
  }
}
