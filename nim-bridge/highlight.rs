use std::{
  collections::{
    BTreeMap,
    HashMap,
    HashSet,
  },
  path::{
    Path,
    PathBuf,
  },
};

use nim_wire::{
  HighlightSpan,
  SymbolKind,
};
use serde_json::{
  Value,
  json,
};
use tracing::debug;

use crate::editor::{
  EditorHost,
  HostError,
};

const MATCH_FUNC: &str = "NimHighlighterMatch";
const UNMATCH_FUNC: &str = "NimHighlighterUnmatch";

/// Per-path map from a span's identity tuple to the opaque handle the
/// editor returned when the span was applied. Lives as long as the session.
#[derive(Default)]
pub struct HighlightState {
  applied: HashMap<PathBuf, HashMap<HighlightSpan, Value>>,
}

impl HighlightState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn clear(&mut self, path: &Path) {
    self.applied.remove(path);
  }

  pub fn applied_count(&self, path: &Path) -> usize {
    self.applied.get(path).map_or(0, HashMap::len)
  }

  fn for_path(&mut self, path: &Path) -> &mut HashMap<HighlightSpan, Value> {
    self.applied.entry(path.to_path_buf()).or_default()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
  pub added:   usize,
  pub removed: usize,
}

/// Editor-facing placement of a span: 1-based start column, and the length
/// of a multi-character procedure span stretched by one to cover the
/// analyzer's short span reports for procedure names.
fn placement(span: &HighlightSpan) -> [u32; 3] {
  let length = if span.kind == SymbolKind::Proc && span.length != 1 {
    span.length + 1
  } else {
    span.length
  };
  [span.line, span.start + 1, length]
}

/// Diffs `spans` against what is currently applied for `path` and applies
/// only the delta: stale spans are unapplied in one batch, new spans are
/// applied in one batch per highlight group. Reconciling the same span set
/// twice in a row is a no-op the second time.
pub fn reconcile(
  host: &dyn EditorHost,
  state: &mut HighlightState,
  path: &Path,
  spans: &[HighlightSpan],
) -> Result<ReconcileOutcome, HostError> {
  // Order by line / col / size to fix some overwrite cases.
  let mut ordered = spans.to_vec();
  ordered.sort_by_key(|span| (span.line, span.start, span.length));

  // The analyzer sometimes reports duplicates; the first one wins.
  let mut seen = HashSet::with_capacity(ordered.len());
  let mut candidates = Vec::with_capacity(ordered.len());
  for span in ordered {
    if seen.insert(span) {
      candidates.push(span);
    }
  }

  let applied = state.for_path(path);
  let mut outcome = ReconcileOutcome::default();

  let mut stale = Vec::new();
  applied.retain(|span, handle| {
    if seen.contains(span) {
      true
    } else {
      stale.push(handle.take());
      false
    }
  });
  if !stale.is_empty() {
    outcome.removed = stale.len();
    host.call(UNMATCH_FUNC, vec![Value::Array(stale)])?;
  }

  let mut additions: BTreeMap<&'static str, Vec<HighlightSpan>> = BTreeMap::new();
  for span in candidates {
    if applied.contains_key(&span) {
      continue;
    }
    let Some(group) = span.kind.highlight_group() else {
      continue;
    };
    additions.entry(group).or_default().push(span);
  }

  for (group, group_spans) in additions {
    let placements = group_spans
      .iter()
      .map(|span| json!(placement(span)))
      .collect();
    let handles = host.call(MATCH_FUNC, vec![json!(group), Value::Array(placements)])?;
    let Value::Array(handles) = handles else {
      debug!(group, "highlight apply returned a non-list result");
      continue;
    };
    for (span, handle) in group_spans.into_iter().zip(handles) {
      applied.insert(span, handle);
      outcome.added += 1;
    }
  }

  Ok(outcome)
}
