use std::path::Path;

use tracing::debug;

use crate::kinds::SymbolKind;

const SUGGESTION_TAG: &str = "sug\t";
const HIGHLIGHT_TAG: &str = "highlight\t";

/// One completion candidate as reported by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRecord {
  pub kind:           SymbolKind,
  pub qualified_path: String,
  pub signature:      String,
  pub location:       String,
}

impl SuggestionRecord {
  /// Last segment of the dotted qualified path.
  pub fn word(&self) -> &str {
    self
      .qualified_path
      .rsplit('.')
      .next()
      .unwrap_or(&self.qualified_path)
  }

  /// First segment of the dotted qualified path: the origin module.
  pub fn origin(&self) -> &str {
    self
      .qualified_path
      .split('.')
      .next()
      .unwrap_or(&self.qualified_path)
  }
}

/// One highlight span as reported by the analyzer. Line, start column and
/// length are the raw 0-based wire values; this tuple is the span's identity
/// for reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighlightSpan {
  pub kind:   SymbolKind,
  pub line:   u32,
  pub start:  u32,
  pub length: u32,
}

/// Suggestion request at a 1-based editor line/column, analyzed from the
/// snapshot file. The wire column is 0-based.
pub fn suggest_query(bufpath: &Path, snapshot: &Path, line: u32, col: u32) -> String {
  format!(
    "sug {};{}:{}:{}",
    bufpath.display(),
    snapshot.display(),
    line,
    col.saturating_sub(1),
  )
}

/// Full-buffer highlight scan request.
pub fn highlight_query(bufpath: &Path, snapshot: &Path) -> String {
  format!("highlight {};{}:1:1", bufpath.display(), snapshot.display())
}

/// Extracts every well-formed suggestion line from a raw response. The
/// analyzer intermixes status chatter with data lines; anything not tagged
/// `sug` is discarded, as is any tagged line that does not parse.
pub fn parse_suggestions(raw: &str) -> Vec<SuggestionRecord> {
  raw
    .lines()
    .map(|line| line.strip_suffix('\r').unwrap_or(line))
    .filter(|line| line.starts_with(SUGGESTION_TAG))
    .filter_map(parse_suggestion_line)
    .collect()
}

/// Extracts every well-formed highlight line from a raw response.
pub fn parse_highlights(raw: &str) -> Vec<HighlightSpan> {
  raw
    .lines()
    .map(|line| line.strip_suffix('\r').unwrap_or(line))
    .filter(|line| line.starts_with(HIGHLIGHT_TAG))
    .filter_map(parse_highlight_line)
    .collect()
}

fn parse_suggestion_line(line: &str) -> Option<SuggestionRecord> {
  let fields: Vec<&str> = line.split('\t').collect();
  if fields.len() < 8 {
    debug!(line, "discarding truncated suggestion line");
    return None;
  }
  let Some(kind) = SymbolKind::from_code(fields[1]) else {
    debug!(code = fields[1], "discarding suggestion with unknown kind");
    return None;
  };
  Some(SuggestionRecord {
    kind,
    qualified_path: fields[2].to_string(),
    signature: fields[3].to_string(),
    location: fields[7].to_string(),
  })
}

fn parse_highlight_line(line: &str) -> Option<HighlightSpan> {
  let fields: Vec<&str> = line.split('\t').collect();
  if fields.len() < 5 {
    debug!(line, "discarding truncated highlight line");
    return None;
  }
  let Some(kind) = SymbolKind::from_code(fields[1]) else {
    debug!(code = fields[1], "discarding highlight with unknown kind");
    return None;
  };
  let line_nbr = fields[2].parse().ok()?;
  let start = fields[3].parse().ok()?;
  let length = fields[4].parse().ok()?;
  Some(HighlightSpan {
    kind,
    line: line_nbr,
    start,
    length,
  })
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use super::*;

  #[test]
  fn suggestion_line_fields() {
    let raw = "sug\tskProc\tmodA.foo\t()\t\t\t\tfile.nim:3\t";
    let records = parse_suggestions(raw);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, SymbolKind::Proc);
    assert_eq!(records[0].word(), "foo");
    assert_eq!(records[0].origin(), "modA");
    assert_eq!(records[0].signature, "()");
    assert_eq!(records[0].location, "file.nim:3");
  }

  #[test]
  fn truncated_suggestion_line_is_skipped() {
    let raw = "sug\tskProc\tmodA.foo\t()\r\nsug\tskVar\tmodA.bar\tint\t\t\t\tfile.nim:9\t";
    let records = parse_suggestions(raw);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].word(), "bar");
  }

  #[test]
  fn chatter_lines_are_excluded() {
    let raw = concat!(
      "usage: sug file.nim:1:1\r\n",
      "sug\tskField\tmodA.Point.x\tint\t\t\t\tfile.nim:2\t\r\n",
      "highlight\tskProc\t3\t0\t3\r\n",
      "> ",
    );
    let suggestions = parse_suggestions(raw);
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].word(), "x");

    let highlights = parse_highlights(raw);
    assert_eq!(highlights, vec![HighlightSpan {
      kind:   SymbolKind::Proc,
      line:   3,
      start:  0,
      length: 3,
    }]);
  }

  #[test]
  fn unknown_kind_code_is_skipped() {
    let raw = "sug\tskSignal\tmodA.foo\t()\t\t\t\tfile.nim:3\t";
    assert!(parse_suggestions(raw).is_empty());
  }

  #[test]
  fn highlight_with_non_numeric_field_is_skipped() {
    let raw = "highlight\tskType\tx\t0\t4";
    assert!(parse_highlights(raw).is_empty());
  }

  #[test]
  fn query_formats() {
    let bufpath = PathBuf::from("/src/app.nim");
    let snapshot = PathBuf::from("/tmp/snap123");
    assert_eq!(
      suggest_query(&bufpath, &snapshot, 7, 12),
      "sug /src/app.nim;/tmp/snap123:7:11"
    );
    assert_eq!(
      highlight_query(&bufpath, &snapshot),
      "highlight /src/app.nim;/tmp/snap123:1:1"
    );
  }
}
