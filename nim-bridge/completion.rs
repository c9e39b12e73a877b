use std::collections::BTreeMap;

use nim_wire::SuggestionRecord;

use crate::editor::{
  self,
  EditorHost,
};

/// One editor-facing completion entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
  /// Inserted text: the last segment of the qualified path.
  pub word: String,
  /// Human kind label, with the formatted signature appended when one is
  /// available.
  pub kind: String,
  /// Origin module.
  pub menu: String,
  /// Location detail, typically `file:line`.
  pub info: String,
}

/// Builds ranked candidates from parsed suggestion records. The sort is
/// stable: kinds keep their priority order, unprioritized kinds land after
/// every prioritized one, and equal priorities preserve input order.
pub fn assemble(host: &dyn EditorHost, records: &[SuggestionRecord]) -> Vec<Candidate> {
  let mut ranked: Vec<(u16, Candidate)> = records
    .iter()
    .map(|record| {
      let kind = match editor::parse_signature(host, &record.signature) {
        Some(detail) => format!("{} : {}", record.kind.label(), detail),
        None => record.kind.label().to_string(),
      };
      let rank = record
        .kind
        .sort_priority()
        .map_or(u16::MAX, u16::from);
      (rank, Candidate {
        word: record.word().to_string(),
        kind,
        menu: record.origin().to_string(),
        info: record.location.clone(),
      })
    })
    .collect();
  ranked.sort_by_key(|(rank, _)| *rank);
  ranked.into_iter().map(|(_, candidate)| candidate).collect()
}

/// Import-statement completion: one candidate per known module, ordered by
/// name. Bypasses the analyzer entirely.
pub fn module_candidates(imports: &BTreeMap<String, String>) -> Vec<Candidate> {
  imports
    .iter()
    .map(|(name, kind)| Candidate {
      word: name.clone(),
      kind: kind.clone(),
      menu: "module".to_string(),
      info: "G".to_string(),
    })
    .collect()
}

pub fn is_import_context(input: &str) -> bool {
  input.starts_with("import ")
}

#[cfg(test)]
mod tests {
  use nim_wire::{
    SymbolKind,
    parse_suggestions,
  };

  use super::*;
  use crate::editor::test_support::ScriptedHost;

  fn record(kind: SymbolKind, path: &str) -> SuggestionRecord {
    SuggestionRecord {
      kind,
      qualified_path: path.to_string(),
      signature: String::new(),
      location: String::new(),
    }
  }

  #[test]
  fn candidates_are_ordered_by_kind_priority() {
    let host = ScriptedHost::new();
    let records = vec![
      record(SymbolKind::Module, "sys"),
      record(SymbolKind::Proc, "modA.foo"),
      record(SymbolKind::Template, "modA.tmpl"),
      record(SymbolKind::Field, "modA.Point.x"),
      record(SymbolKind::Iterator, "modA.items"),
    ];
    let candidates = assemble(&host, &records);
    let words: Vec<_> = candidates.iter().map(|c| c.word.as_str()).collect();
    // Field(0) < Function(1) < Module(10) < unprioritized, input order kept.
    assert_eq!(words, vec!["x", "foo", "sys", "tmpl", "items"]);
  }

  #[test]
  fn equal_priorities_preserve_input_order() {
    let host = ScriptedHost::new();
    let records = vec![
      record(SymbolKind::Proc, "modA.second"),
      record(SymbolKind::Proc, "modA.first"),
    ];
    let candidates = assemble(&host, &records);
    assert_eq!(candidates[0].word, "second");
    assert_eq!(candidates[1].word, "first");
  }

  #[test]
  fn parsed_proc_becomes_function_candidate() {
    let host = ScriptedHost::new();
    host.push_eval(Ok(serde_json::json!({ "params": [], "reval": "" })));
    let records = parse_suggestions("sug\tskProc\tmodA.foo\t()\t\t\t\tfile.nim:3\t");
    let candidates = assemble(&host, &records);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].word, "foo");
    assert_eq!(candidates[0].menu, "modA");
    assert_eq!(candidates[0].info, "file.nim:3");
    assert!(candidates[0].kind.starts_with("Function"));
  }

  #[test]
  fn signature_detail_is_appended_to_the_kind_label() {
    let host = ScriptedHost::new();
    host.push_eval(Ok(serde_json::json!({
      "params": ["x: int"],
      "reval": "string",
    })));
    let records = vec![SuggestionRecord {
      kind:           SymbolKind::Proc,
      qualified_path: "modA.render".to_string(),
      signature:      "proc (x: int): string".to_string(),
      location:       "file.nim:12".to_string(),
    }];
    let candidates = assemble(&host, &records);
    assert_eq!(candidates[0].kind, "Function : x: int => string");
  }

  #[test]
  fn module_candidates_sorted_by_name() {
    let imports = BTreeMap::from([
      ("strutils".to_string(), "G".to_string()),
      ("os".to_string(), "G".to_string()),
    ]);
    let candidates = module_candidates(&imports);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].word, "os");
    assert_eq!(candidates[1].word, "strutils");
    assert_eq!(candidates[0].menu, "module");
    assert_eq!(candidates[0].info, "G");
  }

  #[test]
  fn import_context_detection() {
    assert!(is_import_context("import str"));
    assert!(!is_import_context("  import str"));
    assert!(!is_import_context("let x = 1"));
  }
}
