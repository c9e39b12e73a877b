mod kinds;
mod records;

pub use kinds::SymbolKind;
pub use records::{
  HighlightSpan,
  SuggestionRecord,
  highlight_query,
  parse_highlights,
  parse_suggestions,
  suggest_query,
};
