/// Categorical tag the analyzer attaches to every suggestion and highlight
/// span, decoded from its `sk*` wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
  Proc,
  Template,
  Type,
  Macro,
  Method,
  Field,
  Alias,
  Conditional,
  Const,
  Converter,
  DynLib,
  EnumField,
  ForVar,
  GenericParam,
  GlobalVar,
  GlobalLet,
  Iterator,
  Label,
  Let,
  Module,
  Package,
  Param,
  Result,
  Stub,
  Temp,
  Unknown,
  Var,
}

impl SymbolKind {
  pub const ALL: [SymbolKind; 27] = [
    Self::Proc,
    Self::Template,
    Self::Type,
    Self::Macro,
    Self::Method,
    Self::Field,
    Self::Alias,
    Self::Conditional,
    Self::Const,
    Self::Converter,
    Self::DynLib,
    Self::EnumField,
    Self::ForVar,
    Self::GenericParam,
    Self::GlobalVar,
    Self::GlobalLet,
    Self::Iterator,
    Self::Label,
    Self::Let,
    Self::Module,
    Self::Package,
    Self::Param,
    Self::Result,
    Self::Stub,
    Self::Temp,
    Self::Unknown,
    Self::Var,
  ];

  pub fn from_code(code: &str) -> Option<Self> {
    let kind = match code {
      "skProc" => Self::Proc,
      "skTemplate" => Self::Template,
      "skType" => Self::Type,
      "skMacro" => Self::Macro,
      "skMethod" => Self::Method,
      "skField" => Self::Field,
      "skAlias" => Self::Alias,
      "skConditional" => Self::Conditional,
      "skConst" => Self::Const,
      "skConverter" => Self::Converter,
      "skDynLib" => Self::DynLib,
      "skEnumField" => Self::EnumField,
      "skForVar" => Self::ForVar,
      "skGenericParam" => Self::GenericParam,
      "skGlobalVar" => Self::GlobalVar,
      "skGlobalLet" => Self::GlobalLet,
      "skIterator" => Self::Iterator,
      "skLabel" => Self::Label,
      "skLet" => Self::Let,
      "skModule" => Self::Module,
      "skPackage" => Self::Package,
      "skParam" => Self::Param,
      "skResult" => Self::Result,
      "skStub" => Self::Stub,
      "skTemp" => Self::Temp,
      "skUnknown" => Self::Unknown,
      "skVar" => Self::Var,
      _ => return None,
    };
    Some(kind)
  }

  pub fn code(self) -> &'static str {
    match self {
      Self::Proc => "skProc",
      Self::Template => "skTemplate",
      Self::Type => "skType",
      Self::Macro => "skMacro",
      Self::Method => "skMethod",
      Self::Field => "skField",
      Self::Alias => "skAlias",
      Self::Conditional => "skConditional",
      Self::Const => "skConst",
      Self::Converter => "skConverter",
      Self::DynLib => "skDynLib",
      Self::EnumField => "skEnumField",
      Self::ForVar => "skForVar",
      Self::GenericParam => "skGenericParam",
      Self::GlobalVar => "skGlobalVar",
      Self::GlobalLet => "skGlobalLet",
      Self::Iterator => "skIterator",
      Self::Label => "skLabel",
      Self::Let => "skLet",
      Self::Module => "skModule",
      Self::Package => "skPackage",
      Self::Param => "skParam",
      Self::Result => "skResult",
      Self::Stub => "skStub",
      Self::Temp => "skTemp",
      Self::Unknown => "skUnknown",
      Self::Var => "skVar",
    }
  }

  /// Short glyph shown in narrow completion menus.
  pub fn glyph(self) -> &'static str {
    match self {
      Self::Proc => "p",
      Self::Template => "t",
      Self::Type => "T",
      Self::Macro => "M",
      Self::Method => "m",
      Self::Field => "field",
      Self::Alias => "a",
      Self::Conditional => "c",
      Self::Const => "C",
      Self::Converter => "c",
      Self::DynLib => "d",
      Self::EnumField => "e",
      Self::ForVar => "l",
      Self::GenericParam => "g",
      Self::GlobalVar => "g",
      Self::GlobalLet => "g",
      Self::Iterator => "i",
      Self::Label => "l",
      Self::Let => "r",
      Self::Module => "m",
      Self::Package => "p",
      Self::Param => "p",
      Self::Result => "r",
      Self::Stub => "s",
      Self::Temp => "t",
      Self::Unknown => "u",
      Self::Var => "v",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Proc => "Function",
      Self::Template => "Template",
      Self::Type => "Type",
      Self::Macro => "Macro",
      Self::Method => "Method",
      Self::Field => "Field",
      Self::Alias => "Alias",
      Self::Conditional => "Conditional",
      Self::Const => "Constant",
      Self::Converter => "Converter",
      Self::DynLib => "Dynamic library",
      Self::EnumField => "Enum field",
      Self::ForVar => "Loop variable",
      Self::GenericParam => "Generic parameter",
      Self::GlobalVar => "Global variable",
      Self::GlobalLet => "Global constant",
      Self::Iterator => "Iterator",
      Self::Label => "Label",
      Self::Let => "Runtime constant",
      Self::Module => "Module",
      Self::Package => "Package",
      Self::Param => "Parameter",
      Self::Result => "Result",
      Self::Stub => "Stub",
      Self::Temp => "Temporary",
      Self::Unknown => "Unknown",
      Self::Var => "Variable",
    }
  }

  /// Editor highlight group a span of this kind maps to, if any.
  pub fn highlight_group(self) -> Option<&'static str> {
    let group = match self {
      Self::Proc => "Function",
      Self::Template => "PreProc",
      Self::Type => "Type",
      Self::Macro => "Macro",
      Self::Method => "Function",
      Self::Field => "Identifier",
      Self::Alias => "Type",
      Self::Conditional => "Conditional",
      Self::Const => "Constant",
      Self::Converter => "Function",
      Self::DynLib => "Include",
      Self::EnumField => "Identifier",
      Self::ForVar => "Special",
      Self::GenericParam => "Typedef",
      Self::GlobalVar => "Constant",
      Self::GlobalLet => "Constant",
      Self::Iterator => "Keyword",
      Self::Label => "Identifier",
      Self::Let => "Constant",
      Self::Module => "Include",
      Self::Package => "Define",
      Self::Param => "Identifier",
      Self::Result => "Keyword",
      Self::Stub => "PreCondit",
      Self::Temp => "Identifier",
      Self::Unknown => "Error",
      Self::Var => "Constant",
    };
    Some(group)
  }

  /// Completion ordering. Kinds without an assigned priority sort after
  /// every kind that has one.
  pub fn sort_priority(self) -> Option<u8> {
    let priority = match self {
      Self::Field => 0,
      Self::Proc => 1,
      Self::Method => 2,
      Self::Var => 3,
      Self::Param => 4,
      Self::ForVar => 5,
      Self::Let => 6,
      Self::GlobalVar => 7,
      Self::Const => 8,
      Self::GlobalLet => 9,
      Self::Module => 10,
      Self::Package => 11,
      _ => return None,
    };
    Some(priority)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_roundtrip() {
    for kind in SymbolKind::ALL {
      assert_eq!(SymbolKind::from_code(kind.code()), Some(kind));
    }
  }

  #[test]
  fn unknown_code_is_rejected() {
    assert_eq!(SymbolKind::from_code("skSignal"), None);
    assert_eq!(SymbolKind::from_code(""), None);
  }

  #[test]
  fn labels_and_glyphs() {
    assert_eq!(SymbolKind::Proc.label(), "Function");
    assert_eq!(SymbolKind::Let.label(), "Runtime constant");
    assert_eq!(SymbolKind::Field.glyph(), "field");
    assert_eq!(SymbolKind::Type.glyph(), "T");
  }

  #[test]
  fn assigned_priorities_cover_the_expected_kinds() {
    assert_eq!(SymbolKind::Field.sort_priority(), Some(0));
    assert_eq!(SymbolKind::Package.sort_priority(), Some(11));
    assert_eq!(SymbolKind::Template.sort_priority(), None);
    assert_eq!(SymbolKind::Unknown.sort_priority(), None);
  }
}
