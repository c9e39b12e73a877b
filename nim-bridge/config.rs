#[derive(Debug, Clone)]
pub struct BridgeConfig {
  executable:  String,
  max_results: u32,
}

impl BridgeConfig {
  pub fn new(executable: impl Into<String>, max_results: u32) -> Self {
    Self {
      executable: executable.into(),
      max_results,
    }
  }

  /// Analyzer binary, resolved against the search path.
  pub fn executable(&self) -> &str {
    &self.executable
  }

  /// Maximum suggestion count the analyzer is asked for per query.
  pub fn max_results(&self) -> u32 {
    self.max_results
  }
}

impl Default for BridgeConfig {
  fn default() -> Self {
    Self::new("nimsuggest", 100)
  }
}
