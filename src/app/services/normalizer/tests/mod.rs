//! Test utilities for the tabular normalizer

use std::path::PathBuf;
use tempfile::TempDir;

// Test modules
mod field_parser_tests;
mod loader_tests;

/// Write `content` to `name` inside a fresh temporary directory
pub fn write_csv(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (temp_dir, path)
}

/// Inverter extraction output in the provider's raw layout
pub fn create_inverter_csv() -> String {
    r#"timestamp,device,active_power,temperature
2025-03-09T10:00:00,INV-01,12.5,41.2
2025/03/09 10:05,INV-01,nan,
20250309101000,INV-02,13,NA
"#
    .to_string()
}

/// Daily yield extraction output
pub fn create_yield_csv() -> String {
    r#"date,device,daily_yield
20250309,INV-01,84.2
2025/03/09,INV-02,79.9
"#
    .to_string()
}
