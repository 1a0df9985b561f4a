//! Output writers for batch summaries

use crate::report::Summary;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Write a summary as pretty JSON, creating parent directories as needed
pub fn write_json(summary: &Summary, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(Error::Io)?;
    }

    let json = serde_json::to_string_pretty(summary)?;
    fs::write(output_path, json).map_err(Error::Io)?;

    tracing::debug!(path = %output_path.display(), "wrote summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::report;
    use crate::stats::{RunStatistics, TimingRecord};
    use serde_json::Value;
    use tempfile::TempDir;

    fn sample_stats() -> RunStatistics {
        RunStatistics {
            total: 2,
            success: 1,
            skipped: 1,
            timings: vec![TimingRecord {
                template: "cisco_ios_show_clock.textfsm".to_string(),
                command: "show_clock".to_string(),
                elapsed_ms: 0.25,
                record_count: 1,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_write_json() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("summary.json");

        write_json(&report(&sample_stats()), &output_path).unwrap();

        let parsed: Value = serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(parsed["total"], 2);
        assert_eq!(parsed["success_rate"], 50.0);
        assert_eq!(parsed["banner"], "needs_attention");
        assert_eq!(parsed["fastest"][0]["command"], "show_clock");
        assert!(parsed["generated_at"].is_string());
    }

    #[test]
    fn test_write_json_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("reports/nested/summary.json");

        write_json(&report(&RunStatistics::new()), &output_path).unwrap();
        assert!(output_path.exists());
    }
}
