//! Rendering helpers shared across CLI commands.

use colored::Colorize;
use keypoint_core::{ExtractionResult, StatRow};

/// Human-readable byte count, one decimal above a kibibyte.
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;

    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Pad labels so values line up.
pub fn format_rows(rows: &[StatRow]) -> Vec<String> {
    let width = rows.iter().map(|r| r.label.len()).max().unwrap_or(0) + 1;
    rows.iter()
        .map(|row| format!("{:<width$} {}", format!("{}:", row.label), row.value))
        .collect()
}

pub fn print_result(result: &ExtractionResult) {
    println!();
    println!("{}", result.message.green().bold());
    println!();
    println!("   {} {}", "Method:".dimmed(), result.method);
    println!("   {} {}", "Annotated image:".dimmed(), result.image_url);
    println!();
    println!("   {}", "Statistics".bold());
    for line in format_rows(&result.statistics.display_rows()) {
        println!("   {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(16 * 1024 * 1024), "16.0 MiB");
    }

    #[test]
    fn test_format_rows_aligns_values() {
        let rows = vec![
            StatRow {
                label: "Keypoints",
                value: "42".into(),
            },
            StatRow {
                label: "Avg size",
                value: "3.14".into(),
            },
        ];

        let lines = format_rows(&rows);

        assert_eq!(lines[0], "Keypoints: 42");
        assert_eq!(lines[1], "Avg size:  3.14");
    }
}
