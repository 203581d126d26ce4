//! Output formatting helpers for human-readable and JSON output.

use relaydeck::AppSettings;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Calculate column widths (max of header and all row values)
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", format_row(headers.to_vec()));
    for row in rows {
        println!(
            "{}",
            format_row(row.iter().take(col_count).map(String::as_str).collect())
        );
    }
}

/// One table row summarizing a settings value.
pub fn settings_row(settings: &AppSettings) -> Vec<String> {
    vec![
        format!("{:?}", settings.color_mode).to_lowercase(),
        format!("{:?}", settings.max_page_width).to_lowercase(),
        settings.muted_word_list().len().to_string(),
        settings.zap_amounts.len().to_string(),
    ]
}

pub const SETTINGS_HEADERS: [&str; 4] = ["COLOR MODE", "PAGE WIDTH", "MUTED WORDS", "ZAP PRESETS"];
