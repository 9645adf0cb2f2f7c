use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use statelink_frame::{Field, Record};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct RecordOutput<'a> {
    sequence: u64,
    source: &'a str,
    timestamp: String,
    #[serde(flatten)]
    record: &'a Record,
}

/// Print one reassembled record. `sequence` is the reassembler's frame
/// count at the time, starting at 1.
pub fn print_record(record: &Record, sequence: u64, source: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = RecordOutput {
                sequence,
                source,
                timestamp: now_unix_seconds(),
                record,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut header = vec!["SEQ".to_string()];
            header.extend(Field::ALL.iter().map(|f| f.name().to_uppercase()));

            let mut row = vec![sequence.to_string()];
            row.extend(Field::ALL.iter().map(|f| format_value(record.get(*f))));

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header)
                .add_row(row);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let fields: Vec<String> = Field::ALL
                .iter()
                .map(|f| format!("{}={}", f.name(), format_value(record.get(*f))))
                .collect();
            println!("#{sequence} from {source}: {}", fields.join(" "));
        }
    }
}

fn format_value(value: f32) -> String {
    if value.is_finite() {
        format!("{value}")
    } else {
        format!("{value} (0x{:08X})", value.to_bits())
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_values_print_plainly() {
        assert_eq!(format_value(1.5), "1.5");
        assert_eq!(format_value(-0.25), "-0.25");
    }

    #[test]
    fn non_finite_values_show_bits() {
        assert_eq!(format_value(f32::INFINITY), "inf (0x7F800000)");
        assert!(format_value(f32::NAN).starts_with("NaN (0x"));
    }

    #[test]
    fn json_output_flattens_record() {
        let record = Record::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let out = RecordOutput {
            sequence: 7,
            source: "loopback",
            timestamp: "0".to_string(),
            record: &record,
        };
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["sequence"], 7);
        assert_eq!(value["curr_x"], 1.0);
        assert_eq!(value["goal_y"], 6.0);
    }
}
