use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use statelink_frame::{Record, FIELD_COUNT};
use statelink_transport::DEFAULT_BAUD_RATE;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod loopback;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transmit a state record over a serial link.
    Send(SendArgs),
    /// Poll a serial link and print every reassembled record.
    Listen(ListenArgs),
    /// Round-trip a record through an in-memory link.
    Loopback(LoopbackArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args),
        Command::Listen(args) => listen::run(args, format),
        Command::Loopback(args) => loopback::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial device of the paired radio module.
    #[arg(env = "STATELINK_DEVICE")]
    pub device: PathBuf,
    /// Line rate.
    #[arg(long, env = "STATELINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Record as JSON, e.g. '{"curr_x":1.1,"curr_y":2.2,...}'.
    #[arg(long, conflicts_with = "values")]
    pub json: Option<String>,
    /// Record as six comma-separated values in wire order.
    #[arg(long, value_delimiter = ',', num_args = 1, allow_hyphen_values = true)]
    pub values: Option<Vec<f32>>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub record: RecordArgs,
    /// Number of frames to send.
    #[arg(long, default_value_t = 1)]
    pub repeat: u64,
    /// Pause between frames (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Poll period (e.g. 10ms).
    #[arg(long, default_value = "10ms")]
    pub tick: String,
    /// Exit after receiving N records.
    #[arg(long)]
    pub count: Option<u64>,
    /// Drop a half-received frame after N consecutive empty ticks.
    #[arg(long)]
    pub stall_ticks: Option<u32>,
}

#[derive(Args, Debug)]
pub struct LoopbackArgs {
    #[command(flatten)]
    pub record: RecordArgs,
    /// Bytes delivered per tick; leftover bytes arrive in one final tick.
    #[arg(long, value_delimiter = ',')]
    pub chunks: Option<Vec<usize>>,
    /// Non-marker bytes sent ahead of the frame.
    #[arg(long, default_value_t = 0)]
    pub noise: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Values used when neither `--json` nor `--values` is given.
pub const DEMO_RECORD: [f32; FIELD_COUNT] = [1.1, 2.2, 3.3, 4.4, 5.5, 6.6];

pub fn resolve_record(args: &RecordArgs) -> CliResult<Record> {
    if let Some(json) = &args.json {
        return serde_json::from_str::<Record>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not a valid record: {err}")));
    }
    if let Some(values) = &args.values {
        let array: [f32; FIELD_COUNT] = values.as_slice().try_into().map_err(|_| {
            CliError::new(
                USAGE,
                format!(
                    "--values needs {FIELD_COUNT} numbers, got {}",
                    values.len()
                ),
            )
        })?;
        return Ok(Record::from_array(array));
    }
    Ok(Record::from_array(DEMO_RECORD))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
