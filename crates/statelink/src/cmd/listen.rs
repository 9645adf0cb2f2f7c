use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use statelink_frame::{Reassembler, ReassemblerConfig};
use statelink_transport::{SerialConfig, SerialLink};
use tracing::info;

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let tick = parse_duration(&args.tick)?;
    let config = SerialConfig {
        baud_rate: args.link.baud,
        ..SerialConfig::new(&args.link.device)
    };
    let mut link = SerialLink::open(&config).map_err(|err| transport_error("open failed", err))?;
    let source = args.link.device.display().to_string();

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut reassembler = Reassembler::with_config(ReassemblerConfig {
        stall_ticks: args.stall_ticks,
        ..ReassemblerConfig::default()
    });

    while running.load(Ordering::SeqCst) {
        let completed = reassembler
            .tick(&mut link)
            .map_err(|err| frame_error("receive failed", err))?;

        if let Some(record) = completed {
            // Frames overtaken within one tick leave gaps in the sequence.
            let sequence = reassembler.stats().frames_completed;
            print_record(&record, sequence, &source, format);

            if args.count.is_some_and(|count| sequence >= count) {
                break;
            }
        }

        thread::sleep(tick);
    }

    let stats = reassembler.stats();
    info!(
        frames = stats.frames_completed,
        resyncs = stats.resyncs,
        stall_resets = stats.stall_resets,
        bytes = stats.bytes_consumed,
        "listener stopped"
    );
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
