use std::thread;

use statelink_frame::Transmitter;
use statelink_transport::{SerialConfig, SerialLink};
use tracing::{debug, info};

use crate::cmd::{parse_duration, resolve_record, SendArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let record = resolve_record(&args.record)?;
    let interval = parse_duration(&args.interval)?;

    let config = SerialConfig {
        baud_rate: args.link.baud,
        ..SerialConfig::new(&args.link.device)
    };
    let mut link = SerialLink::open(&config).map_err(|err| transport_error("open failed", err))?;

    let mut transmitter = Transmitter::new();
    for n in 0..args.repeat {
        if n > 0 {
            thread::sleep(interval);
        }
        transmitter
            .send(&mut link, &record)
            .map_err(|err| frame_error("send failed", err))?;
        debug!(frame = n + 1, "sent");
    }

    info!(
        frames = transmitter.frames_sent(),
        device = %args.link.device.display(),
        "transmission finished"
    );
    Ok(SUCCESS)
}
