use statelink_frame::{Reassembler, Record, Transmitter};
use statelink_transport::{ByteSink, MemoryLink};
use tracing::{info, warn};

use crate::cmd::{resolve_record, LoopbackArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub fn run(args: LoopbackArgs, format: OutputFormat) -> CliResult<i32> {
    let record = resolve_record(&args.record)?;

    let mut wire = noise(args.noise);
    Transmitter::new()
        .send(&mut wire, &record)
        .map_err(|err| frame_error("encode failed", err))?;

    let ticks = split_ticks(&wire, args.chunks.as_deref().unwrap_or(&[]));
    let received = replay(&ticks)?;

    match received {
        Some(got) if got.bit_eq(&record) => {
            print_record(&got, 1, "loopback", format);
            Ok(SUCCESS)
        }
        Some(got) => {
            print_record(&got, 1, "loopback", format);
            Err(CliError::new(
                DATA_INVALID,
                format!("record did not round-trip: sent {record:?}"),
            ))
        }
        None => Err(CliError::new(
            DATA_INVALID,
            format!("no record after {} ticks", ticks.len()),
        )),
    }
}

/// Push each slice through a fresh link, one tick per slice.
fn replay(ticks: &[&[u8]]) -> CliResult<Option<Record>> {
    let (mut tx, mut rx) = MemoryLink::pair();
    let mut reassembler = Reassembler::new();

    for (i, bytes) in ticks.iter().enumerate() {
        tx.write_bytes(bytes)
            .map_err(|err| transport_error("loopback write failed", err))?;
        let completed = reassembler
            .tick(&mut rx)
            .map_err(|err| frame_error("loopback read failed", err))?;
        info!(
            tick = i + 1,
            bytes = bytes.len(),
            ready = reassembler.is_ready(),
            completed = completed.is_some(),
            "tick"
        );
    }

    let stats = reassembler.stats();
    if stats.resyncs > 0 {
        warn!(resyncs = stats.resyncs, "reassembler resynchronized");
    }
    Ok(reassembler.last_record())
}

/// Split `wire` into the requested tick sizes; whatever is left over goes in
/// one last tick. Sizes past the end are clipped and zero sizes are skipped.
fn split_ticks<'a>(wire: &'a [u8], sizes: &[usize]) -> Vec<&'a [u8]> {
    let mut ticks = Vec::new();
    let mut rest = wire;
    for &size in sizes {
        if rest.is_empty() {
            break;
        }
        if size == 0 {
            continue;
        }
        let (head, tail) = rest.split_at(size.min(rest.len()));
        ticks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        ticks.push(rest);
    }
    ticks
}

/// An ascending byte ramp; consecutive values never spell the marker.
fn noise(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
