//! Transmitter and receiver on two threads joined by an in-memory link.
//!
//! Run with:
//!   cargo run --example loopback-link
//!
//! The receiver polls every 5 ms the way a control loop would, printing each
//! record it rebuilds. The link is split into odd-sized writes so frames
//! straddle poll boundaries.

use std::thread;
use std::time::Duration;

use statelink::frame::{FrameError, Reassembler, Record, Transmitter};
use statelink::transport::{ByteSink, MemoryLink};

const FRAMES: usize = 5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (mut tx, mut rx) = MemoryLink::pair();

    let sender = thread::spawn(move || -> Result<MemoryLink, FrameError> {
        let mut transmitter = Transmitter::new();
        for i in 0..FRAMES {
            let step = i as f32;
            let record = Record::from_array([
                step,
                step * 0.5,
                step + 1.0,
                step * 0.5 + 0.5,
                10.0,
                -10.0,
            ]);
            let mut wire: Vec<u8> = Vec::new();
            transmitter.send(&mut wire, &record)?;
            for piece in wire.chunks(5) {
                tx.write_bytes(piece)?;
                thread::sleep(Duration::from_millis(2));
            }
        }
        // Hand the link back so it stays open until the receiver is done.
        Ok(tx)
    });

    let mut reassembler = Reassembler::new();
    while reassembler.stats().frames_completed < FRAMES as u64 {
        // Only the newest record of a tick is returned; the counter shows gaps.
        if let Some(record) = reassembler.tick(&mut rx)? {
            println!("#{}: {record:?}", reassembler.stats().frames_completed);
        }
        thread::sleep(Duration::from_millis(5));
    }

    let _tx = sender.join().map_err(|_| "sender panicked")??;
    eprintln!("stats: {:?}", reassembler.stats());
    Ok(())
}
