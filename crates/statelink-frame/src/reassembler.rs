use statelink_transport::ByteSource;
use tracing::{debug, trace};

use crate::codec::{decode_field_array, FIELD_SIZE, MARKER, MARKER_SIZE};
use crate::error::Result;
use crate::record::{Field, Record};

const DEFAULT_READ_CHUNK_SIZE: usize = 64;
const DEFAULT_MAX_BYTES_PER_TICK: usize = 4 * 1024;

/// Configuration for a [`Reassembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassemblerConfig {
    /// Force the machine back to idle after this many consecutive ticks that
    /// read nothing while a frame is half collected. `None` parks forever.
    pub stall_ticks: Option<u32>,
    /// Size of each `read_available` call. Default: 64 bytes.
    pub read_chunk_size: usize,
    /// Upper bound on bytes consumed by one tick. Default: 4 KiB.
    pub max_bytes_per_tick: usize,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self {
            stall_ticks: None,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_bytes_per_tick: DEFAULT_MAX_BYTES_PER_TICK,
        }
    }
}

/// Observable position of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblerState {
    /// Waiting for a marker.
    Idle,
    /// Synchronized; `buffered` bytes (0..=3) of `field` collected so far.
    CollectingField { field: Field, buffered: usize },
}

/// Counters kept across the lifetime of a [`Reassembler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReassemblerStats {
    pub bytes_consumed: u64,
    pub frames_completed: u64,
    /// Markers seen while a frame was half collected.
    pub resyncs: u64,
    /// Half frames dropped by the stall timeout.
    pub stall_resets: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    bytes: [u8; FIELD_SIZE],
    len: usize,
}

impl Accumulator {
    fn push(&mut self, byte: u8) -> Option<[u8; FIELD_SIZE]> {
        self.bytes[self.len] = byte;
        self.len += 1;
        if self.len == FIELD_SIZE {
            self.len = 0;
            Some(self.bytes)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Collecting {
        field: Field,
        accumulator: Accumulator,
    },
}

#[derive(Debug, Clone, Copy)]
struct MarkerWindow {
    bytes: [u8; MARKER_SIZE],
    len: usize,
}

impl MarkerWindow {
    fn new() -> Self {
        Self {
            bytes: [0; MARKER_SIZE],
            len: 0,
        }
    }

    /// Slide `byte` in; true when the last four bytes are the marker.
    fn observe(&mut self, byte: u8) -> bool {
        self.bytes.copy_within(1.., 0);
        self.bytes[MARKER_SIZE - 1] = byte;
        self.len = (self.len + 1).min(MARKER_SIZE);
        if self.len == MARKER_SIZE && self.bytes == MARKER {
            self.len = 0;
            true
        } else {
            false
        }
    }
}

/// Everything the state machine mutates while consuming bytes.
#[derive(Debug, Clone)]
struct ReassemblyState {
    phase: Phase,
    window: MarkerWindow,
    partial: Record,
    last: Option<Record>,
    stats: ReassemblerStats,
}

impl ReassemblyState {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            window: MarkerWindow::new(),
            partial: Record::default(),
            last: None,
            stats: ReassemblerStats::default(),
        }
    }

    fn feed(&mut self, bytes: &[u8]) -> Option<Record> {
        let mut newest = None;
        for &byte in bytes {
            if let Some(record) = self.push_byte(byte) {
                newest = Some(record);
            }
        }
        newest
    }

    fn push_byte(&mut self, byte: u8) -> Option<Record> {
        self.stats.bytes_consumed += 1;

        if self.window.observe(byte) {
            self.synchronize();
            return None;
        }

        let Phase::Collecting {
            field,
            mut accumulator,
        } = self.phase
        else {
            return None;
        };

        let Some(encoded) = accumulator.push(byte) else {
            self.phase = Phase::Collecting { field, accumulator };
            return None;
        };

        self.partial.set(field, decode_field_array(&encoded));

        match Field::from_index(field.index() + 1) {
            Some(next) => {
                self.phase = Phase::Collecting {
                    field: next,
                    accumulator: Accumulator::default(),
                };
                None
            }
            None => Some(self.complete()),
        }
    }

    fn synchronize(&mut self) {
        if let Phase::Collecting { field, accumulator } = self.phase {
            self.stats.resyncs += 1;
            debug!(
                field = %field,
                buffered = accumulator.len,
                "marker inside frame, resynchronizing"
            );
        }
        self.partial = Record::default();
        self.phase = Phase::Collecting {
            field: Field::CurrX,
            accumulator: Accumulator::default(),
        };
    }

    fn complete(&mut self) -> Record {
        let record = self.partial;
        self.last = Some(record);
        self.phase = Phase::Idle;
        self.stats.frames_completed += 1;
        trace!(frames = self.stats.frames_completed, ?record, "frame complete");
        record
    }

    fn is_collecting(&self) -> bool {
        matches!(self.phase, Phase::Collecting { .. })
    }
}

/// Rebuilds records from a byte stream, one poll at a time.
///
/// Drive it by calling [`tick`](Self::tick) from a periodic loop. Each tick
/// drains what the source has already buffered and returns; nothing here
/// blocks or spawns. A single caller owns the reassembler (`&mut self`).
///
/// Readiness latches: once a frame has completed, [`is_ready`](Self::is_ready)
/// stays true and [`last_record`](Self::last_record) returns the newest
/// record, overwritten whole by each later frame. `tick` returns `Some` only
/// for ticks in which a frame completed.
#[derive(Debug, Clone)]
pub struct Reassembler {
    config: ReassemblerConfig,
    state: ReassemblyState,
    read_buf: Vec<u8>,
    idle_ticks: u32,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reassembler {
    /// Create a reassembler with default configuration.
    pub fn new() -> Self {
        Self::with_config(ReassemblerConfig::default())
    }

    /// Create a reassembler with explicit configuration.
    pub fn with_config(config: ReassemblerConfig) -> Self {
        let chunk = config.read_chunk_size.max(1);
        Self {
            config,
            state: ReassemblyState::new(),
            read_buf: vec![0u8; chunk],
            idle_ticks: 0,
        }
    }

    /// Consume whatever `source` has buffered right now.
    ///
    /// Returns the newest record completed during this tick, if any. Read
    /// failures are returned as-is; bytes consumed before the failure have
    /// already advanced the state machine.
    pub fn tick<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<Option<Record>> {
        let mut newest = None;
        let mut consumed = 0usize;

        while consumed < self.config.max_bytes_per_tick {
            let want = self
                .read_buf
                .len()
                .min(self.config.max_bytes_per_tick - consumed);
            let n = source.read_available(&mut self.read_buf[..want])?;
            if n == 0 {
                break;
            }
            consumed += n;
            if let Some(record) = self.state.feed(&self.read_buf[..n]) {
                newest = Some(record);
            }
            if n < want {
                break;
            }
        }

        self.track_stall(consumed);
        Ok(newest)
    }

    /// Push bytes the caller already holds through the state machine.
    ///
    /// Returns the newest record completed by these bytes, if any. Feeding
    /// does not count toward the stall timeout, which is measured in ticks.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<Record> {
        self.state.feed(bytes)
    }

    /// True once at least one frame has completed.
    pub fn is_ready(&self) -> bool {
        self.state.last.is_some()
    }

    /// The most recently completed record; `Some` exactly when
    /// [`is_ready`](Self::is_ready) is true.
    pub fn last_record(&self) -> Option<Record> {
        self.state.last
    }

    pub fn state(&self) -> ReassemblerState {
        match self.state.phase {
            Phase::Idle => ReassemblerState::Idle,
            Phase::Collecting { field, accumulator } => ReassemblerState::CollectingField {
                field,
                buffered: accumulator.len,
            },
        }
    }

    pub fn stats(&self) -> ReassemblerStats {
        self.state.stats
    }

    /// Current configuration.
    pub fn config(&self) -> &ReassemblerConfig {
        &self.config
    }

    /// Forget everything, including the last record and counters.
    pub fn reset(&mut self) {
        self.state = ReassemblyState::new();
        self.idle_ticks = 0;
    }

    fn track_stall(&mut self, consumed: usize) {
        if consumed > 0 || !self.state.is_collecting() {
            self.idle_ticks = 0;
            return;
        }

        self.idle_ticks = self.idle_ticks.saturating_add(1);
        let Some(limit) = self.config.stall_ticks else {
            return;
        };
        if self.idle_ticks >= limit.max(1) {
            debug!(
                idle_ticks = self.idle_ticks,
                state = ?self.state(),
                "link stalled mid-frame, dropping partial frame"
            );
            self.state.phase = Phase::Idle;
            self.state.partial = Record::default();
            self.state.stats.stall_resets += 1;
            self.idle_ticks = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use statelink_transport::{ByteSink, MemoryLink, TransportError};

    use super::*;
    use crate::codec::{encode_field, encode_frame, FRAME_SIZE};
    use crate::error::FrameError;

    fn sample() -> Record {
        Record::from_array([1.1, 2.2, 3.3, 4.4, 5.5, 6.6])
    }

    fn wire(record: &Record) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(record, &mut buf);
        buf.to_vec()
    }

    #[test]
    fn split_5_1_10_12_across_four_ticks() {
        let (mut tx, mut rx) = MemoryLink::pair();
        let bytes = wire(&sample());
        let mut reassembler = Reassembler::new();

        let mut offset = 0;
        for (i, len) in [5usize, 1, 10, 12].into_iter().enumerate() {
            tx.write_bytes(&bytes[offset..offset + len]).unwrap();
            offset += len;
            let completed = reassembler.tick(&mut rx).unwrap();
            if i < 3 {
                assert!(completed.is_none(), "tick {}", i + 1);
                assert!(!reassembler.is_ready(), "tick {}", i + 1);
                assert_eq!(reassembler.last_record(), None);
            } else {
                assert!(reassembler.is_ready());
                assert!(completed.unwrap().bit_eq(&sample()));
                assert!(reassembler.last_record().unwrap().bit_eq(&sample()));
            }
        }
        assert_eq!(offset, FRAME_SIZE);
        assert_eq!(reassembler.state(), ReassemblerState::Idle);
    }

    #[test]
    fn byte_at_a_time() {
        let mut reassembler = Reassembler::new();
        let bytes = wire(&sample());
        for (i, byte) in bytes.iter().enumerate() {
            let completed = reassembler.feed(&[*byte]);
            assert_eq!(completed.is_some(), i == FRAME_SIZE - 1);
        }
        assert!(reassembler.last_record().unwrap().bit_eq(&sample()));
    }

    #[test]
    fn twenty_of_twenty_eight_bytes_never_ready() {
        let (mut tx, mut rx) = MemoryLink::pair();
        let bytes = wire(&sample());
        let mut reassembler = Reassembler::new();

        tx.write_bytes(&bytes[..20]).unwrap();
        for _ in 0..1_000 {
            assert!(reassembler.tick(&mut rx).unwrap().is_none());
            assert!(!reassembler.is_ready());
        }
        assert_eq!(
            reassembler.state(),
            ReassemblerState::CollectingField {
                field: Field::GoalX,
                buffered: 0
            }
        );
    }

    #[test]
    fn goal_y_comes_from_its_own_slot() {
        let record = Record::from_array([0.0, 0.0, 0.0, 0.0, 5.0, -7.25]);
        let mut reassembler = Reassembler::new();
        let completed = reassembler.feed(&wire(&record)).unwrap();
        assert_eq!(completed.goal_x, 5.0);
        assert_eq!(completed.goal_y, -7.25);
    }

    #[test]
    fn leading_noise_is_ignored() {
        let mut reassembler = Reassembler::new();
        let mut bytes = vec![0x00, 0xFF, 0xA5, 0x5A, 0x13, 0xA5, 0x37, 0x7F];
        bytes.extend(wire(&sample()));

        let completed = reassembler.feed(&bytes).unwrap();
        assert!(completed.bit_eq(&sample()));
        assert_eq!(reassembler.stats().resyncs, 0);
    }

    #[test]
    fn partial_marker_run_before_real_marker() {
        // A5 5A A5 | A5 5A A5 7F ...: the real marker still matches.
        let mut bytes = vec![0xA5, 0x5A, 0xA5];
        bytes.extend(wire(&sample()));
        let mut reassembler = Reassembler::new();
        assert!(reassembler.feed(&bytes).unwrap().bit_eq(&sample()));
    }

    #[test]
    fn marker_inside_field_data_restarts_collection() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MARKER);
        bytes.extend_from_slice(&encode_field(1.0));
        bytes.extend_from_slice(&encode_field(2.0));
        bytes.extend_from_slice(&[0x11, 0x22]);
        bytes.extend_from_slice(&MARKER);

        let mut reassembler = Reassembler::new();
        assert!(reassembler.feed(&bytes).is_none());
        assert_eq!(
            reassembler.state(),
            ReassemblerState::CollectingField {
                field: Field::CurrX,
                buffered: 0
            }
        );
        assert_eq!(reassembler.stats().resyncs, 1);

        let fresh = Record::from_array([9.0, 8.0, 7.0, 6.0, 5.0, 4.0]);
        let completed = reassembler.feed(&wire(&fresh)[MARKER_SIZE..]).unwrap();
        assert!(completed.bit_eq(&fresh));
    }

    #[test]
    fn marker_ending_on_last_payload_byte_prevents_completion() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MARKER);
        bytes.extend_from_slice(&[0u8; 20]);
        bytes.extend_from_slice(&MARKER);

        let mut reassembler = Reassembler::new();
        assert!(reassembler.feed(&bytes).is_none());
        assert!(!reassembler.is_ready());
        assert_eq!(reassembler.stats().resyncs, 1);
    }

    #[test]
    fn truncated_frame_followed_by_full_frame() {
        let first = wire(&Record::from_array([1.0; 6]));
        let second = Record::from_array([2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);

        let mut bytes = first[..14].to_vec();
        bytes.extend(wire(&second));

        let mut reassembler = Reassembler::new();
        let completed = reassembler.feed(&bytes).unwrap();
        assert!(completed.bit_eq(&second));
        assert_eq!(reassembler.stats().frames_completed, 1);
    }

    #[test]
    fn later_frame_overwrites_last_record() {
        let first = Record::from_array([1.0; 6]);
        let second = Record::from_array([2.0; 6]);
        let mut reassembler = Reassembler::new();

        reassembler.feed(&wire(&first));
        assert!(reassembler.last_record().unwrap().bit_eq(&first));

        reassembler.feed(&wire(&second));
        assert!(reassembler.last_record().unwrap().bit_eq(&second));
        assert_eq!(reassembler.stats().frames_completed, 2);
    }

    #[test]
    fn tick_returns_newest_of_several_frames() {
        let (mut tx, mut rx) = MemoryLink::pair();
        for value in [1.0f32, 2.0, 3.0] {
            tx.write_bytes(&wire(&Record::from_array([value; 6]))).unwrap();
        }

        let mut reassembler = Reassembler::new();
        let completed = reassembler.tick(&mut rx).unwrap().unwrap();
        assert_eq!(completed.curr_x, 3.0);
        assert_eq!(reassembler.stats().frames_completed, 3);
    }

    #[test]
    fn readiness_latches_across_empty_ticks() {
        let (mut tx, mut rx) = MemoryLink::pair();
        tx.write_bytes(&wire(&sample())).unwrap();

        let mut reassembler = Reassembler::new();
        assert!(reassembler.tick(&mut rx).unwrap().is_some());
        for _ in 0..10 {
            assert!(reassembler.tick(&mut rx).unwrap().is_none());
            assert!(reassembler.is_ready());
        }
    }

    #[test]
    fn tick_with_nothing_buffered_returns_immediately() {
        let (_tx, mut rx) = MemoryLink::pair();
        let mut reassembler = Reassembler::new();
        assert!(reassembler.tick(&mut rx).unwrap().is_none());
        assert_eq!(reassembler.state(), ReassemblerState::Idle);
        assert_eq!(reassembler.stats().bytes_consumed, 0);
    }

    #[test]
    fn tick_respects_byte_budget() {
        let (mut tx, mut rx) = MemoryLink::pair();
        tx.write_bytes(&wire(&sample())).unwrap();

        let mut reassembler = Reassembler::with_config(ReassemblerConfig {
            read_chunk_size: 4,
            max_bytes_per_tick: 10,
            ..ReassemblerConfig::default()
        });

        assert!(reassembler.tick(&mut rx).unwrap().is_none());
        assert_eq!(reassembler.stats().bytes_consumed, 10);
        assert!(reassembler.tick(&mut rx).unwrap().is_none());
        assert!(reassembler.tick(&mut rx).unwrap().is_some());
        assert_eq!(reassembler.stats().bytes_consumed, 28);
    }

    #[test]
    fn stall_timeout_drops_partial_frame() {
        let (mut tx, mut rx) = MemoryLink::pair();
        let bytes = wire(&sample());
        let mut reassembler = Reassembler::with_config(ReassemblerConfig {
            stall_ticks: Some(3),
            ..ReassemblerConfig::default()
        });

        tx.write_bytes(&bytes[..12]).unwrap();
        reassembler.tick(&mut rx).unwrap();
        reassembler.tick(&mut rx).unwrap();
        reassembler.tick(&mut rx).unwrap();
        assert!(matches!(
            reassembler.state(),
            ReassemblerState::CollectingField { .. }
        ));

        reassembler.tick(&mut rx).unwrap();
        assert_eq!(reassembler.state(), ReassemblerState::Idle);
        assert_eq!(reassembler.stats().stall_resets, 1);

        tx.write_bytes(&bytes[12..]).unwrap();
        assert!(reassembler.tick(&mut rx).unwrap().is_none());
        assert!(!reassembler.is_ready());

        tx.write_bytes(&bytes).unwrap();
        assert!(reassembler.tick(&mut rx).unwrap().is_some());
    }

    #[test]
    fn without_stall_timeout_machine_stays_parked() {
        let (mut tx, mut rx) = MemoryLink::pair();
        let bytes = wire(&sample());
        let mut reassembler = Reassembler::new();

        tx.write_bytes(&bytes[..12]).unwrap();
        for _ in 0..100 {
            reassembler.tick(&mut rx).unwrap();
        }
        tx.write_bytes(&bytes[12..]).unwrap();
        assert!(reassembler.tick(&mut rx).unwrap().is_some());
        assert_eq!(reassembler.stats().stall_resets, 0);
    }

    #[test]
    fn read_failure_propagates() {
        struct FailingSource;

        impl ByteSource for FailingSource {
            fn read_available(&mut self, _buf: &mut [u8]) -> statelink_transport::Result<usize> {
                Err(TransportError::Io(std::io::Error::from(
                    std::io::ErrorKind::BrokenPipe,
                )))
            }
        }

        let mut reassembler = Reassembler::new();
        let err = reassembler.tick(&mut FailingSource).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Io(e)) if e.kind() == std::io::ErrorKind::BrokenPipe
        ));
        assert!(!reassembler.is_ready());
    }

    #[test]
    fn reset_forgets_everything() {
        let mut reassembler = Reassembler::new();
        reassembler.feed(&wire(&sample()));
        reassembler.feed(&MARKER);
        reassembler.reset();

        assert!(!reassembler.is_ready());
        assert_eq!(reassembler.state(), ReassemblerState::Idle);
        assert_eq!(reassembler.stats(), ReassemblerStats::default());
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        let (mut tx, mut rx) = MemoryLink::pair();
        tx.write_bytes(&wire(&sample())).unwrap();
        let mut reassembler = Reassembler::with_config(ReassemblerConfig {
            read_chunk_size: 0,
            ..ReassemblerConfig::default()
        });
        assert!(reassembler.tick(&mut rx).unwrap().is_some());
    }
}
