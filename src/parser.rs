//! Byte-at-a-time frame parser.
//!
//! [`FrameParser`] turns an unstructured, possibly corrupted byte stream into
//! pixel commands. It never buffers more than one payload record in
//! [`ApplyPolicy::Streaming`] mode: each command reaches the [`PixelStore`] as
//! soon as its six bytes are in.
//!
//! ```text
//! FindHeaderA -> FindHeaderB -> ReadCountLow -> ReadCountHigh
//!      ^                                             |
//!      |                      count == 0             v
//!      +------ ReadChecksum <-------------------- ReadPayloads
//! ```

use crate::command::Command;
use crate::config::{ApplyPolicy, ConfigError, ControllerConfig};
use crate::protocol::{HEADER_A, HEADER_B, PAYLOAD_LEN, decode_payload};
use crate::store::PixelStore;
use crate::time::{TimeDuration, TimeInstant, millis_since};
use heapless::Vec;

/// Parser position within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    /// Scanning for `0xAA`.
    FindHeaderA,
    /// Got `0xAA`, expecting `0x55`.
    FindHeaderB,
    /// Expecting the low byte of the payload count.
    ReadCountLow,
    /// Expecting the high byte of the payload count.
    ReadCountHigh,
    /// Accumulating payload records.
    ReadPayloads,
    /// Expecting the checksum byte.
    ReadChecksum,
}

/// Reasons a frame is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Declared payload count above the accepted maximum.
    CountTooLarge {
        /// Count found on the wire.
        count: u16,
        /// Largest count accepted.
        max: u16,
    },

    /// Checksum mismatch in commit mode; the frame's commands were discarded.
    ChecksumMismatch {
        /// Checksum computed over the received bytes.
        expected: u8,
        /// Checksum byte found on the wire.
        received: u8,
    },

    /// No byte arrived within the frame timeout while mid-frame.
    Stale,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::CountTooLarge { count, max } => {
                write!(f, "frame declares {} payloads, maximum is {}", count, max)
            }
            FrameError::ChecksumMismatch { expected, received } => {
                write!(
                    f,
                    "checksum mismatch: computed {:#04x}, received {:#04x}",
                    expected, received
                )
            }
            FrameError::Stale => write!(f, "frame timed out before completion"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}

/// Outcome reported when the parser leaves a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameEvent {
    /// The checksum byte was read and the end-of-frame sweep ran.
    Completed {
        /// Number of payload records in the frame.
        commands: u16,
        /// Whether the checksum matched.
        checksum_valid: bool,
    },

    /// The frame was dropped.
    Rejected(FrameError),
}

/// Running counters kept by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStats {
    /// Frames whose checksum byte was read, valid or not.
    pub frames_completed: u32,
    /// Frames whose checksum did not match.
    pub checksum_failures: u32,
    /// Frames dropped for declaring too many payloads.
    pub oversized_frames: u32,
    /// Frames dropped by the stale timeout.
    pub stale_frames: u32,
    /// Bytes discarded while hunting for a header.
    pub noise_bytes: u32,
}

/// Frame parser state machine.
///
/// # Type Parameters
/// * `I` - Time instant type
/// * `P` - Capacity of the command buffer used by
///   [`ApplyPolicy::CommitOnValidChecksum`]. Unused in streaming mode.
#[derive(Debug)]
pub struct FrameParser<I: TimeInstant, const P: usize> {
    state: ParserState,
    checksum: u8,
    expected: u16,
    received: u16,
    record: [u8; PAYLOAD_LEN],
    record_len: usize,
    max_payloads: u16,
    policy: ApplyPolicy,
    timeout_ms: Option<u64>,
    pending: Vec<Command, P>,
    last_byte_at: Option<I>,
    stats: FrameStats,
}

/// Parser without a commit buffer, for [`ApplyPolicy::Streaming`].
pub type StreamingParser<I> = FrameParser<I, 0>;

impl<I: TimeInstant, const P: usize> FrameParser<I, P> {
    /// Creates a parser waiting for a header.
    pub fn new(max_payloads: u16, policy: ApplyPolicy) -> Self {
        Self {
            state: ParserState::FindHeaderA,
            checksum: 0,
            expected: 0,
            received: 0,
            record: [0; PAYLOAD_LEN],
            record_len: 0,
            max_payloads,
            policy,
            timeout_ms: None,
            pending: Vec::new(),
            last_byte_at: None,
            stats: FrameStats::default(),
        }
    }

    /// Creates a parser from the controller configuration, including its
    /// stale-frame timeout.
    ///
    /// # Errors
    /// * Any error from [`ControllerConfig::validate`]
    /// * `NoCommitBuffer` - commit policy selected with `P == 0`
    pub fn from_config<D: TimeDuration>(
        config: &ControllerConfig<D>,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        if config.apply_policy == ApplyPolicy::CommitOnValidChecksum && P == 0 {
            return Err(ConfigError::NoCommitBuffer);
        }

        let mut parser = Self::new(config.max_payloads, config.apply_policy);
        parser.timeout_ms = config.frame_timeout.map(|t| t.as_millis());
        Ok(parser)
    }

    /// Largest payload count accepted under the current policy.
    pub fn effective_max_payloads(&self) -> u16 {
        match self.policy {
            ApplyPolicy::Streaming => self.max_payloads,
            ApplyPolicy::CommitOnValidChecksum => {
                let capacity = u16::try_from(P).unwrap_or(u16::MAX);
                self.max_payloads.min(capacity)
            }
        }
    }

    /// Feeds one byte received at `now`.
    ///
    /// Commands are applied to `store` as they complete (streaming) or when
    /// the frame's checksum matches (commit).
    ///
    /// # Returns
    /// * `Some(event)` - The byte finished or aborted a frame
    /// * `None` - More bytes are needed
    pub fn push_byte<const N: usize>(
        &mut self,
        byte: u8,
        store: &mut PixelStore<I, N>,
        now: I,
    ) -> Option<FrameEvent> {
        self.last_byte_at = Some(now);

        match self.state {
            ParserState::FindHeaderA => {
                self.scan_for_header(byte);
                None
            }
            ParserState::FindHeaderB => {
                if byte == HEADER_B {
                    self.checksum = self.checksum.wrapping_add(byte);
                    self.state = ParserState::ReadCountLow;
                } else {
                    // The pending 0xAA was noise; this byte may start a new header.
                    self.stats.noise_bytes = self.stats.noise_bytes.wrapping_add(1);
                    self.state = ParserState::FindHeaderA;
                    self.scan_for_header(byte);
                }
                None
            }
            ParserState::ReadCountLow => {
                self.checksum = self.checksum.wrapping_add(byte);
                self.expected = u16::from(byte);
                self.state = ParserState::ReadCountHigh;
                None
            }
            ParserState::ReadCountHigh => {
                self.checksum = self.checksum.wrapping_add(byte);
                self.expected |= u16::from(byte) << 8;
                self.begin_frame(store)
            }
            ParserState::ReadPayloads => {
                self.checksum = self.checksum.wrapping_add(byte);
                self.record[self.record_len] = byte;
                self.record_len += 1;

                if self.record_len == PAYLOAD_LEN {
                    self.record_len = 0;
                    self.received += 1;
                    let command = decode_payload(&self.record);
                    self.dispatch(command, store, now);

                    if self.received >= self.expected {
                        self.state = ParserState::ReadChecksum;
                    }
                }
                None
            }
            ParserState::ReadChecksum => {
                let event = self.end_frame(byte, store, now);
                self.reset();
                Some(event)
            }
        }
    }

    /// Drops a half-received frame if no byte arrived for the timeout.
    ///
    /// Commands already applied in streaming mode stay in effect and the
    /// end-of-frame sweep does not run.
    ///
    /// # Returns
    /// `Some(FrameEvent::Rejected(FrameError::Stale))` if the parser was reset.
    pub fn poll_timeout<const N: usize>(
        &mut self,
        store: &mut PixelStore<I, N>,
        now: I,
    ) -> Option<FrameEvent> {
        let timeout_ms = self.timeout_ms?;
        let last = self.last_byte_at?;

        if self.state == ParserState::FindHeaderA || millis_since(now, last) < timeout_ms {
            return None;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "frame stalled in {} after {} of {} payloads, resyncing",
            self.state,
            self.received,
            self.expected
        );

        store.abort_frame();
        self.stats.stale_frames = self.stats.stale_frames.wrapping_add(1);
        self.reset();
        Some(FrameEvent::Rejected(FrameError::Stale))
    }

    /// Returns to `FindHeaderA`, discarding any partial frame.
    pub fn reset(&mut self) {
        self.state = ParserState::FindHeaderA;
        self.checksum = 0;
        self.expected = 0;
        self.received = 0;
        self.record_len = 0;
        self.pending.clear();
    }

    /// Current parser state.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Payload count declared by the frame being parsed.
    pub fn expected_count(&self) -> u16 {
        self.expected
    }

    fn scan_for_header(&mut self, byte: u8) {
        if byte == HEADER_A {
            self.checksum = byte;
            self.state = ParserState::FindHeaderB;
        } else {
            self.stats.noise_bytes = self.stats.noise_bytes.wrapping_add(1);
        }
    }

    fn begin_frame<const N: usize>(&mut self, store: &mut PixelStore<I, N>) -> Option<FrameEvent> {
        let max = self.effective_max_payloads();
        if self.expected > max {
            #[cfg(feature = "defmt")]
            defmt::debug!("dropping frame declaring {} payloads (max {})", self.expected, max);

            let count = self.expected;
            self.stats.oversized_frames = self.stats.oversized_frames.wrapping_add(1);
            self.reset();
            return Some(FrameEvent::Rejected(FrameError::CountTooLarge { count, max }));
        }

        match self.policy {
            ApplyPolicy::Streaming => store.begin_frame(),
            ApplyPolicy::CommitOnValidChecksum => self.pending.clear(),
        }

        self.received = 0;
        self.record_len = 0;
        self.state = if self.expected == 0 {
            ParserState::ReadChecksum
        } else {
            ParserState::ReadPayloads
        };
        None
    }

    fn dispatch<const N: usize>(&mut self, command: Command, store: &mut PixelStore<I, N>, now: I) {
        match self.policy {
            ApplyPolicy::Streaming => {
                store.apply_command(command, now);
            }
            ApplyPolicy::CommitOnValidChecksum => {
                // begin_frame caps the count at P.
                let buffered = self.pending.push(command).is_ok();
                debug_assert!(buffered, "commit buffer overflow");

                #[cfg(feature = "defmt")]
                if !buffered {
                    defmt::warn!("commit buffer full, dropping command for pixel {}", command.index);
                }
            }
        }
    }

    fn end_frame<const N: usize>(
        &mut self,
        received: u8,
        store: &mut PixelStore<I, N>,
        now: I,
    ) -> FrameEvent {
        let expected = self.checksum;
        let checksum_valid = expected == received;

        self.stats.frames_completed = self.stats.frames_completed.wrapping_add(1);
        if !checksum_valid {
            self.stats.checksum_failures = self.stats.checksum_failures.wrapping_add(1);

            #[cfg(feature = "defmt")]
            defmt::warn!(
                "checksum mismatch: computed {=u8:#x}, received {=u8:#x}",
                expected,
                received
            );
        }

        match self.policy {
            ApplyPolicy::Streaming => {
                store.end_frame(checksum_valid, now);
            }
            ApplyPolicy::CommitOnValidChecksum => {
                if !checksum_valid {
                    self.pending.clear();
                    return FrameEvent::Rejected(FrameError::ChecksumMismatch {
                        expected,
                        received,
                    });
                }

                store.begin_frame();
                for command in self.pending.iter() {
                    store.apply_command(*command, now);
                }
                store.end_frame(true, now);
                self.pending.clear();
            }
        }

        FrameEvent::Completed {
            commands: self.expected,
            checksum_valid,
        }
    }
}
