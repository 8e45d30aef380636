//! Wire format of the host-to-strip frame protocol.
//!
//! All multi-byte integers are little-endian.
//!
//! ```text
//! byte 0      : 0xAA                 header A
//! byte 1      : 0x55                 header B
//! byte 2-3    : u16 count            number of payload records
//! repeat `count` times:
//!   u16 led_index
//!   u8  state                        0=Off 1=Solid 2=Blink 3=Pulse
//!   u8  r, u8 g, u8 b
//! byte last   : u8 checksum          sum of all preceding bytes mod 256
//! ```

use crate::command::Command;
use heapless::Vec;

/// First header byte.
pub const HEADER_A: u8 = 0xAA;

/// Second header byte.
pub const HEADER_B: u8 = 0x55;

/// Length of one payload record in bytes.
pub const PAYLOAD_LEN: usize = 6;

/// Bytes in a frame besides its payload records (header, count, checksum).
pub const FRAME_OVERHEAD: usize = 5;

/// Total encoded length of a frame carrying `count` payloads.
#[inline]
pub const fn frame_len(count: usize) -> usize {
    FRAME_OVERHEAD + count * PAYLOAD_LEN
}

/// Modulo-256 sum of `bytes`.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Decodes one payload record.
#[inline]
pub fn decode_payload(record: &[u8; PAYLOAD_LEN]) -> Command {
    let index = u16::from_le_bytes([record[0], record[1]]);
    Command::from_wire(index, record[2], record[3], record[4], record[5])
}

/// Encodes one payload record.
#[inline]
pub fn encode_payload(command: &Command) -> [u8; PAYLOAD_LEN] {
    let [lo, hi] = command.index.to_le_bytes();
    [
        lo,
        hi,
        command.state.to_wire(),
        command.color.red,
        command.color.green,
        command.color.blue,
    ]
}

/// Frame encoding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The output buffer cannot hold another payload.
    BufferFull,

    /// More commands than a 16-bit count can declare.
    TooManyCommands,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EncodeError::BufferFull => write!(f, "frame buffer capacity exceeded"),
            EncodeError::TooManyCommands => {
                write!(f, "frame cannot declare more than {} commands", u16::MAX)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Builder for encoding frames on the host side or in tests.
///
/// # Type Parameters
/// * `CAP` - Capacity in bytes of the encoded frame buffer
///
/// # Example
///
/// ```
/// use strip_link::{Command, FrameBuilder, PixelState};
/// use palette::Srgb;
///
/// let frame = FrameBuilder::<16>::new()
///     .command(Command::new(0, PixelState::Solid, Srgb::new(255, 0, 0)))
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     frame.as_slice(),
///     &[0xAA, 0x55, 0x01, 0x00, 0x00, 0x00, 0x01, 0xFF, 0x00, 0x00, 0x00]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FrameBuilder<const CAP: usize> {
    payloads: Vec<u8, CAP>,
    count: u16,
}

impl<const CAP: usize> FrameBuilder<CAP> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            payloads: Vec::new(),
            count: 0,
        }
    }

    /// Appends a command.
    ///
    /// # Errors
    /// * `BufferFull` - The encoded frame would not fit in `CAP` bytes
    /// * `TooManyCommands` - The count would overflow `u16`
    pub fn command(mut self, command: Command) -> Result<Self, EncodeError> {
        let count = self.count.checked_add(1).ok_or(EncodeError::TooManyCommands)?;
        if frame_len(usize::from(count)) > CAP {
            return Err(EncodeError::BufferFull);
        }
        self.payloads
            .extend_from_slice(&encode_payload(&command))
            .map_err(|_| EncodeError::BufferFull)?;
        self.count = count;
        Ok(self)
    }

    /// Number of commands added so far.
    pub fn len(&self) -> usize {
        usize::from(self.count)
    }

    /// Returns true if no commands were added.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Encodes the frame, appending the checksum.
    ///
    /// # Errors
    /// * `BufferFull` - `CAP` is too small for the frame
    pub fn build(self) -> Result<Vec<u8, CAP>, EncodeError> {
        let mut frame = Vec::new();
        let [lo, hi] = self.count.to_le_bytes();

        frame
            .extend_from_slice(&[HEADER_A, HEADER_B, lo, hi])
            .map_err(|_| EncodeError::BufferFull)?;
        frame
            .extend_from_slice(&self.payloads)
            .map_err(|_| EncodeError::BufferFull)?;

        let sum = checksum(&frame);
        frame.push(sum).map_err(|_| EncodeError::BufferFull)?;
        Ok(frame)
    }
}

impl<const CAP: usize> Default for FrameBuilder<CAP> {
    fn default() -> Self {
        Self::new()
    }
}
