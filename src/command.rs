//! Pixel commands decoded from protocol frames.

use crate::types::{BLACK, PixelState};
use palette::Srgb;

/// One pixel update instruction.
///
/// Commands are ephemeral: the parser decodes one, hands it to the store and
/// forgets it (unless the commit policy is buffering the frame).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    /// Target pixel index. May be out of range; the store ignores those.
    pub index: u16,

    /// Requested animation state.
    pub state: PixelState,

    /// Requested base color.
    pub color: Srgb<u8>,
}

impl Command {
    /// Creates a command.
    #[inline]
    pub const fn new(index: u16, state: PixelState, color: Srgb<u8>) -> Self {
        Self {
            index,
            state,
            color,
        }
    }

    /// Creates a command from raw wire values.
    ///
    /// An unknown state byte turns the pixel off and discards the color.
    pub const fn from_wire(index: u16, state: u8, red: u8, green: u8, blue: u8) -> Self {
        match PixelState::from_wire(state) {
            Some(state) => Self::new(index, state, Srgb::new(red, green, blue)),
            None => Self::new(index, PixelState::Off, BLACK),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_wire_keeps_known_state_and_color() {
        let cmd = Command::from_wire(7, 2, 1, 2, 3);
        assert_eq!(cmd.index, 7);
        assert_eq!(cmd.state, PixelState::Blink);
        assert_eq!(cmd.color, Srgb::new(1, 2, 3));
    }

    #[test]
    fn from_wire_maps_unknown_state_to_black_off() {
        let cmd = Command::from_wire(3, 9, 255, 255, 255);
        assert_eq!(cmd.state, PixelState::Off);
        assert_eq!(cmd.color, BLACK);
    }
}
