//! Core pixel types shared by the parser, store and animation engine.

use palette::Srgb;

/// Black, the color of every pixel that is off.
pub const BLACK: Srgb<u8> = Srgb::new(0, 0, 0);

/// Animation state of a single pixel.
///
/// The discriminants match the wire encoding of the state byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PixelState {
    /// Pixel is dark.
    #[default]
    Off = 0,

    /// Pixel shows its base color until a frame no longer mentions it.
    Solid = 1,

    /// Pixel alternates between base color and black with 50% duty.
    Blink = 2,

    /// Pixel fades from base color to black, then turns itself off.
    Pulse = 3,
}

impl PixelState {
    /// Decodes a wire state byte. Returns `None` for unknown values.
    #[inline]
    pub const fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PixelState::Off),
            1 => Some(PixelState::Solid),
            2 => Some(PixelState::Blink),
            3 => Some(PixelState::Pulse),
            _ => None,
        }
    }

    /// Encodes this state as its wire byte.
    #[inline]
    pub const fn to_wire(self) -> u8 {
        self as u8
    }
}

/// Per-pixel animation record.
///
/// `anim_start` is reset every time `state` or `base_color` is written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRecord<I> {
    /// Current animation state.
    pub state: PixelState,

    /// Target color of the last command.
    pub base_color: Srgb<u8>,

    /// Instant the current state was entered.
    pub anim_start: I,
}

impl<I: Copy> PixelRecord<I> {
    /// A dark pixel whose animation clock starts at `now`.
    #[inline]
    pub const fn off(now: I) -> Self {
        Self {
            state: PixelState::Off,
            base_color: BLACK,
            anim_start: now,
        }
    }
}
