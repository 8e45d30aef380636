//! Fixed-size storage of per-pixel animation state.
//!
//! [`PixelStore`] owns one [`PixelRecord`] per addressable pixel plus the
//! "seen this frame" flags used by the end-of-frame sweep. It is the only
//! mutable state shared by the parser and the animation engine, and both
//! borrow it exclusively, so no locking is involved.

use crate::command::Command;
use crate::time::TimeInstant;
use crate::types::{PixelRecord, PixelState};

/// Per-pixel animation state for a strip of `N` pixels.
///
/// # Type Parameters
/// * `I` - Time instant type
/// * `N` - Number of pixels on the strip
#[derive(Debug, Clone)]
pub struct PixelStore<I: TimeInstant, const N: usize> {
    pixels: [PixelRecord<I>; N],
    seen: [bool; N],
    in_frame: bool,
}

impl<I: TimeInstant, const N: usize> PixelStore<I, N> {
    /// Creates a store with every pixel off and black.
    pub fn new(now: I) -> Self {
        Self {
            pixels: core::array::from_fn(|_| PixelRecord::off(now)),
            seen: [false; N],
            in_frame: false,
        }
    }

    /// Opens a frame: every pixel is marked as not yet seen.
    pub fn begin_frame(&mut self) {
        self.seen = [false; N];
        self.in_frame = true;
    }

    /// Applies one command at time `now`.
    ///
    /// Out-of-range indices are ignored. A later command for the same pixel
    /// overwrites an earlier one.
    ///
    /// # Returns
    /// `true` if a pixel was updated.
    pub fn apply_command(&mut self, command: Command, now: I) -> bool {
        let idx = usize::from(command.index);
        let Some(pixel) = self.pixels.get_mut(idx) else {
            #[cfg(feature = "defmt")]
            defmt::trace!("ignoring command for pixel {} (strip has {})", idx, N);
            return false;
        };

        pixel.state = command.state;
        pixel.base_color = command.color;
        pixel.anim_start = now;

        if self.in_frame {
            self.seen[idx] = true;
        }
        true
    }

    /// Closes a frame.
    ///
    /// Every `Solid` pixel not mentioned since [`begin_frame`](Self::begin_frame)
    /// is turned off. `Blink` and `Pulse` pixels keep animating. The checksum
    /// outcome does not change the sweep; it is only logged.
    ///
    /// # Returns
    /// The number of pixels turned off.
    pub fn end_frame(&mut self, checksum_valid: bool, now: I) -> usize {
        let mut cleared = 0;

        for (pixel, seen) in self.pixels.iter_mut().zip(self.seen.iter()) {
            if !*seen && pixel.state == PixelState::Solid {
                pixel.state = PixelState::Off;
                pixel.anim_start = now;
                cleared += 1;
            }
        }

        self.in_frame = false;

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "frame closed (checksum ok: {}), {} solid pixels cleared",
            checksum_valid,
            cleared
        );
        #[cfg(not(feature = "defmt"))]
        let _ = checksum_valid;

        cleared
    }

    /// Abandons an open frame without running the sweep.
    pub fn abort_frame(&mut self) {
        self.in_frame = false;
    }

    /// Returns the record of a pixel, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<&PixelRecord<I>> {
        self.pixels.get(index)
    }

    /// Returns whether the pixel was commanded during the open frame.
    ///
    /// Returns `None` outside a frame, where the flags are stale, and for
    /// out-of-range indices.
    pub fn seen_this_frame(&self, index: usize) -> Option<bool> {
        if !self.in_frame {
            return None;
        }
        self.seen.get(index).copied()
    }

    /// Returns true between `begin_frame` and `end_frame`/`abort_frame`.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Iterates over all pixel records in index order.
    pub fn iter(&self) -> core::slice::Iter<'_, PixelRecord<I>> {
        self.pixels.iter()
    }

    pub(crate) fn records_mut(&mut self) -> &mut [PixelRecord<I>; N] {
        &mut self.pixels
    }

    /// Number of pixels on the strip.
    pub const fn len(&self) -> usize {
        N
    }

    /// Returns true for a zero-length strip.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}
