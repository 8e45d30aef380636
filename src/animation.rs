//! Time-based rendering of pixel states into display colors.
//!
//! Rendering is a pure function of a pixel's state, base color and the time
//! elapsed since the state was entered. The only side effect lives in
//! [`AnimationEngine::render`]: a pulse that has fully decayed is switched to
//! `Off` in the store.

use crate::config::ControllerConfig;
use crate::store::PixelStore;
use crate::time::{TimeDuration, TimeInstant, millis_since};
use crate::types::{BLACK, PixelRecord, PixelState};
use palette::Srgb;

/// Exponent of the gamma curve.
pub const GAMMA: f32 = 2.2;

/// Post-processing stage applied to every rendered color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorCorrection {
    /// Colors are pushed as rendered.
    #[default]
    Identity,

    /// Each channel `c` becomes `round(255 * (c / 255) ^ 2.2)`.
    Gamma,
}

impl ColorCorrection {
    /// Applies the correction to a color.
    #[inline]
    pub fn apply(self, color: Srgb<u8>) -> Srgb<u8> {
        match self {
            ColorCorrection::Identity => color,
            ColorCorrection::Gamma => Srgb::new(
                gamma8(color.red),
                gamma8(color.green),
                gamma8(color.blue),
            ),
        }
    }
}

/// Gamma-corrects a single 8-bit channel.
#[inline]
pub fn gamma8(channel: u8) -> u8 {
    let normalized = f32::from(channel) / 255.0;
    let corrected = libm::roundf(libm::powf(normalized, GAMMA) * 255.0);
    corrected.clamp(0.0, 255.0) as u8
}

/// Scales every channel of `color` by `amplitude` in `[0, 1]`, truncating.
#[inline]
fn scale(color: Srgb<u8>, amplitude: f32) -> Srgb<u8> {
    let amplitude = amplitude.clamp(0.0, 1.0);
    Srgb::new(
        (f32::from(color.red) * amplitude) as u8,
        (f32::from(color.green) * amplitude) as u8,
        (f32::from(color.blue) * amplitude) as u8,
    )
}

/// Cosine ease-out used by pulses: 1 at the start, 0 at `decay_ms`.
#[inline]
pub fn pulse_amplitude(elapsed_ms: u64, decay_ms: u64) -> f32 {
    if decay_ms == 0 || elapsed_ms >= decay_ms {
        return 0.0;
    }
    let phase = elapsed_ms as f32 / decay_ms as f32;
    let amplitude = 0.5 * (1.0 + libm::cosf(phase * core::f32::consts::PI));
    amplitude.clamp(0.0, 1.0)
}

/// Result of evaluating one pixel at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rendered {
    /// Color to display, before color correction.
    pub color: Srgb<u8>,

    /// The pixel was pulsing and its decay has run out.
    pub expired: bool,
}

/// Computes display colors from the pixel store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationEngine {
    blink_period_ms: u64,
    pulse_decay_ms: u64,
    correction: ColorCorrection,
}

impl AnimationEngine {
    /// Creates an engine with explicit timing, in milliseconds.
    pub const fn new(
        blink_period_ms: u64,
        pulse_decay_ms: u64,
        correction: ColorCorrection,
    ) -> Self {
        Self {
            blink_period_ms,
            pulse_decay_ms,
            correction,
        }
    }

    /// Creates an engine from the controller configuration.
    pub fn from_config<D: TimeDuration>(config: &ControllerConfig<D>) -> Self {
        Self::new(
            config.blink_period.as_millis(),
            config.pulse_decay.as_millis(),
            config.color_correction,
        )
    }

    /// Evaluates a pixel `elapsed_ms` after it entered its state.
    ///
    /// | state | color |
    /// |---|---|
    /// | `Off` | black |
    /// | `Solid` | base color |
    /// | `Blink` | base color in the first half of each period, else black |
    /// | `Pulse` | base color scaled by the cosine ease-out, black once decayed |
    pub fn evaluate(&self, state: PixelState, base: Srgb<u8>, elapsed_ms: u64) -> Rendered {
        let color = match state {
            PixelState::Off => BLACK,
            PixelState::Solid => base,
            PixelState::Blink => {
                if self.blink_period_ms == 0 {
                    base
                } else if elapsed_ms % self.blink_period_ms < self.blink_period_ms / 2 {
                    base
                } else {
                    BLACK
                }
            }
            PixelState::Pulse => {
                if elapsed_ms >= self.pulse_decay_ms {
                    return Rendered {
                        color: BLACK,
                        expired: true,
                    };
                }
                scale(base, pulse_amplitude(elapsed_ms, self.pulse_decay_ms))
            }
        };

        Rendered {
            color,
            expired: false,
        }
    }

    /// Renders every pixel of `store` at `now` into `frame`.
    ///
    /// Pulses whose decay has elapsed are turned off in the store.
    ///
    /// # Returns
    /// The number of pulses that expired during this call.
    pub fn render<I: TimeInstant, const N: usize>(
        &self,
        store: &mut PixelStore<I, N>,
        now: I,
        frame: &mut [Srgb<u8>; N],
    ) -> usize {
        let mut expired = 0;

        for (pixel, out) in store.records_mut().iter_mut().zip(frame.iter_mut()) {
            let rendered = self.evaluate(
                pixel.state,
                pixel.base_color,
                millis_since(now, pixel.anim_start),
            );

            if rendered.expired {
                *pixel = PixelRecord::off(now);
                expired += 1;
            }

            *out = self.correction.apply(rendered.color);
        }

        expired
    }
}
