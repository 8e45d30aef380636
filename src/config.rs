//! Runtime configuration for the controller.

use crate::animation::ColorCorrection;
use crate::time::TimeDuration;

/// Default maximum number of payload records accepted in one frame.
pub const DEFAULT_MAX_PAYLOADS: u16 = 500;

/// Default full on/off blink cycle in milliseconds.
pub const DEFAULT_BLINK_PERIOD_MS: u64 = 800;

/// Default pulse fade-out duration in milliseconds.
pub const DEFAULT_PULSE_DECAY_MS: u64 = 1000;

/// Default minimum time between two flushes to the strip (~60 FPS).
pub const DEFAULT_MIN_PUSH_INTERVAL_MS: u64 = 16;

/// When decoded commands reach the pixel store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApplyPolicy {
    /// Apply each payload as soon as its bytes are complete. A frame with a
    /// bad checksum still leaves its commands in effect, and the unseen-Solid
    /// sweep runs whatever the checksum outcome.
    #[default]
    Streaming,

    /// Buffer the frame's commands and apply them, together with the sweep,
    /// only if the checksum matches. A corrupt frame changes nothing.
    CommitOnValidChecksum,
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Blink period of zero milliseconds.
    ZeroBlinkPeriod,

    /// Pulse decay of zero milliseconds.
    ZeroPulseDecay,

    /// Maximum payloads per frame of zero.
    ZeroMaxPayloads,

    /// Stale-frame timeout of zero milliseconds.
    ZeroFrameTimeout,

    /// `CommitOnValidChecksum` selected with a commit buffer capacity of zero.
    NoCommitBuffer,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroBlinkPeriod => write!(f, "blink period must be non-zero"),
            ConfigError::ZeroPulseDecay => write!(f, "pulse decay must be non-zero"),
            ConfigError::ZeroMaxPayloads => {
                write!(f, "maximum payloads per frame must be non-zero")
            }
            ConfigError::ZeroFrameTimeout => write!(f, "frame timeout must be non-zero"),
            ConfigError::NoCommitBuffer => {
                write!(f, "commit-on-valid-checksum needs a non-zero commit buffer")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Controller configuration.
///
/// The pixel count is not part of this struct: it is the const generic `N`
/// of [`PixelStore`](crate::PixelStore) and [`Controller`](crate::Controller).
///
/// # Example
///
/// ```
/// use strip_link::{ApplyPolicy, ColorCorrection, ControllerConfig, TimeDuration};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// struct Ms(u64);
///
/// impl TimeDuration for Ms {
///     const ZERO: Self = Ms(0);
///     fn as_millis(&self) -> u64 { self.0 }
///     fn from_millis(millis: u64) -> Self { Ms(millis) }
/// }
///
/// let config = ControllerConfig::<Ms>::default()
///     .with_blink_period(Ms(500))
///     .with_color_correction(ColorCorrection::Gamma)
///     .with_apply_policy(ApplyPolicy::CommitOnValidChecksum)
///     .validate()
///     .unwrap();
///
/// assert_eq!(config.blink_period, Ms(500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig<D: TimeDuration> {
    /// Largest declared payload count accepted in a frame.
    pub max_payloads: u16,

    /// Full blink cycle (on half plus off half).
    pub blink_period: D,

    /// Time for a pulse to fade to black.
    pub pulse_decay: D,

    /// Minimum interval between flushes to the strip.
    pub min_push_interval: D,

    /// Post-processing applied to every rendered color.
    pub color_correction: ColorCorrection,

    /// When decoded commands are applied.
    pub apply_policy: ApplyPolicy,

    /// Idle time after which a half-received frame is dropped.
    ///
    /// `None` waits forever for the rest of the frame.
    pub frame_timeout: Option<D>,
}

impl<D: TimeDuration> Default for ControllerConfig<D> {
    fn default() -> Self {
        Self {
            max_payloads: DEFAULT_MAX_PAYLOADS,
            blink_period: D::from_millis(DEFAULT_BLINK_PERIOD_MS),
            pulse_decay: D::from_millis(DEFAULT_PULSE_DECAY_MS),
            min_push_interval: D::from_millis(DEFAULT_MIN_PUSH_INTERVAL_MS),
            color_correction: ColorCorrection::Identity,
            apply_policy: ApplyPolicy::Streaming,
            frame_timeout: None,
        }
    }
}

impl<D: TimeDuration> ControllerConfig<D> {
    /// Sets the maximum payloads per frame.
    pub fn with_max_payloads(mut self, max_payloads: u16) -> Self {
        self.max_payloads = max_payloads;
        self
    }

    /// Sets the blink period.
    pub fn with_blink_period(mut self, period: D) -> Self {
        self.blink_period = period;
        self
    }

    /// Sets the pulse decay duration.
    pub fn with_pulse_decay(mut self, decay: D) -> Self {
        self.pulse_decay = decay;
        self
    }

    /// Sets the minimum push interval.
    pub fn with_min_push_interval(mut self, interval: D) -> Self {
        self.min_push_interval = interval;
        self
    }

    /// Sets the color correction stage.
    pub fn with_color_correction(mut self, correction: ColorCorrection) -> Self {
        self.color_correction = correction;
        self
    }

    /// Sets the apply policy.
    pub fn with_apply_policy(mut self, policy: ApplyPolicy) -> Self {
        self.apply_policy = policy;
        self
    }

    /// Sets the stale-frame timeout.
    pub fn with_frame_timeout(mut self, timeout: Option<D>) -> Self {
        self.frame_timeout = timeout;
        self
    }

    /// Checks the configuration and returns it unchanged if valid.
    ///
    /// # Errors
    /// * `ZeroBlinkPeriod` - `blink_period` is zero
    /// * `ZeroPulseDecay` - `pulse_decay` is zero
    /// * `ZeroMaxPayloads` - `max_payloads` is zero
    /// * `ZeroFrameTimeout` - `frame_timeout` is `Some` zero duration
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.blink_period.as_millis() == 0 {
            return Err(ConfigError::ZeroBlinkPeriod);
        }
        if self.pulse_decay.as_millis() == 0 {
            return Err(ConfigError::ZeroPulseDecay);
        }
        if self.max_payloads == 0 {
            return Err(ConfigError::ZeroMaxPayloads);
        }
        if self.frame_timeout.is_some_and(|t| t.as_millis() == 0) {
            return Err(ConfigError::ZeroFrameTimeout);
        }
        Ok(self)
    }
}
