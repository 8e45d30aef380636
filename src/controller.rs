//! The render loop tying input, parser, animation and output together.
//!
//! Provides [`Controller`], which owns the pixel store and drives one
//! cooperative loop: drain input bytes, render every pixel, push to the strip
//! no more often than the configured interval. Also defines the [`LedStrip`]
//! and [`ByteSource`] traits for hardware abstraction.

use crate::animation::AnimationEngine;
use crate::config::{ConfigError, ControllerConfig};
use crate::parser::{FrameEvent, FrameParser};
use crate::store::PixelStore;
use crate::time::{TimeDuration, TimeInstant, TimeSource, millis_since};
use crate::types::BLACK;
use palette::Srgb;

/// Trait for abstracting the LED strip hardware.
///
/// Implement this for your strip driver (WS2812 over SPI/RMT/PIO, APA102,
/// etc.). Writes go to a buffer; nothing reaches the LEDs until `flush`.
/// Handle any hardware errors internally - these methods cannot fail.
pub trait LedStrip {
    /// Sets the buffered color of one pixel.
    fn set_pixel(&mut self, index: usize, color: Srgb<u8>);

    /// Sends all buffered colors to the hardware.
    fn flush(&mut self);
}

/// Trait for a non-blocking byte input such as a UART receive queue.
pub trait ByteSource {
    /// Returns the next received byte, or `None` if nothing is pending.
    ///
    /// Must never block.
    fn read_byte(&mut self) -> Option<u8>;
}

impl<const N: usize> ByteSource for heapless::Deque<u8, N> {
    fn read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

/// What happened during one [`Controller::poll`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollOutcome {
    /// Bytes taken from the source.
    pub bytes_consumed: usize,
    /// Frames completed or rejected, including stale resets.
    pub frames: usize,
    /// The last frame event seen, if any.
    pub last_event: Option<FrameEvent>,
    /// Pulses that decayed to off during rendering.
    pub expired_pulses: usize,
    /// Whether the rendered frame was pushed to the strip.
    pub pushed: bool,
}

/// Drives an LED strip from a byte stream.
///
/// Single-threaded and cooperative: every call to [`poll`](Self::poll) does a
/// bounded amount of work and never blocks, so it can share a superloop or an
/// executor task with other work.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `T` - Time source implementation type
/// * `S` - LED strip implementation type
/// * `B` - Byte source implementation type
/// * `N` - Number of pixels on the strip
/// * `P` - Commit buffer capacity of the parser (see [`FrameParser`])
pub struct Controller<'t, I, T, S, B, const N: usize, const P: usize>
where
    I: TimeInstant,
    T: TimeSource<I>,
    S: LedStrip,
    B: ByteSource,
{
    strip: S,
    source: B,
    time_source: &'t T,
    store: PixelStore<I, N>,
    parser: FrameParser<I, P>,
    engine: AnimationEngine,
    config: ControllerConfig<I::Duration>,
    frame: [Srgb<u8>; N],
    last_push: I,
}

impl<'t, I, T, S, B, const N: usize, const P: usize> Controller<'t, I, T, S, B, N, P>
where
    I: TimeInstant,
    T: TimeSource<I>,
    S: LedStrip,
    B: ByteSource,
{
    /// Creates a controller, blanks the strip and flushes it once.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found in `config`, or
    /// `NoCommitBuffer` if the commit policy is selected with `P == 0`.
    pub fn new(
        mut strip: S,
        source: B,
        time_source: &'t T,
        config: ControllerConfig<I::Duration>,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let parser = FrameParser::from_config(&config)?;
        let now = time_source.now();

        for index in 0..N {
            strip.set_pixel(index, BLACK);
        }
        strip.flush();

        #[cfg(feature = "defmt")]
        defmt::info!(
            "controller ready: {} pixels, max {} payloads/frame, {}",
            N,
            config.max_payloads,
            config.apply_policy
        );

        Ok(Self {
            strip,
            source,
            time_source,
            store: PixelStore::new(now),
            parser,
            engine: AnimationEngine::from_config(&config),
            config,
            frame: [BLACK; N],
            last_push: now,
        })
    }

    /// Runs one loop iteration.
    ///
    /// 1. Drops a stalled frame if the timeout is configured and has elapsed.
    /// 2. Drains every available byte into the parser.
    /// 3. Renders all pixels at the current time.
    /// 4. Pushes the frame to the strip if the push interval has elapsed.
    pub fn poll(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        let now = self.time_source.now();

        if let Some(event) = self.parser.poll_timeout(&mut self.store, now) {
            outcome.frames += 1;
            outcome.last_event = Some(event);
        }

        while let Some(byte) = self.source.read_byte() {
            outcome.bytes_consumed += 1;
            if let Some(event) = self.parser.push_byte(byte, &mut self.store, now) {
                outcome.frames += 1;
                outcome.last_event = Some(event);
            }
        }

        let now = self.time_source.now();
        outcome.expired_pulses = self.engine.render(&mut self.store, now, &mut self.frame);

        let interval_ms = self.config.min_push_interval.as_millis();
        if millis_since(now, self.last_push) >= interval_ms {
            self.push();
            self.last_push = now;
            outcome.pushed = true;
        }

        outcome
    }

    /// Polls forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    fn push(&mut self) {
        for (index, color) in self.frame.iter().enumerate() {
            self.strip.set_pixel(index, *color);
        }
        self.strip.flush();
    }

    /// The pixel store.
    pub fn store(&self) -> &PixelStore<I, N> {
        &self.store
    }

    /// The frame parser.
    pub fn parser(&self) -> &FrameParser<I, P> {
        &self.parser
    }

    /// Colors computed by the most recent poll.
    pub fn frame(&self) -> &[Srgb<u8>; N] {
        &self.frame
    }

    /// The validated configuration.
    pub fn config(&self) -> &ControllerConfig<I::Duration> {
        &self.config
    }

    /// The LED strip.
    pub fn strip(&self) -> &S {
        &self.strip
    }

    /// Mutable access to the byte source, e.g. to enqueue received bytes.
    pub fn source_mut(&mut self) -> &mut B {
        &mut self.source
    }

    /// Decomposes the controller into its strip and byte source.
    pub fn into_parts(self) -> (S, B) {
        (self.strip, self.source)
    }
}
