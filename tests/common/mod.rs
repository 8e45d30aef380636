//! Shared test infrastructure for strip-link integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use heapless::Vec;
use palette::Srgb;
use strip_link::{Command, FrameBuilder, LedStrip, TimeDuration, TimeInstant, TimeSource};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0.saturating_sub(earlier.0))
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock LED Strip
// ============================================================================

/// Mock strip that keeps a buffered and a flushed copy of every pixel
pub struct MockStrip<const N: usize> {
    buffer: [Srgb<u8>; N],
    shown: [Srgb<u8>; N],
    flush_count: usize,
}

impl<const N: usize> MockStrip<N> {
    pub fn new() -> Self {
        // Start white so the initial blanking is observable
        Self {
            buffer: [WHITE; N],
            shown: [WHITE; N],
            flush_count: 0,
        }
    }

    /// Colors as of the last flush
    pub fn shown(&self) -> &[Srgb<u8>; N] {
        &self.shown
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count
    }
}

impl<const N: usize> LedStrip for MockStrip<N> {
    fn set_pixel(&mut self, index: usize, color: Srgb<u8>) {
        self.buffer[index] = color;
    }

    fn flush(&mut self) {
        self.shown = self.buffer;
        self.flush_count += 1;
    }
}

// ============================================================================
// Colors
// ============================================================================

pub use strip_link::BLACK;

pub const RED: Srgb<u8> = Srgb::new(255, 0, 0);
pub const GREEN: Srgb<u8> = Srgb::new(0, 255, 0);
pub const BLUE: Srgb<u8> = Srgb::new(0, 0, 255);
pub const WHITE: Srgb<u8> = Srgb::new(255, 255, 255);

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Encode a frame carrying the given commands
pub fn encode(commands: &[Command]) -> Vec<u8, 512> {
    let mut builder = FrameBuilder::<512>::new();
    for command in commands {
        builder = builder.command(*command).unwrap();
    }
    builder.build().unwrap()
}

/// Encode a frame, then replace its checksum with a wrong one
pub fn encode_corrupt(commands: &[Command]) -> Vec<u8, 512> {
    let mut frame = encode(commands);
    let last = frame.len() - 1;
    frame[last] = frame[last].wrapping_add(1);
    frame
}

/// Compare two colors channel by channel with a tolerance
pub fn colors_close(a: Srgb<u8>, b: Srgb<u8>, tolerance: u8) -> bool {
    a.red.abs_diff(b.red) <= tolerance
        && a.green.abs_diff(b.green) <= tolerance
        && a.blue.abs_diff(b.blue) <= tolerance
}
