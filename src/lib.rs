#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`FrameParser`**: Byte-at-a-time state machine that validates framing and checksum
//!   and turns payload records into pixel commands
//! - **`PixelStore`**: Fixed array of per-pixel animation state (`Off`, `Solid`, `Blink`, `Pulse`)
//! - **`AnimationEngine`**: Renders the store into colors for a given instant
//! - **`Controller`**: The render loop; drains input, renders, pushes with a frame guard
//! - **`LedStrip`**: Trait to implement for your strip driver
//! - **`ByteSource`**: Trait to implement for your non-blocking serial input
//! - **`TimeSource`**: Trait to implement for your timing system
//! - **`ControllerConfig`**: Timing, limits, gamma and apply policy
//!
//! Colors are `Srgb<u8>` end to end, matching the 8-bit channels on the wire and on the strip.

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;

pub mod animation;
pub mod command;
pub mod config;
pub mod controller;
pub mod parser;
pub mod protocol;
pub mod store;
pub mod time;
pub mod types;

pub use animation::{AnimationEngine, ColorCorrection, Rendered, gamma8, pulse_amplitude};
pub use command::Command;
pub use config::{ApplyPolicy, ConfigError, ControllerConfig};
pub use controller::{ByteSource, Controller, LedStrip, PollOutcome};
pub use parser::{FrameError, FrameEvent, FrameParser, FrameStats, ParserState, StreamingParser};
pub use protocol::{EncodeError, FrameBuilder, HEADER_A, HEADER_B, PAYLOAD_LEN, checksum};
pub use store::PixelStore;
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use types::{BLACK, PixelRecord, PixelState};
