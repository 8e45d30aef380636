//! Integration tests for AnimationEngine rendering over time

mod common;
use common::*;

use palette::Srgb;
use strip_link::{
    AnimationEngine, ColorCorrection, Command, PixelState, PixelStore, gamma8, pulse_amplitude,
};

const BLINK_MS: u64 = 800;
const DECAY_MS: u64 = 1000;

fn engine() -> AnimationEngine {
    AnimationEngine::new(BLINK_MS, DECAY_MS, ColorCorrection::Identity)
}

/// Store with a single command applied inside a frame at `at`
fn store_with<const N: usize>(command: Command, at: u64) -> PixelStore<TestInstant, N> {
    let mut store = PixelStore::new(TestInstant(0));
    store.begin_frame();
    store.apply_command(command, TestInstant(at));
    store.end_frame(true, TestInstant(at));
    store
}

fn render_at<const N: usize>(
    engine: &AnimationEngine,
    store: &mut PixelStore<TestInstant, N>,
    at: u64,
) -> ([Srgb<u8>; N], usize) {
    let mut frame = [BLACK; N];
    let expired = engine.render(store, TestInstant(at), &mut frame);
    (frame, expired)
}

#[test]
fn off_and_solid_are_time_independent() {
    let engine = engine();
    let mut store = store_with::<2>(Command::new(1, PixelState::Solid, GREEN), 0);

    for t in [0, 1, 399, 400, 10_000, 1_000_000] {
        let (frame, expired) = render_at(&engine, &mut store, t);
        assert_eq!(frame[0], BLACK);
        assert_eq!(frame[1], GREEN);
        assert_eq!(expired, 0);
    }
}

#[test]
fn blink_has_half_duty_across_periods() {
    let engine = engine();
    let start = 100;
    let mut store = store_with::<1>(Command::new(0, PixelState::Blink, RED), start);

    // (offset from start, lit)
    let cases = [
        (0, true),
        (399, true),
        (400, false),
        (799, false),
        (800, true),
        (1199, true),
        (1200, false),
        (1999, true),
        (2000, false),
    ];

    for (offset, lit) in cases {
        let (frame, _) = render_at(&engine, &mut store, start + offset);
        let expected = if lit { RED } else { BLACK };
        assert_eq!(frame[0], expected, "blink at +{offset} ms");
    }

    // Blinking never ends by itself
    assert_eq!(store.get(0).unwrap().state, PixelState::Blink);
}

#[test]
fn blink_phase_restarts_when_rewritten() {
    let engine = engine();
    let mut store = store_with::<1>(Command::new(0, PixelState::Blink, RED), 0);

    // At t=500 the first phase is dark
    let (frame, _) = render_at(&engine, &mut store, 500);
    assert_eq!(frame[0], BLACK);

    store.begin_frame();
    store.apply_command(Command::new(0, PixelState::Blink, RED), TestInstant(500));
    store.end_frame(true, TestInstant(500));

    let (frame, _) = render_at(&engine, &mut store, 500);
    assert_eq!(frame[0], RED);
}

#[test]
fn pulse_follows_cosine_decay() {
    let engine = engine();
    let mut store = store_with::<1>(Command::new(0, PixelState::Pulse, WHITE), 0);

    let (frame, _) = render_at(&engine, &mut store, 0);
    assert_eq!(frame[0], WHITE);

    // 0.5 * (1 + cos(pi / 4)) = 0.8536
    let (frame, _) = render_at(&engine, &mut store, 250);
    assert!(colors_close(frame[0], Srgb::new(217, 217, 217), 1));

    // 0.5 * (1 + cos(3pi / 4)) = 0.1464
    let (frame, _) = render_at(&engine, &mut store, 750);
    assert!(colors_close(frame[0], Srgb::new(37, 37, 37), 1));

    let (frame, expired) = render_at(&engine, &mut store, 999);
    assert!(frame[0].red <= 1);
    assert_eq!(expired, 0);
    assert_eq!(store.get(0).unwrap().state, PixelState::Pulse);
}

#[test]
fn pulse_brightness_never_increases() {
    let mut previous = f32::INFINITY;
    for elapsed in (0..=DECAY_MS).step_by(10) {
        let amplitude = pulse_amplitude(elapsed, DECAY_MS);
        assert!((0.0..=1.0).contains(&amplitude));
        assert!(amplitude <= previous);
        previous = amplitude;
    }
    assert_eq!(pulse_amplitude(DECAY_MS, DECAY_MS), 0.0);
}

#[test]
fn pulse_turns_itself_off_after_decay() {
    let engine = engine();
    let mut store = store_with::<2>(Command::new(1, PixelState::Pulse, BLUE), 200);

    let (frame, expired) = render_at(&engine, &mut store, 200 + DECAY_MS);
    assert_eq!(frame[1], BLACK);
    assert_eq!(expired, 1);

    let pixel = store.get(1).unwrap();
    assert_eq!(pixel.state, PixelState::Off);
    assert_eq!(pixel.base_color, BLACK);

    // Already off; nothing left to expire
    let (_, expired) = render_at(&engine, &mut store, 5000);
    assert_eq!(expired, 0);
}

#[test]
fn pulse_survives_frames_that_omit_it() {
    let engine = engine();
    let mut store = store_with::<2>(Command::new(0, PixelState::Pulse, RED), 0);

    // An empty frame sweeps only solids
    store.begin_frame();
    store.end_frame(true, TestInstant(100));

    let (frame, _) = render_at(&engine, &mut store, 100);
    assert_eq!(store.get(0).unwrap().state, PixelState::Pulse);
    assert!(frame[0].red > 200);
}

#[test]
fn gamma_correction_applies_after_animation() {
    let engine = AnimationEngine::new(BLINK_MS, DECAY_MS, ColorCorrection::Gamma);
    let mut store = store_with::<2>(Command::new(0, PixelState::Solid, Srgb::new(128, 255, 0)), 0);
    store.apply_command(Command::new(1, PixelState::Blink, Srgb::new(64, 64, 64)), TestInstant(0));

    let (frame, _) = render_at(&engine, &mut store, 0);
    assert_eq!(frame[0], Srgb::new(56, 255, 0));
    assert_eq!(frame[1], Srgb::new(gamma8(64), gamma8(64), gamma8(64)));

    // Dark half of the blink stays black after correction
    let (frame, _) = render_at(&engine, &mut store, 400);
    assert_eq!(frame[1], BLACK);
}

#[test]
fn gamma_curve_endpoints_and_monotonicity() {
    assert_eq!(gamma8(0), 0);
    assert_eq!(gamma8(255), 255);

    let mut previous = 0;
    for channel in 0..=255u8 {
        let corrected = gamma8(channel);
        assert!(corrected >= previous);
        assert!(corrected <= channel);
        previous = corrected;
    }
}
