// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drive a gesture session with synthetic pointer input.
//!
//! This example shows how to combine:
//! - `understory_gesture` for stroke grouping and the rule cascade,
//! - `understory_gesture_learn` for a network trained in the background,
//! - `Fallback` so the rules answer until the network is ready.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_gesture_demos --example gesture_playground`

use kurbo::Point;
use tracing_subscriber::EnvFilter;
use understory_gesture::{
    Fallback, GestureKind, GestureOutcome, GestureSession, Recognizer, RuleRecognizer,
};
use understory_gesture_learn::{SyntheticGenerator, TrainableRecognizer, TrainingState};

/// Milliseconds between synthetic pointer samples.
const SAMPLE_INTERVAL: u64 = 8;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("understory_gesture=debug,understory_gesture_learn=info")
            }),
        )
        .init();

    let learned = TrainableRecognizer::new();
    let training = learned.spawn_init();
    let mut session = GestureSession::new(Fallback::new(learned.clone(), RuleRecognizer::new()));
    let mut clock = 0_u64;

    // Rules only: the network is still training.
    println!("-- rules (network {:?}) --", learned.state());
    let plus = [
        vec![Point::new(60.0, 0.0), Point::new(60.0, 120.0)],
        vec![Point::new(0.0, 60.0), Point::new(120.0, 60.0)],
    ];
    report("two-stroke plus", draw(&mut session, &mut clock, &plus));
    let check = [vec![
        Point::new(0.0, 57.0),
        Point::new(25.0, 100.0),
        Point::new(100.0, 0.0),
    ]];
    report("checkmark", draw(&mut session, &mut clock, &check));

    let state = training.map_or(learned.state(), |t| {
        t.join().unwrap_or(TrainingState::Failed)
    });
    println!("-- network {state:?} --");
    if let Some(stats) = learned.last_report().as_ref().and_then(|r| r.last().copied()) {
        println!(
            "final epoch {}: loss {:.3}, validation accuracy {:?}",
            stats.epoch, stats.train_loss, stats.validation_accuracy
        );
    }

    let mut rng = rand::rng();
    let generator = SyntheticGenerator::default();
    for kind in [GestureKind::Triangle, GestureKind::Spiral, GestureKind::Circle] {
        let stroke = generator.generate(kind, &mut rng);
        report(kind.name(), draw(&mut session, &mut clock, &[stroke.clone()]));
        // Teach the network this drawing so the next one looks more familiar.
        if learned.learn_from_example(&stroke, kind.name()) {
            println!("  learned one more {}", kind.name());
        }
    }

    // Direct use without a session.
    let loop_stroke = generator.generate(GestureKind::Loop, &mut rng);
    match session.recognizer().recognize(&loop_stroke) {
        Some(r) => println!("loop (direct): {} ({:.2})", r.name(), r.confidence),
        None => println!("loop (direct): no match"),
    }
}

/// Feed `strokes` as pointer input, then wait out the stroke gap.
fn draw<R: Recognizer>(
    session: &mut GestureSession<R>,
    clock: &mut u64,
    strokes: &[Vec<Point>],
) -> Option<GestureOutcome> {
    let mut outcome = None;
    for stroke in strokes {
        let Some((&first, rest)) = stroke.split_first() else {
            continue;
        };
        outcome = outcome.or(session.on_down(first, *clock));
        for p in dense(first, rest) {
            *clock += SAMPLE_INTERVAL;
            session.on_move(p, *clock);
        }
        *clock += SAMPLE_INTERVAL;
        let last = rest.last().copied().unwrap_or(first);
        outcome = outcome.or(session.on_up(last, *clock));
        *clock += 100;
    }
    *clock += session.config().stroke_gap;
    outcome.or(session.poll(*clock))
}

/// Interpolate sparse vertices into pointer-like samples.
fn dense(start: Point, vertices: &[Point]) -> Vec<Point> {
    let mut out = Vec::new();
    let mut prev = start;
    for &v in vertices {
        let steps = ((v - prev).hypot() / 6.0).ceil().max(1.0) as usize;
        out.extend((1..=steps).map(|k| prev.lerp(v, k as f64 / steps as f64)));
        prev = v;
    }
    out
}

fn report(label: &str, outcome: Option<GestureOutcome>) {
    match outcome {
        Some(GestureOutcome::Recognized(r)) => println!(
            "{label}: {} -> {} ({:.2})",
            r.name(),
            r.action(),
            r.confidence
        ),
        Some(GestureOutcome::Unrecognized { point_count }) => {
            println!("{label}: unrecognized ({point_count} points)");
        }
        None => println!("{label}: still waiting"),
    }
}
