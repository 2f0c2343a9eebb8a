// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

use hashbrown::HashMap;
use kurbo::Point;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, trace, warn};
use understory_gesture::geometry::bounds;
use understory_gesture::rules::{MIN_POINTS, MIN_SIZE};
use understory_gesture::{GestureKind, Recognition, Recognizer};

use crate::synth::{Dataset, SyntheticGenerator, argmax, generate_dataset};
use crate::train::{TrainingConfig, TrainingReport, fit};
use crate::{Network, Result, preprocess};

/// Predictions less likely than this are discarded.
pub const CONFIDENCE_FLOOR: f64 = 0.4;

/// Lifecycle of a [`TrainableRecognizer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TrainingState {
    /// No training has started.
    Uninitialized = 0,
    /// Initial training or a fine-tune is running.
    Training = 1,
    /// A trained model is available.
    Ready = 2,
    /// Initial training failed; the recognizer stays unusable.
    Failed = 3,
}

impl TrainingState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Uninitialized,
            1 => Self::Training,
            2 => Self::Ready,
            _ => Self::Failed,
        }
    }
}

/// A trained network and how its training went.
struct Model {
    network: Network,
    report: TrainingReport,
}

struct Shared {
    state: AtomicU8,
    model: RwLock<Option<Model>>,
    config: TrainingConfig,
    classes: HashMap<&'static str, GestureKind>,
}

impl Shared {
    fn state(&self) -> TrainingState {
        TrainingState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: TrainingState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move from `from` to `Training`, unless someone else got there first.
    fn claim(&self, from: TrainingState) -> bool {
        self.state
            .compare_exchange(
                from as u8,
                TrainingState::Training as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Marks the recognizer failed if training unwinds.
struct FailOnUnwind<'a>(&'a Shared);

impl Drop for FailOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.set_state(TrainingState::Failed);
        }
    }
}

/// Gesture recognizer backed by a network trained on synthetic strokes.
///
/// Starts out [`Uninitialized`](TrainingState::Uninitialized) and answers
/// `None` until [`init`](Self::init) or [`spawn_init`](Self::spawn_init) has
/// finished. Clones share the same model and state, so one clone can train on
/// a background thread while others keep serving (empty) answers.
///
/// At most one training or fine-tune runs at a time. While one is running the
/// recognizer reports not ready.
#[derive(Clone)]
pub struct TrainableRecognizer {
    shared: Arc<Shared>,
}

impl fmt::Debug for TrainableRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainableRecognizer")
            .field("state", &self.state())
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl Default for TrainableRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainableRecognizer {
    /// An untrained recognizer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TrainingConfig::default())
    }

    /// An untrained recognizer.
    pub fn with_config(config: TrainingConfig) -> Self {
        let classes = GestureKind::ALL.iter().map(|k| (k.name(), *k)).collect();
        Self {
            shared: Arc::new(Shared {
                state: AtomicU8::new(TrainingState::Uninitialized as u8),
                model: RwLock::new(None),
                config,
                classes,
            }),
        }
    }

    /// The training configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.shared.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TrainingState {
        self.shared.state()
    }

    /// Per-epoch metrics of the initial training, once it has succeeded.
    pub fn last_report(&self) -> Option<TrainingReport> {
        let model = self.shared.model.read().ok()?;
        model.as_ref().map(|m| m.report.clone())
    }

    /// Train on the calling thread.
    ///
    /// Does nothing unless the recognizer is uninitialized. Returns the state
    /// afterwards: `Ready` on success, `Failed` if training failed, or the
    /// unchanged state if there was nothing to do.
    pub fn init(&self) -> TrainingState {
        if !self.shared.claim(TrainingState::Uninitialized) {
            trace!(state = ?self.state(), "init skipped");
            return self.state();
        }
        self.train_claimed()
    }

    /// Train on a background thread.
    ///
    /// Returns `None` if the recognizer is not uninitialized or the thread
    /// could not be started (the latter leaves it failed).
    pub fn spawn_init(&self) -> Option<JoinHandle<TrainingState>> {
        if !self.shared.claim(TrainingState::Uninitialized) {
            trace!(state = ?self.state(), "spawn_init skipped");
            return None;
        }
        let this = self.clone();
        match thread::Builder::new()
            .name("gesture-training".into())
            .spawn(move || this.train_claimed())
        {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(%err, "could not start training thread");
                self.shared.set_state(TrainingState::Failed);
                None
            }
        }
    }

    fn train_claimed(&self) -> TrainingState {
        let _guard = FailOnUnwind(&self.shared);
        let config = &self.shared.config;
        info!(
            classes = GestureKind::ALL.len(),
            examples_per_class = config.examples_per_class,
            epochs = config.epochs,
            "training gesture network"
        );
        let model = match train_model(config) {
            Ok(model) => model,
            Err(err) => {
                error!(%err, "gesture network training failed");
                self.shared.set_state(TrainingState::Failed);
                return TrainingState::Failed;
            }
        };
        let summary = model.report.last().copied();
        match self.shared.model.write() {
            Ok(mut slot) => *slot = Some(model),
            Err(_) => {
                error!("gesture model lock poisoned");
                self.shared.set_state(TrainingState::Failed);
                return TrainingState::Failed;
            }
        }
        self.shared.set_state(TrainingState::Ready);
        info!(
            train_loss = summary.map(|s| s.train_loss),
            validation_accuracy = summary.and_then(|s| s.validation_accuracy),
            "gesture network ready"
        );
        TrainingState::Ready
    }

    /// Nudge the model toward labeling `points` as `class_name`.
    ///
    /// Runs a few epochs on that single example. Does nothing and returns
    /// `false` if the recognizer is not ready, the class name is unknown, or
    /// there are too few points. Failed fine-tunes keep the previous weights.
    pub fn learn_from_example(&self, points: &[Point], class_name: &str) -> bool {
        let Some(&kind) = self.shared.classes.get(class_name) else {
            trace!(class_name, "fine-tune skipped: unknown class");
            return false;
        };
        if points.len() < MIN_POINTS {
            trace!(points = points.len(), "fine-tune skipped: too few points");
            return false;
        }
        if !self.shared.claim(TrainingState::Ready) {
            trace!(state = ?self.state(), "fine-tune skipped: not ready");
            return false;
        }
        let _guard = FailOnUnwind(&self.shared);
        let tuned = self.fine_tune(points, kind);
        self.shared.set_state(TrainingState::Ready);
        tuned
    }

    fn fine_tune(&self, points: &[Point], kind: GestureKind) -> bool {
        let config = &self.shared.config;
        let input = preprocess(points, config.resample_count);
        let example = match Dataset::single(input, kind.index(), GestureKind::ALL.len()) {
            Ok(example) => example,
            Err(err) => {
                warn!(%err, "fine-tune skipped");
                return false;
            }
        };
        let Ok(mut slot) = self.shared.model.write() else {
            warn!("fine-tune skipped: gesture model lock poisoned");
            return false;
        };
        let Some(model) = slot.as_mut() else {
            return false;
        };
        let tune = TrainingConfig {
            epochs: config.fine_tune_epochs,
            batch_size: 1,
            ..config.clone()
        };
        let mut network = model.network.clone();
        let mut rng = StdRng::seed_from_u64(config.seed);
        match fit(&mut network, &example, &Dataset::default(), &tune, &mut rng) {
            Ok(report) => {
                model.network = network;
                debug!(
                    gesture = kind.name(),
                    loss = report.last().map(|s| s.train_loss),
                    "fine-tuned"
                );
                true
            }
            Err(err) => {
                warn!(%err, "fine-tune failed; keeping previous weights");
                false
            }
        }
    }
}

/// Topology, synthesis, and fitting, in that order.
fn train_model(config: &TrainingConfig) -> Result<Model> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut network = config.topology().build(&mut rng)?;
    let dataset = generate_dataset(
        &SyntheticGenerator::default(),
        config.examples_per_class,
        config.resample_count,
        &mut rng,
    );
    let (train, validation) = dataset.split(config.validation_fraction);
    let report = fit(&mut network, &train, &validation, config, &mut rng)?;
    Ok(Model { network, report })
}

impl Recognizer for TrainableRecognizer {
    fn recognize(&self, points: &[Point]) -> Option<Recognition> {
        if self.state() != TrainingState::Ready {
            trace!(state = ?self.state(), "not ready");
            return None;
        }
        if points.len() < MIN_POINTS {
            return None;
        }
        let b = bounds(points);
        if b.width < MIN_SIZE && b.height < MIN_SIZE {
            return None;
        }
        // A fine-tune swapping weights in holds the write lock; skip rather than block.
        let model = self.shared.model.try_read().ok()?;
        let network = &model.as_ref()?.network;
        let probs = network
            .predict(&preprocess(points, self.shared.config.resample_count))
            .ok()?;
        let (index, p) = argmax(&probs)?;
        let kind = GestureKind::from_index(index)?;
        if p < CONFIDENCE_FLOOR {
            debug!(best = kind.name(), confidence = p, "below confidence floor");
            return None;
        }
        debug!(gesture = kind.name(), confidence = p, "network match");
        Some(Recognition::new(kind, p))
    }

    fn is_ready(&self) -> bool {
        self.state() == TrainingState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_gesture::{Fallback, RuleRecognizer};

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            resample_count: 8,
            hidden: vec![24],
            dropout: 0.0,
            epochs: 12,
            batch_size: 16,
            learning_rate: 0.01,
            examples_per_class: 5,
            fine_tune_epochs: 3,
            ..TrainingConfig::default()
        }
    }

    fn ring(n: u32, radius: f64) -> Vec<Point> {
        (0..n)
            .map(|k| {
                let a = core::f64::consts::TAU * f64::from(k) / f64::from(n);
                Point::new(radius + radius * a.cos(), radius - radius * a.sin())
            })
            .collect()
    }

    #[test]
    fn is_send_and_sync() {
        fn check<T: Send + Sync>() {}
        check::<TrainableRecognizer>();
    }

    #[test]
    fn answers_nothing_before_training() {
        let r = TrainableRecognizer::with_config(small_config());
        assert_eq!(r.state(), TrainingState::Uninitialized);
        assert!(!r.is_ready());
        assert_eq!(r.recognize(&ring(40, 50.0)), None);
        assert!(!r.learn_from_example(&ring(40, 50.0), "circle"));
        assert!(r.last_report().is_none());
    }

    #[test]
    fn init_trains_once() {
        let r = TrainableRecognizer::with_config(small_config());
        assert_eq!(r.init(), TrainingState::Ready);
        assert!(r.is_ready());
        let report = r.last_report().unwrap();
        assert_eq!(report.epochs.len(), 12);
        // Idempotent: no second run.
        assert_eq!(r.init(), TrainingState::Ready);
        assert_eq!(r.last_report(), Some(report));
        assert!(r.spawn_init().is_none());
    }

    #[test]
    fn results_stay_in_catalogue_above_floor() {
        let r = TrainableRecognizer::with_config(small_config());
        r.init();
        let generator = SyntheticGenerator::default();
        for (seed, kind) in GestureKind::ALL.into_iter().enumerate() {
            let pts = generator.generate_seeded(kind, seed as u64 + 100);
            if let Some(hit) = r.recognize(&pts) {
                assert!(GestureKind::ALL.contains(&hit.kind));
                assert!(hit.confidence >= CONFIDENCE_FLOOR);
                assert!(hit.confidence <= 1.0);
            }
        }
    }

    #[test]
    fn recognizes_held_out_synthetic_gestures() {
        let r = TrainableRecognizer::with_config(TrainingConfig {
            resample_count: 16,
            hidden: vec![48],
            dropout: 0.0,
            epochs: 40,
            batch_size: 16,
            learning_rate: 0.005,
            examples_per_class: 30,
            ..TrainingConfig::default()
        });
        assert_eq!(r.init(), TrainingState::Ready);
        let generator = SyntheticGenerator::default();
        let mut total = 0_usize;
        let mut correct = 0_usize;
        for kind in GestureKind::ALL {
            for k in 0..5 {
                let seed = 1000 + 10 * kind.index() as u64 + k;
                total += 1;
                if r.recognize(&generator.generate_seeded(kind, seed)).map(|hit| hit.kind)
                    == Some(kind)
                {
                    correct += 1;
                }
            }
        }
        assert_eq!(total, 110);
        assert!(correct >= 88, "only {correct} of {total} recognized");
    }

    #[test]
    fn recognize_skips_while_weights_are_locked() {
        let r = TrainableRecognizer::with_config(small_config());
        r.init();
        let generator = SyntheticGenerator::default();
        let circle = generator.generate_seeded(GestureKind::Circle, 3);
        let _writer = r.shared.model.write().unwrap();
        assert!(r.is_ready());
        assert_eq!(r.recognize(&circle), None);
    }

    #[test]
    fn sparse_and_tiny_input_is_ignored() {
        let r = TrainableRecognizer::with_config(small_config());
        r.init();
        assert_eq!(r.recognize(&[Point::new(0.0, 0.0), Point::new(100.0, 100.0)]), None);
        assert_eq!(r.recognize(&ring(40, 5.0)), None);
    }

    #[test]
    fn failed_training_is_terminal() {
        let r = TrainableRecognizer::with_config(TrainingConfig {
            epochs: 0,
            ..small_config()
        });
        assert_eq!(r.init(), TrainingState::Failed);
        assert_eq!(r.init(), TrainingState::Failed);
        assert!(r.spawn_init().is_none());
        assert_eq!(r.recognize(&ring(40, 50.0)), None);
        assert!(!r.learn_from_example(&ring(40, 50.0), "circle"));
    }

    #[test]
    fn background_training_becomes_ready() {
        let r = TrainableRecognizer::with_config(small_config());
        let handle = r.spawn_init().unwrap();
        // Claimed synchronously, so a second start is refused.
        assert!(r.spawn_init().is_none());
        assert_eq!(handle.join().unwrap(), TrainingState::Ready);
        assert_eq!(r.state(), TrainingState::Ready);
    }

    #[test]
    fn fine_tune_requires_known_class_and_points() {
        let r = TrainableRecognizer::with_config(small_config());
        r.init();
        let circle = ring(40, 50.0);
        assert!(!r.learn_from_example(&circle, "lasso"));
        assert!(!r.learn_from_example(&circle[..3], "circle"));
        assert_eq!(r.state(), TrainingState::Ready);

        let before = r.shared.model.read().unwrap().as_ref().unwrap().network.clone();
        assert!(r.learn_from_example(&circle, "circle"));
        assert_eq!(r.state(), TrainingState::Ready);
        let after = r.shared.model.read().unwrap().as_ref().unwrap().network.clone();
        assert_ne!(before, after);
    }

    #[test]
    fn rules_cover_for_an_untrained_network() {
        let learned = TrainableRecognizer::with_config(small_config());
        let chain = Fallback::new(learned.clone(), RuleRecognizer::new());
        let hit = chain.recognize(&ring(40, 50.0)).unwrap();
        assert_eq!(hit.kind, GestureKind::Circle);
        assert!(chain.is_ready());
        assert!(!learned.is_ready());
    }
}
