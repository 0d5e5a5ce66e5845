//! Gesture scorers and the registries that group them.
//!
//! A scorer looks at every hand tracked in a frame and returns one score per hand.
//! Scorers hold no per-call state, so a registry shares them behind `Arc`s.

pub mod commands;
pub mod movement;
pub mod spells;
pub mod template;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::landmarks::LandmarkSet;

pub use commands::{ExitGesture, PauseGesture, PlayGesture, ShopGesture};
pub use movement::{Direction, DirectionalGesture};
pub use spells::PrayGesture;
pub use template::{TemplateGesture, TemplateLibrary};

/// Names accepted by [`Registry::builtin`].
pub const BUILTIN_REGISTRIES: [&str; 3] = ["movement", "commands", "spells"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandCount {
    One,
    Two,
}

/// Runtime knobs shared by every scorer of a recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub curl_threshold: f32,
    pub extension_threshold: f32,
    /// Weight of the shape term in `play` and `shop`; the finger term gets the rest.
    pub shape_weight: f32,
    /// Thumb-index distance at which `shop` closeness reaches zero.
    pub circle_range: f32,
    /// Minimum tip-to-wrist distance for a finger to count as open in `shop`.
    pub open_reach: f32,
    pub pause_pose_weight: f32,
    pub exit_closure_weight: f32,
    pub touch_distance: f32,
    pub upward_angle_deg: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            curl_threshold: 0.7,
            extension_threshold: 0.6,
            shape_weight: 0.7,
            circle_range: 0.1,
            open_reach: 0.15,
            pause_pose_weight: 0.5,
            exit_closure_weight: 0.6,
            touch_distance: 0.05,
            upward_angle_deg: 30.0,
        }
    }
}

pub trait Gesture: Send + Sync {
    fn name(&self) -> &str;

    fn hands_required(&self) -> HandCount;

    /// One score per entry of `hands`, always, including the all-zero early exits.
    fn score(&self, hands: &[LandmarkSet], tuning: &Tuning) -> Vec<f32>;
}

/// Ordered set of gestures. Order matters: the classifier keeps the first of equal scores.
#[derive(Clone, Default)]
pub struct Registry {
    gestures: Vec<Arc<dyn Gesture>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, gesture: impl Gesture + 'static) -> Self {
        self.register(Arc::new(gesture));
        self
    }

    pub fn register(&mut self, gesture: Arc<dyn Gesture>) {
        self.gestures.push(gesture);
    }

    pub fn extend(&mut self, other: &Registry) {
        self.gestures.extend(other.gestures.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Gesture>> {
        self.gestures.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.gestures.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.gestures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gestures.is_empty()
    }

    pub fn movement() -> Self {
        Self::new()
            .with(DirectionalGesture::new(Direction::Left))
            .with(DirectionalGesture::new(Direction::Right))
            .with(DirectionalGesture::new(Direction::Up))
            .with(DirectionalGesture::new(Direction::Down))
    }

    pub fn commands() -> Self {
        Self::new()
            .with(PlayGesture)
            .with(PauseGesture)
            .with(ExitGesture)
            .with(ShopGesture)
    }

    pub fn spells() -> Self {
        Self::new().with(PrayGesture)
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "movement" => Some(Self::movement()),
            "commands" => Some(Self::commands()),
            "spells" => Some(Self::spells()),
            _ => None,
        }
    }
}

pub(crate) fn zeros(n: usize) -> Vec<f32> {
    vec![0.0; n]
}

pub(crate) fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Splits two hands by which side of the frame midline their wrists are on.
/// When both wrists sit on the same side the one further left is "left".
pub(crate) fn split_left_right<'a>(
    a: &'a LandmarkSet,
    b: &'a LandmarkSet,
) -> (&'a LandmarkSet, &'a LandmarkSet) {
    let (ax, bx) = (a.wrist().x, b.wrist().x);
    match (ax < 0.5, bx < 0.5) {
        (true, false) => (a, b),
        (false, true) => (b, a),
        _ if bx < ax => (b, a),
        _ => (a, b),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::HandBuilder;
    use super::*;

    fn all_registries() -> Registry {
        let mut r = Registry::new();
        for name in BUILTIN_REGISTRIES {
            r.extend(&Registry::builtin(name).unwrap());
        }
        r.register(Arc::new(TemplateGesture::new("wave", vec![vec![1.0; 63]])));
        r
    }

    #[test]
    fn every_scorer_returns_one_score_per_hand() {
        let tuning = Tuning::default();
        let a = HandBuilder::open(0.3, 0.8).build();
        let b = HandBuilder::open(0.7, 0.8).build();
        let c = HandBuilder::open(0.5, 0.6).build();
        let frames: Vec<Vec<LandmarkSet>> = vec![
            vec![],
            vec![a.clone()],
            vec![a.clone(), b.clone()],
            vec![a, b, c],
        ];
        for g in all_registries().iter() {
            for hands in &frames {
                assert_eq!(
                    g.score(hands, &tuning).len(),
                    hands.len(),
                    "{} with {} hands",
                    g.name(),
                    hands.len()
                );
            }
        }
    }

    #[test]
    fn two_hand_gestures_are_zero_without_two_hands() {
        let tuning = Tuning::default();
        let one = vec![HandBuilder::open(0.4, 0.8).build()];
        let three = vec![one[0].clone(), one[0].clone(), one[0].clone()];
        for g in all_registries()
            .iter()
            .filter(|g| g.hands_required() == HandCount::Two)
        {
            assert_eq!(g.score(&one, &tuning), vec![0.0]);
            assert_eq!(g.score(&three, &tuning), vec![0.0; 3]);
        }
    }

    #[test]
    fn builtin_registries_keep_registration_order() {
        assert_eq!(
            Registry::movement().names(),
            vec!["left", "right", "up", "down"]
        );
        assert_eq!(
            Registry::commands().names(),
            vec!["play", "pause", "exit", "shop"]
        );
        assert!(Registry::builtin("dance").is_none());
    }

    #[test]
    fn midline_split_orders_hands() {
        let l = HandBuilder::open(0.3, 0.8).build();
        let r = HandBuilder::open(0.7, 0.8).build();
        let (a, b) = split_left_right(&r, &l);
        assert_eq!(a.wrist().x, 0.3);
        assert_eq!(b.wrist().x, 0.7);

        let r2 = HandBuilder::open(0.2, 0.8).build();
        let (a, _) = split_left_right(&l, &r2);
        assert_eq!(a.wrist().x, 0.2);
    }
}
