//! Best-match classification of the hands in one frame.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use serde::Serialize;

use crate::gestures::{Registry, Tuning};
use crate::landmarks::LandmarkSet;

/// Winning gesture for a single hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub gesture: String,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    registry: Arc<Registry>,
    threshold: f32,
    tuning: Tuning,
}

impl Classifier {
    pub fn new(registry: Arc<Registry>, threshold: f32, tuning: Tuning) -> Self {
        Self {
            registry,
            threshold,
            tuning,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Per-hand winner. A gesture must beat the threshold and every earlier
    /// gesture strictly, so the first registered gesture wins a tie.
    pub fn classify_hands(&self, hands: &[LandmarkSet]) -> Vec<Option<Match>> {
        let mut best_score = vec![self.threshold; hands.len()];
        let mut best: Vec<Option<&str>> = vec![None; hands.len()];

        for gesture in self.registry.iter() {
            let scores = gesture.score(hands, &self.tuning);
            debug_assert_eq!(scores.len(), hands.len(), "scorer '{}'", gesture.name());
            for (i, score) in scores.into_iter().enumerate() {
                if score > best_score[i] {
                    best_score[i] = score;
                    best[i] = Some(gesture.name());
                }
            }
        }

        best.into_iter()
            .zip(best_score)
            .map(|(name, score)| {
                name.map(|n| Match {
                    gesture: n.to_string(),
                    score,
                })
            })
            .collect()
    }

    /// Names recognized in this frame; hands agreeing on a gesture collapse into one entry.
    pub fn classify(&self, hands: &[LandmarkSet]) -> BTreeSet<String> {
        self.classify_hands(hands)
            .into_iter()
            .flatten()
            .map(|m| m.gesture)
            .collect()
    }
}

/// Runs one [`Classifier`] per registry and unions what they recognize, so a
/// movement gesture never shadows a command or spell held at the same time.
#[derive(Debug, Clone, Default)]
pub struct Recognizer {
    stages: Vec<(String, Classifier)>,
}

impl Recognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, classifier: Classifier) -> Self {
        self.push(name, classifier);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, classifier: Classifier) {
        self.stages.push((name.into(), classifier));
    }

    pub fn stages(&self) -> impl Iterator<Item = (&str, &Classifier)> {
        self.stages.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Per-hand winners of every registry, keyed by registry name.
    pub fn classify_hands(&self, hands: &[LandmarkSet]) -> BTreeMap<String, Vec<Option<Match>>> {
        self.stages
            .iter()
            .map(|(name, c)| (name.clone(), c.classify_hands(hands)))
            .collect()
    }

    pub fn classify(&self, hands: &[LandmarkSet]) -> BTreeSet<String> {
        self.stages
            .iter()
            .flat_map(|(_, c)| c.classify(hands))
            .collect()
    }
}
