//! Gestures recorded from sample poses instead of hand-written geometry.
//!
//! Each sample is a normalized hand (see [`normalize_hand`]); a live hand scores the
//! mean cosine similarity against every sample of the template.

use std::{collections::BTreeMap, fs, path::Path, sync::Arc};

use anyhow::{Context, Result, anyhow};
use log::info;
use serde::{Deserialize, Serialize};

use crate::features::{cosine_similarity, normalize_hand};
use crate::landmarks::LandmarkSet;

use super::{Gesture, HandCount, Registry, Tuning};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateGesture {
    name: String,
    samples: Vec<Vec<f32>>,
}

impl TemplateGesture {
    pub fn new(name: impl Into<String>, samples: Vec<Vec<f32>>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    pub fn from_hands<'a>(
        name: impl Into<String>,
        hands: impl IntoIterator<Item = &'a LandmarkSet>,
    ) -> Self {
        Self::new(name, hands.into_iter().map(normalize_hand).collect())
    }

    fn score_hand(&self, hand: &LandmarkSet) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let features = normalize_hand(hand);
        self.samples
            .iter()
            .map(|s| cosine_similarity(&features, s))
            .sum::<f32>()
            / self.samples.len() as f32
    }
}

impl Gesture for TemplateGesture {
    fn name(&self) -> &str {
        &self.name
    }

    fn hands_required(&self) -> HandCount {
        HandCount::One
    }

    fn score(&self, hands: &[LandmarkSet], _tuning: &Tuning) -> Vec<f32> {
        hands.iter().map(|h| self.score_hand(h)).collect()
    }
}

/// Recorded templates keyed by name, stored as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateLibrary {
    #[serde(default)]
    gestures: BTreeMap<String, Vec<Vec<f32>>>,
}

impl TemplateLibrary {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let lib: Self = serde_json::from_str(&txt)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        for (name, samples) in &lib.gestures {
            if let Some(bad) = samples.iter().find(|s| s.len() != 63) {
                return Err(anyhow!(
                    "template '{}' has a sample of length {}, expected 63",
                    name,
                    bad.len()
                ));
            }
        }
        Ok(lib)
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("saved {} gesture templates to {}", self.gestures.len(), path.display());
        Ok(())
    }

    /// Replaces any previous recording under the same name.
    pub fn insert(&mut self, template: TemplateGesture) {
        self.gestures.insert(template.name, template.samples);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gestures.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.gestures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gestures.is_empty()
    }

    pub fn registry(&self) -> Registry {
        let mut r = Registry::new();
        for (name, samples) in &self.gestures {
            r.register(Arc::new(TemplateGesture::new(name.clone(), samples.clone())));
        }
        r
    }
}
