use crate::features::{normalized, sub};
use crate::landmarks::{INDEX_MCP, INDEX_TIP, LandmarkSet, PINKY_MCP, THUMB_TIP};

use super::{Gesture, HandCount, Tuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Signed image-space component of a unit vector; image y grows downwards.
    fn project(self, v: [f32; 3]) -> f32 {
        match self {
            Self::Left => -v[0],
            Self::Right => v[0],
            Self::Up => -v[1],
            Self::Down => v[1],
        }
    }
}

/// Pointing with the index finger or the whole flat hand.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalGesture {
    direction: Direction,
}

impl DirectionalGesture {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    fn score_hand(&self, hand: &LandmarkSet) -> f32 {
        let pointers = [
            sub(hand.get(INDEX_TIP), hand.get(INDEX_MCP)),
            sub(hand.get(THUMB_TIP), hand.get(PINKY_MCP)),
        ];
        pointers
            .into_iter()
            .map(|v| normalized(v).map_or(0.0, |u| self.direction.project(u)))
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

impl Gesture for DirectionalGesture {
    fn name(&self) -> &str {
        self.direction.as_str()
    }

    fn hands_required(&self) -> HandCount {
        HandCount::One
    }

    fn score(&self, hands: &[LandmarkSet], _tuning: &Tuning) -> Vec<f32> {
        hands.iter().map(|h| self.score_hand(h)).collect()
    }
}
