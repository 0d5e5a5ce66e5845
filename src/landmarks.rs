//! Hand landmark sets as produced by the tracker, one per detected hand.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

#[derive(Debug, Error, PartialEq)]
pub enum LandmarkError {
    #[error("hand landmark set must hold {LANDMARK_COUNT} points, got {0}")]
    WrongLength(usize),
}

/// One tracked joint, image-normalized (x right, y down, z towards the camera).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Landmark {
    fn from(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl From<Landmark> for [f32; 3] {
    fn from(l: Landmark) -> Self {
        l.to_array()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// The four long fingers (no thumb).
    pub const LONG: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// MCP, PIP, DIP, TIP indices. For the thumb this is CMC, MCP, IP, TIP.
    pub fn joints(self) -> [usize; 4] {
        match self {
            Finger::Thumb => [THUMB_CMC, THUMB_MCP, THUMB_IP, THUMB_TIP],
            Finger::Index => [INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP],
            Finger::Middle => [MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP],
            Finger::Ring => [RING_MCP, RING_PIP, RING_DIP, RING_TIP],
            Finger::Pinky => [PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP],
        }
    }

    pub fn tip(self) -> usize {
        self.joints()[3]
    }

    pub fn mcp(self) -> usize {
        self.joints()[0]
    }
}

/// Exactly 21 joints of a single hand for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct LandmarkSet {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn from_slice(points: &[Landmark]) -> Result<Self, LandmarkError> {
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::WrongLength(points.len()))?;
        Ok(Self { points })
    }

    pub fn get(&self, joint: usize) -> Landmark {
        self.points[joint]
    }

    pub fn wrist(&self) -> Landmark {
        self.points[WRIST]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// The four joints of `finger`, palm side first.
    pub fn finger(&self, finger: Finger) -> [Landmark; 4] {
        finger.joints().map(|j| self.points[j])
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(v: Vec<Landmark>) -> Result<Self, Self::Error> {
        Self::from_slice(&v)
    }
}

impl From<LandmarkSet> for Vec<Landmark> {
    fn from(s: LandmarkSet) -> Self {
        s.points.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_sets() {
        let pts = vec![Landmark::default(); 20];
        assert_eq!(
            LandmarkSet::from_slice(&pts),
            Err(LandmarkError::WrongLength(20))
        );
    }

    #[test]
    fn parses_from_json_triples() {
        let json = serde_json::to_string(&vec![[0.5f32, 0.25, 0.0]; 21]).unwrap();
        let set: LandmarkSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set.wrist(), Landmark::new(0.5, 0.25, 0.0));

        let short = serde_json::to_string(&vec![[0.0f32; 3]; 5]).unwrap();
        assert!(serde_json::from_str::<LandmarkSet>(&short).is_err());
    }

    #[test]
    fn finger_joint_order_is_palm_to_tip() {
        assert_eq!(Finger::Index.joints(), [5, 6, 7, 8]);
        assert_eq!(Finger::Pinky.tip(), PINKY_TIP);
        assert_eq!(Finger::Middle.mcp(), MIDDLE_MCP);
    }
}
