//! Menu commands: `play` and `shop` are single-hand shapes, `pause` and `exit` need
//! both hands in frame.

use crate::features::{
    curl_score, distance, dot, finger_extension, is_curled, is_extended, normalized, sub,
};
use crate::landmarks::{Finger, LandmarkSet, WRIST};

use super::{Gesture, HandCount, Tuning, clamp01, split_left_right, zeros};

/// Thumb, index and middle tips spread into a triangle, ring and pinky folded.
#[derive(Debug, Clone, Copy)]
pub struct PlayGesture;

impl PlayGesture {
    fn score_hand(hand: &LandmarkSet, tuning: &Tuning) -> f32 {
        let tips = [Finger::Thumb, Finger::Index, Finger::Middle].map(|f| hand.get(f.tip()));
        let sides = [
            distance(tips[0], tips[1]),
            distance(tips[1], tips[2]),
            distance(tips[2], tips[0]),
        ];
        let mean = sides.iter().sum::<f32>() / 3.0;
        let deviation = sides.iter().map(|d| (d - mean).abs()).sum::<f32>() / 3.0;
        let triangle = 1.0 - deviation;

        let curl = [Finger::Ring, Finger::Pinky]
            .iter()
            .map(|f| curl_score(&hand.finger(*f)))
            .sum::<f32>()
            / 2.0;

        clamp01(tuning.shape_weight * triangle + (1.0 - tuning.shape_weight) * curl)
    }
}

impl Gesture for PlayGesture {
    fn name(&self) -> &str {
        "play"
    }

    fn hands_required(&self) -> HandCount {
        HandCount::One
    }

    fn score(&self, hands: &[LandmarkSet], tuning: &Tuning) -> Vec<f32> {
        hands.iter().map(|h| Self::score_hand(h, tuning)).collect()
    }
}

/// "OK" sign: thumb and index tips closed into a ring, the other three fingers open.
#[derive(Debug, Clone, Copy)]
pub struct ShopGesture;

impl ShopGesture {
    fn score_hand(hand: &LandmarkSet, tuning: &Tuning) -> f32 {
        let gap = distance(hand.get(Finger::Thumb.tip()), hand.get(Finger::Index.tip()));
        let closeness = if tuning.circle_range > 0.0 {
            clamp01(1.0 - gap / tuning.circle_range)
        } else {
            0.0
        };

        let wrist = hand.get(WRIST);
        let open = [Finger::Middle, Finger::Ring, Finger::Pinky]
            .iter()
            .filter(|f| distance(hand.get(f.tip()), wrist) > tuning.open_reach)
            .count();
        let extension = open as f32 / 3.0;

        clamp01(tuning.shape_weight * closeness + (1.0 - tuning.shape_weight) * extension)
    }
}

impl Gesture for ShopGesture {
    fn name(&self) -> &str {
        "shop"
    }

    fn hands_required(&self) -> HandCount {
        HandCount::One
    }

    fn score(&self, hands: &[LandmarkSet], tuning: &Tuning) -> Vec<f32> {
        hands.iter().map(|h| Self::score_hand(h, tuning)).collect()
    }
}

/// Time-out "T": flat hands, one across the other.
#[derive(Debug, Clone, Copy)]
pub struct PauseGesture;

impl PauseGesture {
    fn score_pair(left: &LandmarkSet, right: &LandmarkSet, tuning: &Tuning) -> f32 {
        let pose = [left, right]
            .iter()
            .flat_map(|h| Finger::LONG.map(|f| finger_extension(h, f)))
            .sum::<f32>()
            / 8.0;

        let edge = |h: &LandmarkSet| normalized(sub(h.get(Finger::Pinky.tip()), h.get(WRIST)));
        let relation = match (edge(left), edge(right)) {
            (Some(a), Some(b)) => 1.0 - dot(a, b).abs().min(1.0),
            _ => 0.0,
        };

        let w = tuning.pause_pose_weight;
        clamp01(w * pose + (1.0 - w) * relation)
    }
}

impl Gesture for PauseGesture {
    fn name(&self) -> &str {
        "pause"
    }

    fn hands_required(&self) -> HandCount {
        HandCount::Two
    }

    fn score(&self, hands: &[LandmarkSet], tuning: &Tuning) -> Vec<f32> {
        let [a, b] = hands else {
            return zeros(hands.len());
        };
        let (left, right) = split_left_right(a, b);
        vec![Self::score_pair(left, right, tuning); 2]
    }
}

/// Both hands framing a rectangle with thumbs and index fingers.
#[derive(Debug, Clone, Copy)]
pub struct ExitGesture;

impl ExitGesture {
    fn frame_pose(hand: &LandmarkSet, tuning: &Tuning) -> f32 {
        let wrist = Some(hand.wrist());
        let mut hits = 0;
        for f in [Finger::Thumb, Finger::Index] {
            if is_extended(&hand.finger(f), wrist, tuning.extension_threshold) {
                hits += 1;
            }
        }
        for f in [Finger::Middle, Finger::Ring, Finger::Pinky] {
            if is_curled(&hand.finger(f), tuning.curl_threshold) {
                hits += 1;
            }
        }
        hits as f32 / 5.0
    }

    fn score_pair(left: &LandmarkSet, right: &LandmarkSet, tuning: &Tuning) -> f32 {
        let a = left.get(Finger::Index.tip());
        let b = right.get(Finger::Index.tip());
        let c = right.get(Finger::Thumb.tip());
        let d = left.get(Finger::Thumb.tip());

        let mismatch = |p: f32, q: f32| {
            let m = p.max(q);
            if m > 0.0 { (p - q).abs() / m } else { 0.0 }
        };
        let closure = 1.0
            - (mismatch(distance(a, b), distance(c, d)) + mismatch(distance(b, c), distance(d, a)))
                / 2.0;
        let pose = (Self::frame_pose(left, tuning) + Self::frame_pose(right, tuning)) / 2.0;

        let w = tuning.exit_closure_weight;
        clamp01(w * closure + (1.0 - w) * pose)
    }
}

impl Gesture for ExitGesture {
    fn name(&self) -> &str {
        "exit"
    }

    fn hands_required(&self) -> HandCount {
        HandCount::Two
    }

    fn score(&self, hands: &[LandmarkSet], tuning: &Tuning) -> Vec<f32> {
        let [a, b] = hands else {
            return zeros(hands.len());
        };
        let (left, right) = split_left_right(a, b);
        vec![Self::score_pair(left, right, tuning); 2]
    }
}
