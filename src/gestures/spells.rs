use crate::features::distance;
use crate::landmarks::{Finger, LandmarkSet};

use super::{Gesture, HandCount, Tuning, clamp01, zeros};

const PIP_JOINTS: [usize; 5] = [3, 6, 10, 14, 18];
const MCP_JOINTS: [usize; 5] = [2, 5, 9, 13, 17];

/// Palms pressed together, fingers straight up. Casts the sun strike.
#[derive(Debug, Clone, Copy)]
pub struct PrayGesture;

impl PrayGesture {
    /// Fraction of fingers whose tip, PIP and MCP get strictly closer to the wrist
    /// height in that order.
    fn extension(hand: &LandmarkSet) -> f32 {
        let wy = hand.wrist().y;
        let extended = Finger::ALL
            .iter()
            .zip(PIP_JOINTS.iter().zip(MCP_JOINTS))
            .filter(|(f, (pip, mcp))| {
                let tip = (hand.get(f.tip()).y - wy).abs();
                let pip = (hand.get(**pip).y - wy).abs();
                let mcp = (hand.get(*mcp).y - wy).abs();
                tip > pip && pip > mcp
            })
            .count();
        extended as f32 / 5.0
    }

    fn touching(a: &LandmarkSet, b: &LandmarkSet, tuning: &Tuning) -> f32 {
        let pairs = Finger::ALL
            .iter()
            .filter(|f| distance(a.get(f.tip()), b.get(f.tip())) < tuning.touch_distance)
            .count();
        pairs as f32 / 5.0
    }

    fn upward(hand: &LandmarkSet, tuning: &Tuning) -> f32 {
        let up = Finger::ALL
            .iter()
            .zip(MCP_JOINTS)
            .filter(|(f, mcp)| {
                let tip = hand.get(f.tip());
                let base = hand.get(*mcp);
                let (dx, dy) = (tip.x - base.x, tip.y - base.y);
                let mag = (dx * dx + dy * dy).sqrt();
                if mag == 0.0 {
                    return false;
                }
                let cos = (-dy / mag).clamp(-1.0, 1.0);
                cos.acos().to_degrees() < tuning.upward_angle_deg
            })
            .count();
        up as f32 / 5.0
    }
}

impl Gesture for PrayGesture {
    fn name(&self) -> &str {
        "pray"
    }

    fn hands_required(&self) -> HandCount {
        HandCount::Two
    }

    fn score(&self, hands: &[LandmarkSet], tuning: &Tuning) -> Vec<f32> {
        let [a, b] = hands else {
            return zeros(hands.len());
        };
        let extension = (Self::extension(a) + Self::extension(b)) / 2.0;
        let touching = Self::touching(a, b, tuning);
        let upward = (Self::upward(a, tuning) + Self::upward(b, tuning)) / 2.0;
        vec![clamp01((extension + touching + upward) / 3.0); 2]
    }
}
