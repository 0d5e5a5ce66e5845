//! Geometric features derived from a single landmark set.

use std::f32::consts::PI;

use crate::landmarks::{Finger, Landmark, LandmarkSet};

pub type Vec3 = [f32; 3];

pub fn sub(a: Landmark, b: Landmark) -> Vec3 {
    [a.x - b.x, a.y - b.y, a.z - b.z]
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn norm(v: Vec3) -> f32 {
    dot(v, v).sqrt()
}

pub fn distance(a: Landmark, b: Landmark) -> f32 {
    norm(sub(a, b))
}

/// Unit vector, or `None` for a zero-length input.
pub fn normalized(v: Vec3) -> Option<Vec3> {
    let n = norm(v);
    (n > 0.0).then(|| [v[0] / n, v[1] / n, v[2] / n])
}

/// Angle in radians; 0 when either vector is degenerate.
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (na * nb)).clamp(-1.0, 1.0).acos()
}

/// Segment vectors MCP→PIP, PIP→DIP, DIP→TIP.
pub fn finger_segments(joints: &[Landmark; 4]) -> [Vec3; 3] {
    [
        sub(joints[1], joints[0]),
        sub(joints[2], joints[1]),
        sub(joints[3], joints[2]),
    ]
}

#[derive(Debug, Clone, Copy)]
struct FingerShape {
    distance_ratio: f32,
    /// Mean of the PIP and DIP bend angles, scaled to [0,1].
    bend: f32,
}

fn finger_shape(joints: &[Landmark; 4]) -> FingerShape {
    let [v1, v2, v3] = finger_segments(joints);
    let direct = distance(joints[3], joints[0]);
    let path = norm(v1) + norm(v2) + norm(v3);
    let distance_ratio = if path > 0.0 { direct / path } else { 1.0 };
    let bend = (angle_between(v1, v2) / PI + angle_between(v2, v3) / PI) / 2.0;
    FingerShape {
        distance_ratio,
        bend,
    }
}

/// How bent a finger is; 0 = straight, towards 1 = fully folded.
pub fn curl_score(joints: &[Landmark; 4]) -> f32 {
    let s = finger_shape(joints);
    (1.0 - s.distance_ratio) * 0.7 + s.bend * 0.3
}

/// How straight a finger is. With a wrist reference the finger's alignment with the
/// wrist→MCP direction is blended in.
pub fn extension_score(joints: &[Landmark; 4], wrist: Option<Landmark>) -> f32 {
    let s = finger_shape(joints);
    let angle_score = 1.0 - s.bend;
    match wrist {
        Some(wrist) => {
            let palm = match (
                normalized(sub(joints[0], wrist)),
                normalized(sub(joints[3], joints[0])),
            ) {
                (Some(a), Some(b)) => ((dot(a, b) + 1.0) / 2.0).max(0.0),
                _ => 0.0,
            };
            s.distance_ratio * 0.4 + angle_score * 0.4 + palm * 0.2
        }
        None => s.distance_ratio * 0.5 + angle_score * 0.5,
    }
}

pub fn is_curled(joints: &[Landmark; 4], curl_threshold: f32) -> bool {
    curl_score(joints) > curl_threshold
}

pub fn is_extended(joints: &[Landmark; 4], wrist: Option<Landmark>, extension_threshold: f32) -> bool {
    extension_score(joints, wrist) > extension_threshold
}

pub fn finger_curl(hand: &LandmarkSet, finger: Finger) -> f32 {
    curl_score(&hand.finger(finger))
}

pub fn finger_extension(hand: &LandmarkSet, finger: Finger) -> f32 {
    extension_score(&hand.finger(finger), Some(hand.wrist()))
}

/// Translation and scale invariant point cloud, flattened to x0,y0,z0,x1,...
pub fn normalize_hand(hand: &LandmarkSet) -> Vec<f32> {
    let pts = hand.points();
    let n = pts.len() as f32;
    let c = pts.iter().fold([0.0f32; 3], |acc, p| {
        [acc[0] + p.x / n, acc[1] + p.y / n, acc[2] + p.z / n]
    });
    let centered: Vec<Vec3> = pts
        .iter()
        .map(|p| [p.x - c[0], p.y - c[1], p.z - c[2]])
        .collect();
    let scale = centered.iter().map(|v| norm(*v)).fold(0.0f32, f32::max);
    centered
        .into_iter()
        .flat_map(|v| {
            if scale > 0.0 {
                [v[0] / scale, v[1] / scale, v[2] / scale]
            } else {
                v
            }
        })
        .collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let d: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    d / (na * nb)
}
