#![allow(dead_code)]

use flowheroes::landmarks::{Finger, Landmark, LandmarkSet, WRIST};

pub const SEGMENT: f32 = 0.05;

/// Synthetic hand, open with every finger pointing up the image.
pub struct Hand {
    pts: [Landmark; 21],
}

impl Hand {
    pub fn open(wx: f32, wy: f32) -> Self {
        let mut pts = [Landmark::default(); 21];
        pts[WRIST] = Landmark::new(wx, wy, 0.0);
        for (finger, dx) in Finger::ALL.into_iter().zip([-0.06, -0.03, 0.0, 0.03, 0.06]) {
            let base_y = if finger == Finger::Thumb { wy - 0.05 } else { wy - 0.1 };
            for (k, j) in finger.joints().into_iter().enumerate() {
                pts[j] = Landmark::new(wx + dx, base_y - k as f32 * SEGMENT, 0.0);
            }
        }
        Self { pts }
    }

    /// Straightens `finger` from its MCP along `dir`.
    pub fn point(mut self, finger: Finger, dir: (f32, f32)) -> Self {
        let n = (dir.0 * dir.0 + dir.1 * dir.1).sqrt();
        let base = self.pts[finger.mcp()];
        for (k, j) in finger.joints().into_iter().enumerate().skip(1) {
            let d = k as f32 * SEGMENT / n;
            self.pts[j] = Landmark::new(base.x + dir.0 * d, base.y + dir.1 * d, 0.0);
        }
        self
    }

    pub fn set(mut self, joint: usize, x: f32, y: f32) -> Self {
        self.pts[joint] = Landmark::new(x, y, 0.0);
        self
    }

    pub fn joint(&self, joint: usize) -> Landmark {
        self.pts[joint]
    }

    pub fn shift(mut self, dx: f32, dy: f32) -> Self {
        for p in self.pts.iter_mut() {
            p.x += dx;
            p.y += dy;
        }
        self
    }

    pub fn build(self) -> LandmarkSet {
        LandmarkSet::new(self.pts)
    }
}

/// Unit vector projection onto +x, the way the directional scorers measure it.
pub fn x_projection(from: Landmark, to: Landmark) -> f32 {
    let (dx, dy, dz) = (to.x - from.x, to.y - from.y, to.z - from.z);
    dx / (dx * dx + dy * dy + dz * dz).sqrt()
}
