//! Sprite-strip timing. Only frame indices are tracked; drawing lives elsewhere.

/// Frame duration used by the bundled sprite strips (4 frames a second).
pub const DEFAULT_FRAME_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationSpec {
    pub frames: u32,
    pub frame_ms: u64,
    pub repeat: bool,
}

impl AnimationSpec {
    pub const fn looping(frames: u32) -> Self {
        Self {
            frames,
            frame_ms: DEFAULT_FRAME_MS,
            repeat: true,
        }
    }

    pub const fn once(frames: u32) -> Self {
        Self {
            frames,
            frame_ms: DEFAULT_FRAME_MS,
            repeat: false,
        }
    }

    pub const fn with_frame_ms(mut self, frame_ms: u64) -> Self {
        self.frame_ms = frame_ms;
        self
    }

    pub fn build(self) -> Animation {
        Animation::new(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    frames: u32,
    frame_ms: u64,
    repeat: bool,
    elapsed_ms: u64,
}

impl Animation {
    pub fn new(spec: AnimationSpec) -> Self {
        Self {
            frames: spec.frames.max(1),
            frame_ms: spec.frame_ms.max(1),
            repeat: spec.repeat,
            elapsed_ms: 0,
        }
    }

    fn duration_ms(&self) -> u64 {
        self.frames as u64 * self.frame_ms
    }

    /// Rewind to the first frame.
    pub fn start(&mut self) -> u32 {
        self.elapsed_ms = 0;
        0
    }

    /// Advance by `dt_ms` and return the frame to show.
    pub fn update(&mut self, dt_ms: u64) -> u32 {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        self.frame()
    }

    pub fn frame(&self) -> u32 {
        let idx = if self.repeat {
            (self.elapsed_ms % self.duration_ms()) / self.frame_ms
        } else {
            (self.elapsed_ms / self.frame_ms).min(self.frames as u64 - 1)
        };
        idx as u32
    }

    /// Completed passes over the strip.
    pub fn loops(&self) -> u32 {
        let n = self.elapsed_ms / self.duration_ms();
        if self.repeat { n as u32 } else { n.min(1) as u32 }
    }

    /// A one-shot animation that has played its last frame out.
    pub fn ended(&self) -> bool {
        !self.repeat && self.elapsed_ms >= self.duration_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_wraps_and_counts() {
        let mut a = AnimationSpec::looping(4).with_frame_ms(100).build();
        assert_eq!(a.update(250), 2);
        assert_eq!(a.loops(), 0);
        assert_eq!(a.update(200), 0);
        assert_eq!(a.loops(), 1);
        assert!(!a.ended());
    }

    #[test]
    fn one_shot_clamps_and_ends() {
        let mut a = AnimationSpec::once(3).with_frame_ms(100).build();
        assert_eq!(a.update(150), 1);
        assert!(!a.ended());
        assert_eq!(a.update(1000), 2);
        assert!(a.ended());
        assert_eq!(a.loops(), 1);
    }

    #[test]
    fn start_rewinds() {
        let mut a = AnimationSpec::once(2).with_frame_ms(10).build();
        a.update(100);
        assert!(a.ended());
        assert_eq!(a.start(), 0);
        assert!(!a.ended());
        assert_eq!(a.loops(), 0);
    }

    #[test]
    fn degenerate_specs_do_not_divide_by_zero() {
        let mut a = AnimationSpec::looping(0).with_frame_ms(0).build();
        assert_eq!(a.update(5), 0);
        assert_eq!(a.loops(), 5);
    }
}
