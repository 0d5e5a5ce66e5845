//! Game entities driven by the state machine: the hero, enemies and spells.
//!
//! Coordinates are screen pixels with y growing downwards. Each entity updates in the
//! same order every tick: physics, state transition, then animation, where entering
//! a new state restarts that state's animation.

pub mod animation;
pub mod enemy;
pub mod hero;
pub mod spell;

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

use crate::controls::InputSet;

pub use animation::{Animation, AnimationSpec};
pub use enemy::{Enemy, EnemyKind, EnemyState};
pub use hero::{Hero, HeroSettings, HeroState};
pub use spell::{Spell, SpellKind, SpellState};

/// Downward acceleration, px/s².
pub const GRAVITY: f32 = 981.0;
/// Side of the square sprite cell every entity occupies.
pub const SPRITE_SIZE: f32 = 32.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, o: Vec2) -> Vec2 {
        Vec2::new(self.x + o.x, self.y + o.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, k: f32) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}

/// Axis-aligned box anchored at its bottom centre, the way sprites stand on the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub bottom: Vec2,
    pub size: f32,
}

impl Hitbox {
    pub fn new(bottom: Vec2) -> Self {
        Self {
            bottom,
            size: SPRITE_SIZE,
        }
    }

    pub fn intersects(&self, other: &Hitbox) -> bool {
        let half = (self.size + other.size) / 2.0;
        let (top_a, top_b) = (self.bottom.y - self.size, other.bottom.y - other.size);
        (self.bottom.x - other.bottom.x).abs() < half
            && top_a < other.bottom.y
            && top_b < self.bottom.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    /// y of the ground line.
    pub floor: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 360.0,
            floor: 320.0,
        }
    }
}

impl Arena {
    pub fn contains(&self, p: Vec2) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }
}

/// Point mass standing on the arena floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub grounded: bool,
}

impl Body {
    pub fn on_floor(x: f32, arena: &Arena) -> Self {
        Self {
            pos: Vec2::new(x, arena.floor),
            vel: Vec2::ZERO,
            grounded: true,
        }
    }

    pub fn step(&mut self, dt_s: f32, arena: &Arena) {
        if !self.grounded {
            self.vel.y += GRAVITY * dt_s;
        }
        self.pos = self.pos + self.vel * dt_s;
        self.pos.x = self.pos.x.clamp(0.0, arena.width);
        if self.pos.y >= arena.floor {
            self.pos.y = arena.floor;
            self.vel.y = 0.0;
            self.grounded = true;
        } else {
            self.grounded = false;
        }
    }
}

/// Per-tick input shared by every entity update.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tick {
    pub dt_ms: u64,
    pub inputs: InputSet,
}

impl Tick {
    pub fn new(dt_ms: u64, inputs: InputSet) -> Self {
        Self { dt_ms, inputs }
    }

    pub fn dt_s(&self) -> f32 {
        self.dt_ms as f32 / 1000.0
    }
}

/// What the game loop needs from every entity between ticks.
pub trait Entity {
    fn name(&self) -> &str;
    fn state_name(&self) -> String;
    /// True on the tick a new state was entered.
    fn entered(&self) -> bool;
    fn is_dead(&self) -> bool;
    fn hitbox(&self) -> Hitbox;
}
