use std::sync::{Arc, LazyLock};

use log::info;

use crate::controls::{Input, InputSet};
use crate::fsm::{FsmError, State, StateMachine, TransitionTable};

use super::{Animation, AnimationSpec, Arena, Body, Entity, Hitbox, Spell, Tick, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroSettings {
    /// Horizontal walking speed, px/s.
    pub speed: f32,
    /// Initial upward speed of a jump, px/s.
    pub jump_speed: f32,
    pub spell_cooldown_ms: u64,
    pub hp: i32,
}

impl Default for HeroSettings {
    fn default() -> Self {
        Self {
            speed: 128.0,
            jump_speed: 400.0,
            spell_cooldown_ms: 3000,
            hp: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeroState {
    Init,
    Dead,
    Idle,
    Walk,
    Jump,
    Attack,
    Cast,
    Hurt,
    Death,
}

impl State for HeroState {
    const INIT: Self = HeroState::Init;
    const DEAD: Self = HeroState::Dead;
}

impl HeroState {
    fn animation(self) -> AnimationSpec {
        match self {
            HeroState::Idle => AnimationSpec::looping(4),
            HeroState::Walk => AnimationSpec::looping(6),
            HeroState::Jump => AnimationSpec::looping(8),
            HeroState::Attack | HeroState::Cast | HeroState::Hurt => AnimationSpec::once(4),
            HeroState::Death => AnimationSpec::once(8),
            HeroState::Init | HeroState::Dead => AnimationSpec::looping(1),
        }
    }
}

/// Snapshot handed to the hero's transitions.
#[derive(Debug, Clone, Copy)]
pub struct HeroView {
    pub inputs: InputSet,
    pub vel: Vec2,
    pub grounded: bool,
    pub loops: u32,
    pub ended: bool,
    pub hp: i32,
    pub hit: bool,
}

impl HeroView {
    fn motion(&self) -> HeroState {
        if !self.grounded && self.vel.y < 0.0 {
            HeroState::Jump
        } else if self.vel.x != 0.0 {
            HeroState::Walk
        } else {
            HeroState::Idle
        }
    }

    fn interrupt(&self) -> Option<HeroState> {
        match (self.hit, self.hp <= 0) {
            (true, true) => Some(HeroState::Death),
            (true, false) => Some(HeroState::Hurt),
            _ => None,
        }
    }

    fn action(&self) -> Option<HeroState> {
        if self.inputs.contains(Input::Attack) {
            Some(HeroState::Attack)
        } else if self.inputs.contains(Input::Cast) {
            Some(HeroState::Cast)
        } else {
            None
        }
    }
}

static HERO_TABLE: LazyLock<Arc<TransitionTable<HeroState, HeroView>>> =
    LazyLock::new(|| Arc::new(hero_table()));

fn hero_table() -> TransitionTable<HeroState, HeroView> {
    use HeroState::*;
    TransitionTable::new()
        .on(Init, |_| Idle)
        .on(Idle, |v: &HeroView| {
            v.interrupt().or(v.action()).unwrap_or_else(|| v.motion())
        })
        .on(Walk, |v: &HeroView| {
            v.interrupt()
                .or(v.action())
                .unwrap_or(if v.loops > 0 { v.motion() } else { Walk })
        })
        .on(Jump, |v: &HeroView| {
            v.interrupt()
                .unwrap_or(if v.loops > 0 { v.motion() } else { Jump })
        })
        .on(Attack, |v: &HeroView| {
            v.interrupt()
                .unwrap_or(if v.ended { v.motion() } else { Attack })
        })
        .on(Cast, |v: &HeroView| {
            v.interrupt()
                .unwrap_or(if v.ended { v.motion() } else { Cast })
        })
        .on(Hurt, |v: &HeroView| match (v.ended, v.hp <= 0) {
            (false, _) => Hurt,
            (true, true) => Death,
            (true, false) => v.motion(),
        })
        .on(Death, |v: &HeroView| if v.ended { Dead } else { Death })
        .on(Dead, |_| Dead)
}

pub struct Hero {
    settings: HeroSettings,
    body: Body,
    facing: f32,
    hp: i32,
    hit: bool,
    cooldown_ms: u64,
    fsm: StateMachine<HeroState, HeroView>,
    animation: Animation,
}

impl Hero {
    pub fn new(settings: HeroSettings, x: f32, arena: &Arena) -> Self {
        Self {
            settings,
            body: Body::on_floor(x, arena),
            facing: 1.0,
            hp: settings.hp,
            hit: false,
            cooldown_ms: 0,
            fsm: StateMachine::new(Arc::clone(&*HERO_TABLE)),
            animation: HeroState::Init.animation().build(),
        }
    }

    pub fn state(&self) -> HeroState {
        self.fsm.state()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    pub fn damage(&mut self, amount: i32) {
        if matches!(self.fsm.state(), HeroState::Death | HeroState::Dead) {
            return;
        }
        self.hp -= amount;
        self.hit = true;
    }

    pub fn kill(&mut self) {
        self.fsm.kill();
    }

    fn alive(&self) -> bool {
        !matches!(self.fsm.state(), HeroState::Death | HeroState::Dead)
    }

    fn apply_inputs(&mut self, inputs: InputSet) {
        if !self.alive() {
            self.body.vel.x = 0.0;
            return;
        }
        self.body.vel.x = if inputs.contains(Input::Right) {
            self.settings.speed
        } else if inputs.contains(Input::Left) {
            -self.settings.speed
        } else {
            0.0
        };
        if self.body.vel.x != 0.0 {
            self.facing = self.body.vel.x.signum();
        }
        if inputs.contains(Input::Up) && self.body.grounded {
            self.body.vel.y = -self.settings.jump_speed;
            self.body.grounded = false;
        }
    }

    /// Advances one tick and returns any spells the hero cast.
    /// `target` is where a sun strike lands; the hero's own spot when `None`.
    pub fn update(
        &mut self,
        tick: &Tick,
        arena: &Arena,
        target: Option<Vec2>,
    ) -> Result<Vec<Spell>, FsmError> {
        self.apply_inputs(tick.inputs);
        self.body.step(tick.dt_s(), arena);

        let view = HeroView {
            inputs: tick.inputs,
            vel: self.body.vel,
            grounded: self.body.grounded,
            loops: self.animation.loops(),
            ended: self.animation.ended(),
            hp: self.hp,
            hit: self.hit,
        };
        let state = self.fsm.update(&view)?;
        self.hit = false;

        let mut cast = Vec::new();
        if self.fsm.entered() {
            self.animation = state.animation().build();
            if state == HeroState::Cast {
                let muzzle = self.body.pos + Vec2::new(self.facing * 16.0, -16.0);
                cast.push(Spell::fireball(muzzle, self.facing));
            }
        } else {
            self.animation.update(tick.dt_ms);
        }

        self.cooldown_ms = self.cooldown_ms.saturating_sub(tick.dt_ms);
        if self.alive() && self.cooldown_ms == 0 && tick.inputs.contains(Input::SunStrike) {
            let at = target.unwrap_or(self.body.pos);
            info!("hero: sun strike at ({:.0}, {:.0})", at.x, at.y);
            cast.push(Spell::sun_strike(at));
            self.cooldown_ms = self.settings.spell_cooldown_ms;
        }
        Ok(cast)
    }
}

impl Entity for Hero {
    fn name(&self) -> &str {
        "hero"
    }

    fn state_name(&self) -> String {
        format!("{:?}", self.fsm.state())
    }

    fn entered(&self) -> bool {
        self.fsm.entered()
    }

    fn is_dead(&self) -> bool {
        self.fsm.is_dead()
    }

    fn hitbox(&self) -> Hitbox {
        Hitbox::new(self.body.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SpellKind;

    const DT: u64 = 50;

    fn press(inputs: &[Input]) -> Tick {
        Tick::new(DT, inputs.iter().copied().collect())
    }

    fn hero() -> (Hero, Arena) {
        let arena = Arena::default();
        let mut h = Hero::new(HeroSettings::default(), 200.0, &arena);
        h.update(&press(&[]), &arena, None).unwrap();
        (h, arena)
    }

    #[test]
    fn starts_idle() {
        let (h, _) = hero();
        assert_eq!(h.state(), HeroState::Idle);
        assert!(h.entered());
    }

    #[test]
    fn walking_moves_and_faces() {
        let (mut h, arena) = hero();
        h.update(&press(&[Input::Left]), &arena, None).unwrap();
        assert_eq!(h.state(), HeroState::Walk);
        assert!(h.body().pos.x < 200.0);
        assert_eq!(h.facing(), -1.0);
    }

    #[test]
    fn walk_holds_for_a_loop_then_settles() {
        let (mut h, arena) = hero();
        h.update(&press(&[Input::Right]), &arena, None).unwrap();
        for _ in 0..5 {
            h.update(&press(&[]), &arena, None).unwrap();
            assert_eq!(h.state(), HeroState::Walk);
        }
        let mut n = 0;
        while h.state() == HeroState::Walk {
            h.update(&press(&[]), &arena, None).unwrap();
            n += 1;
            assert!(n < 100);
        }
        assert_eq!(h.state(), HeroState::Idle);
    }

    #[test]
    fn animation_restarts_on_state_entry() {
        let (mut h, arena) = hero();
        for _ in 0..10 {
            h.update(&press(&[]), &arena, None).unwrap();
        }
        assert!(h.animation().frame() > 0);

        h.update(&press(&[Input::Right]), &arena, None).unwrap();
        assert!(h.entered());
        assert_eq!(h.animation().frame(), 0);
        assert_eq!(h.animation().loops(), 0);

        h.update(&press(&[Input::Right]), &arena, None).unwrap();
        assert!(!h.entered());
        assert_eq!(h.animation().frame(), 0);
        h.update(&press(&[Input::Right]), &arena, None).unwrap();
        h.update(&press(&[Input::Right]), &arena, None).unwrap();
        h.update(&press(&[Input::Right]), &arena, None).unwrap();
        h.update(&press(&[Input::Right]), &arena, None).unwrap();
        h.update(&press(&[Input::Right]), &arena, None).unwrap();
        assert_eq!(h.animation().frame(), 1);
    }

    #[test]
    fn jump_only_from_the_ground() {
        let (mut h, arena) = hero();
        h.update(&press(&[Input::Up]), &arena, None).unwrap();
        assert_eq!(h.state(), HeroState::Jump);
        let vy = h.body().vel.y;
        assert!(vy < 0.0);
        h.update(&press(&[Input::Up]), &arena, None).unwrap();
        assert!(h.body().vel.y > vy, "no double jump");
    }

    #[test]
    fn cast_launches_a_fireball_in_facing_direction() {
        let (mut h, arena) = hero();
        h.update(&press(&[Input::Left]), &arena, None).unwrap();
        let spells = h.update(&press(&[Input::Cast]), &arena, None).unwrap();
        assert_eq!(h.state(), HeroState::Cast);
        assert_eq!(spells.len(), 1);
        match spells[0].kind() {
            SpellKind::Projectile { direction, .. } => assert_eq!(direction.x, -1.0),
            other => panic!("expected a projectile, got {other:?}"),
        }

        let mut n = 0;
        while h.state() == HeroState::Cast {
            assert!(h.update(&press(&[]), &arena, None).unwrap().is_empty());
            n += 1;
            assert!(n < 100);
        }
    }

    #[test]
    fn sun_strike_respects_cooldown() {
        let (mut h, arena) = hero();
        let target = Vec2::new(500.0, arena.floor);
        let s = h.update(&press(&[Input::SunStrike]), &arena, Some(target)).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].pos(), target);
        assert_eq!(h.cooldown_ms(), 3000);

        let s = h.update(&press(&[Input::SunStrike]), &arena, None).unwrap();
        assert!(s.is_empty());

        for _ in 0..60 {
            h.update(&press(&[]), &arena, None).unwrap();
        }
        let s = h.update(&press(&[Input::SunStrike]), &arena, None).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].pos(), h.body().pos);
    }

    #[test]
    fn hurt_then_death() {
        let (mut h, arena) = hero();
        h.damage(40);
        h.update(&press(&[]), &arena, None).unwrap();
        assert_eq!(h.state(), HeroState::Hurt);
        h.damage(60);
        let mut n = 0;
        while !h.is_dead() {
            h.update(&press(&[Input::Right]), &arena, None).unwrap();
            n += 1;
            assert!(n < 200);
        }
        assert_eq!(h.fsm.previous(), HeroState::Death);
        assert_eq!(h.body().vel.x, 0.0);
    }

    #[test]
    fn kill_is_a_sink() {
        let (mut h, arena) = hero();
        h.kill();
        assert!(h.is_dead());
        assert!(h.entered());

        let spells = h
            .update(&press(&[Input::Cast, Input::SunStrike]), &arena, None)
            .unwrap();
        assert!(spells.is_empty());
        assert_eq!(h.state(), HeroState::Dead);
        assert!(!h.entered());
    }

    #[test]
    fn heroes_share_one_table() {
        let arena = Arena::default();
        let a = Hero::new(HeroSettings::default(), 10.0, &arena);
        let b = Hero::new(HeroSettings::default(), 20.0, &arena);
        assert!(Arc::strong_count(&*HERO_TABLE) >= 3);
        drop((a, b));
    }
}
