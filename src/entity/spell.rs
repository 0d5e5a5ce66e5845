use std::sync::{Arc, LazyLock};

use crate::fsm::{FsmError, State, StateMachine, TransitionTable};

use super::{Animation, AnimationSpec, Arena, Enemy, Entity, Hitbox, Tick, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpellState {
    Init,
    Dead,
    Active,
}

impl State for SpellState {
    const INIT: Self = SpellState::Init;
    const DEAD: Self = SpellState::Dead;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpellKind {
    /// Plays its animation once where it was cast.
    Instant,
    /// Travels until it hits something or leaves the arena.
    Projectile { direction: Vec2, speed: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct SpellSpec {
    pub name: &'static str,
    pub damage: i32,
    pub animation: AnimationSpec,
}

pub const SUN_STRIKE: SpellSpec = SpellSpec {
    name: "sun_strike",
    damage: 25,
    animation: AnimationSpec::once(8).with_frame_ms(75),
};

pub const FIREBALL: SpellSpec = SpellSpec {
    name: "fireball",
    damage: 10,
    animation: AnimationSpec::looping(6).with_frame_ms(75),
};

pub const FIREBALL_SPEED: f32 = 320.0;

#[derive(Debug, Clone, Copy)]
pub struct SpellView {
    pub projectile: bool,
    pub ended: bool,
    pub out_of_bounds: bool,
    pub spent: bool,
}

static SPELL_TABLE: LazyLock<Arc<TransitionTable<SpellState, SpellView>>> =
    LazyLock::new(|| Arc::new(spell_table()));

fn spell_table() -> TransitionTable<SpellState, SpellView> {
    TransitionTable::new()
        .on(SpellState::Init, |_| SpellState::Active)
        .on(SpellState::Active, |v: &SpellView| {
            let done = if v.projectile {
                v.out_of_bounds || v.spent
            } else {
                v.ended
            };
            if done {
                SpellState::Dead
            } else {
                SpellState::Active
            }
        })
        .on(SpellState::Dead, |_| SpellState::Dead)
}

pub struct Spell {
    name: &'static str,
    kind: SpellKind,
    damage: i32,
    pos: Vec2,
    spent: bool,
    fsm: StateMachine<SpellState, SpellView>,
    animation: Animation,
}

impl Spell {
    fn new(spec: SpellSpec, kind: SpellKind, pos: Vec2) -> Self {
        Self {
            name: spec.name,
            kind,
            damage: spec.damage,
            pos,
            spent: false,
            fsm: StateMachine::new(Arc::clone(&*SPELL_TABLE)),
            animation: spec.animation.build(),
        }
    }

    pub fn instant(spec: SpellSpec, pos: Vec2) -> Self {
        Self::new(spec, SpellKind::Instant, pos)
    }

    pub fn projectile(spec: SpellSpec, pos: Vec2, direction: Vec2, speed: f32) -> Self {
        Self::new(spec, SpellKind::Projectile { direction, speed }, pos)
    }

    pub fn sun_strike(pos: Vec2) -> Self {
        Self::instant(SUN_STRIKE, pos)
    }

    pub fn fireball(pos: Vec2, facing: f32) -> Self {
        Self::projectile(FIREBALL, pos, Vec2::new(facing.signum(), 0.0), FIREBALL_SPEED)
    }

    pub fn kind(&self) -> SpellKind {
        self.kind
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn state(&self) -> SpellState {
        self.fsm.state()
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    pub fn kill(&mut self) {
        self.fsm.kill();
    }

    pub fn update(&mut self, tick: &Tick, arena: &Arena) -> Result<SpellState, FsmError> {
        if let (SpellKind::Projectile { direction, speed }, SpellState::Active) =
            (self.kind, self.fsm.state())
        {
            self.pos = self.pos + direction * (speed * tick.dt_s());
        }

        let view = SpellView {
            projectile: matches!(self.kind, SpellKind::Projectile { .. }),
            ended: self.animation.ended(),
            out_of_bounds: !arena.contains(self.pos),
            spent: self.spent,
        };
        let state = self.fsm.update(&view)?;

        if self.fsm.entered() {
            self.animation.start();
        } else {
            self.animation.update(tick.dt_ms);
        }
        Ok(state)
    }

    /// Damages overlapping enemies. A sun strike lands once on everything under it, a
    /// projectile stops at the first enemy it touches. Returns how many were hit.
    pub fn strike(&mut self, enemies: &mut [Enemy]) -> usize {
        if self.spent || self.fsm.state() != SpellState::Active {
            return 0;
        }
        let area = self.hitbox();
        let mut hits = 0;
        for enemy in enemies.iter_mut().filter(|e| e.hitbox().intersects(&area)) {
            if !enemy.damage(self.damage) {
                continue;
            }
            hits += 1;
            if matches!(self.kind, SpellKind::Projectile { .. }) {
                break;
            }
        }
        match self.kind {
            SpellKind::Instant => self.spent = true,
            SpellKind::Projectile { .. } => self.spent = hits > 0,
        }
        hits
    }
}

impl Entity for Spell {
    fn name(&self) -> &str {
        self.name
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
        Hitbox::new(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EnemyKind;

    fn tick(ms: u64) -> Tick {
        Tick::new(ms, Default::default())
    }

    #[test]
    fn instant_spell_dies_when_its_animation_ends() {
        let arena = Arena::default();
        let mut s = Spell::sun_strike(Vec2::new(100.0, arena.floor));
        assert_eq!(s.update(&tick(16), &arena).unwrap(), SpellState::Active);

        let mut ticks = 0;
        while !s.is_dead() {
            s.update(&tick(16), &arena).unwrap();
            ticks += 1;
            assert!(ticks < 100, "sun strike never ended");
        }
        // 8 frames at 75 ms is 600 ms of animation
        assert!(ticks * 16 >= 600);
    }

    #[test]
    fn projectile_dies_out_of_bounds() {
        let arena = Arena::default();
        let mut s = Spell::fireball(Vec2::new(arena.width - 5.0, 300.0), 1.0);
        s.update(&tick(16), &arena).unwrap();
        assert_eq!(s.state(), SpellState::Active);
        s.update(&tick(16), &arena).unwrap();
        assert!(s.pos().x > arena.width);
        assert!(s.is_dead());
    }

    #[test]
    fn projectile_stops_at_first_enemy() {
        let arena = Arena::default();
        let mut enemies = vec![
            Enemy::new(EnemyKind::Warrior, 110.0, &arena),
            Enemy::new(EnemyKind::Warrior, 112.0, &arena),
        ];
        let mut s = Spell::fireball(Vec2::new(100.0, arena.floor), 1.0);
        s.update(&tick(16), &arena).unwrap();
        assert_eq!(s.strike(&mut enemies), 1);
        assert_eq!(s.strike(&mut enemies), 0);
        assert_eq!(enemies[0].hp(), EnemyKind::Warrior.hp() - FIREBALL.damage);
        assert_eq!(enemies[1].hp(), EnemyKind::Warrior.hp());
        s.update(&tick(16), &arena).unwrap();
        assert!(s.is_dead());
    }

    #[test]
    fn sun_strike_hits_everything_under_it_once() {
        let arena = Arena::default();
        let mut enemies = vec![
            Enemy::new(EnemyKind::Monarch, 100.0, &arena),
            Enemy::new(EnemyKind::Monarch, 105.0, &arena),
            Enemy::new(EnemyKind::Monarch, 400.0, &arena),
        ];
        let mut s = Spell::sun_strike(Vec2::new(100.0, arena.floor));
        assert_eq!(s.strike(&mut enemies), 0, "not active before its first update");
        s.update(&tick(16), &arena).unwrap();
        assert_eq!(s.strike(&mut enemies), 2);
        assert_eq!(s.strike(&mut enemies), 0);
        assert_eq!(s.state(), SpellState::Active);
    }

    #[test]
    fn kill_is_terminal() {
        let arena = Arena::default();
        let mut s = Spell::sun_strike(Vec2::ZERO);
        s.kill();
        assert!(s.is_dead());
        assert_eq!(s.update(&tick(16), &arena).unwrap(), SpellState::Dead);
    }
}
