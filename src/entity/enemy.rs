use std::sync::{Arc, LazyLock};

use log::debug;

use crate::fsm::{FsmError, State, StateMachine, TransitionTable};

use super::{Animation, AnimationSpec, Arena, Entity, Hitbox, Tick, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    Servant,
    Warrior,
    Commander,
    Monarch,
}

impl EnemyKind {
    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Servant => "servant",
            EnemyKind::Warrior => "warrior",
            EnemyKind::Commander => "commander",
            EnemyKind::Monarch => "monarch",
        }
    }

    pub fn hp(self) -> i32 {
        match self {
            EnemyKind::Servant => 10,
            EnemyKind::Warrior => 30,
            EnemyKind::Commander => 60,
            EnemyKind::Monarch => 120,
        }
    }

    /// Patrol speed, px/s.
    pub fn speed(self) -> f32 {
        match self {
            EnemyKind::Servant => 48.0,
            EnemyKind::Warrior => 40.0,
            EnemyKind::Commander => 32.0,
            EnemyKind::Monarch => 24.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyState {
    Init,
    Dead,
    Idle,
    Walk,
    Hurt,
    Death,
}

impl State for EnemyState {
    const INIT: Self = EnemyState::Init;
    const DEAD: Self = EnemyState::Dead;
}

impl EnemyState {
    fn animation(self) -> AnimationSpec {
        match self {
            EnemyState::Idle => AnimationSpec::looping(4),
            EnemyState::Walk => AnimationSpec::looping(6),
            EnemyState::Hurt => AnimationSpec::once(4).with_frame_ms(100),
            EnemyState::Death => AnimationSpec::once(6).with_frame_ms(100),
            EnemyState::Init | EnemyState::Dead => AnimationSpec::looping(1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnemyView {
    pub loops: u32,
    pub ended: bool,
    pub hp: i32,
    pub hit: bool,
}

static ENEMY_TABLE: LazyLock<Arc<TransitionTable<EnemyState, EnemyView>>> =
    LazyLock::new(|| Arc::new(enemy_table()));

fn enemy_table() -> TransitionTable<EnemyState, EnemyView> {
    use EnemyState::*;
    TransitionTable::new()
        .on(Init, |_| Idle)
        .on(Idle, |v: &EnemyView| {
            if v.hit {
                Hurt
            } else if v.loops > 0 {
                Walk
            } else {
                Idle
            }
        })
        .on(Walk, |v: &EnemyView| {
            if v.hit {
                Hurt
            } else if v.loops > 0 {
                Idle
            } else {
                Walk
            }
        })
        .on(Hurt, |v: &EnemyView| {
            if !v.ended {
                Hurt
            } else if v.hp <= 0 {
                Death
            } else {
                Idle
            }
        })
        .on(Death, |v: &EnemyView| if v.ended { Dead } else { Death })
        .on(Dead, |_| Dead)
}

pub struct Enemy {
    kind: EnemyKind,
    pos: Vec2,
    facing: f32,
    hp: i32,
    hit: bool,
    fsm: StateMachine<EnemyState, EnemyView>,
    animation: Animation,
}

impl Enemy {
    pub fn new(kind: EnemyKind, x: f32, arena: &Arena) -> Self {
        Self {
            kind,
            pos: Vec2::new(x, arena.floor),
            facing: 1.0,
            hp: kind.hp(),
            hit: false,
            fsm: StateMachine::new(Arc::clone(&*ENEMY_TABLE)),
            animation: EnemyState::Init.animation().build(),
        }
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn state(&self) -> EnemyState {
        self.fsm.state()
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    /// False when the enemy is already dying and the hit was ignored.
    pub fn damage(&mut self, amount: i32) -> bool {
        if matches!(self.fsm.state(), EnemyState::Death | EnemyState::Dead) {
            return false;
        }
        self.hp -= amount;
        self.hit = true;
        debug!("{}: took {amount}, hp {}", self.kind.name(), self.hp);
        true
    }

    pub fn kill(&mut self) {
        self.fsm.kill();
    }

    pub fn update(&mut self, tick: &Tick, arena: &Arena) -> Result<EnemyState, FsmError> {
        if self.fsm.state() == EnemyState::Walk {
            self.pos.x += self.facing * self.kind.speed() * tick.dt_s();
            if !(0.0..=arena.width).contains(&self.pos.x) {
                self.pos.x = self.pos.x.clamp(0.0, arena.width);
                self.facing = -self.facing;
            }
        }

        let view = EnemyView {
            loops: self.animation.loops(),
            ended: self.animation.ended(),
            hp: self.hp,
            hit: self.hit,
        };
        let state = self.fsm.update(&view)?;
        self.hit = false;

        if self.fsm.entered() {
            self.animation = state.animation().build();
            if state == EnemyState::Walk {
                self.facing = -self.facing;
            }
        } else {
            self.animation.update(tick.dt_ms);
        }
        Ok(state)
    }
}

impl Entity for Enemy {
    fn name(&self) -> &str {
        self.kind.name()
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
