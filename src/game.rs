//! Headless fixed-tick game loop.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use anyhow::{Context, Result};
use log::{debug, error, info};
use serde::Serialize;

use crate::config::GameSettings;
use crate::controls::{Controls, Input, InputSet};
use crate::entity::{Arena, Enemy, EnemyKind, Entity, Hero, Spell, Tick, Vec2};

/// Raised by SIGINT/SIGTERM.
pub fn install_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(sig, flag.clone())
            .with_context(|| format!("failed to register handler for signal {sig}"))?;
    }
    Ok(flag)
}

fn log_edge(e: &dyn Entity) {
    if e.entered() {
        debug!("{} -> {}", e.name(), e.state_name());
    }
}

pub struct World {
    pub arena: Arena,
    pub hero: Hero,
    pub enemies: Vec<Enemy>,
    pub spells: Vec<Spell>,
    spells_cast: u64,
}

impl World {
    /// The hero on the left, one enemy of each kind spread to the right.
    pub fn new(settings: &GameSettings) -> Self {
        let arena = Arena::default();
        let hero = Hero::new(settings.hero(), 64.0, &arena);
        let enemies = [
            EnemyKind::Servant,
            EnemyKind::Warrior,
            EnemyKind::Commander,
            EnemyKind::Monarch,
        ]
        .into_iter()
        .enumerate()
        .map(|(i, kind)| Enemy::new(kind, 240.0 + 100.0 * i as f32, &arena))
        .collect();
        Self::with_entities(arena, hero, enemies)
    }

    pub fn with_entities(arena: Arena, hero: Hero, enemies: Vec<Enemy>) -> Self {
        Self {
            arena,
            hero,
            enemies,
            spells: Vec::new(),
            spells_cast: 0,
        }
    }

    /// Where an aimed spell lands: the first enemy still standing.
    fn target(&self) -> Option<Vec2> {
        self.enemies
            .iter()
            .find(|e| !e.is_dead() && e.hp() > 0)
            .map(|e| e.pos())
    }

    pub fn step(&mut self, tick: &Tick) -> Result<()> {
        let target = self.target();
        let cast = self
            .hero
            .update(tick, &self.arena, target)
            .context("hero update failed")?;
        log_edge(&self.hero);
        self.spells_cast += cast.len() as u64;
        self.spells.extend(cast);

        for enemy in &mut self.enemies {
            enemy
                .update(tick, &self.arena)
                .with_context(|| format!("{} update failed", enemy.name()))?;
            log_edge(&*enemy);
        }

        for spell in &mut self.spells {
            spell
                .update(tick, &self.arena)
                .with_context(|| format!("{} update failed", spell.name()))?;
            log_edge(&*spell);
            let hits = spell.strike(&mut self.enemies);
            if hits > 0 {
                debug!("{} hit {hits} enemies", spell.name());
            }
        }

        self.enemies.retain(|e| !e.is_dead());
        self.spells.retain(|s| !s.is_dead());
        Ok(())
    }

    pub fn spells_cast(&self) -> u64 {
        self.spells_cast
    }
}

/// The error that ended the loop wins over one from stopping the controls.
fn settle(result: Result<()>, stopped: Result<()>) -> Result<()> {
    match (result, stopped) {
        (Err(e), Err(s)) => {
            error!("game: controls shutdown failed: {s:#}");
            Err(e)
        }
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub ticks: u64,
    pub controls: &'static str,
    pub hero_state: String,
    pub hero_hp: i32,
    pub hero_x: f32,
    pub enemies_left: usize,
    pub spells_cast: u64,
    pub inputs: BTreeMap<Input, u64>,
}

pub struct Game {
    world: World,
    controls: Box<dyn Controls>,
    settings: GameSettings,
    shutdown: Arc<AtomicBool>,
    realtime: bool,
    paused: bool,
}

impl Game {
    pub fn new(
        settings: GameSettings,
        controls: Box<dyn Controls>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            world: World::new(&settings),
            controls,
            settings,
            shutdown,
            realtime: true,
            paused: false,
        }
    }

    /// Skip sleeping between ticks; game time still advances by the fixed tick.
    pub fn unpaced(mut self) -> Self {
        self.realtime = false;
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Handles the menu inputs; false when the player asked to leave.
    fn menu(&mut self, inputs: InputSet) -> bool {
        if inputs.contains(Input::Exit) {
            info!("game: exit requested");
            return false;
        }
        if inputs.contains(Input::Pause) && !self.paused {
            info!("game: paused");
            self.paused = true;
        } else if inputs.contains(Input::Play) && self.paused {
            info!("game: resumed");
            self.paused = false;
        }
        if inputs.contains(Input::Shop) {
            info!("game: shop is closed in headless mode");
        }
        true
    }

    /// Runs until `max_ticks`, the shutdown flag, an exit input or the hero's death,
    /// then stops the controls.
    pub fn run(&mut self, max_ticks: Option<u64>) -> Result<Summary> {
        let tick_len = self.settings.tick();
        let dt_ms = tick_len.as_millis().max(1) as u64;
        let mut inputs_seen: BTreeMap<Input, u64> = BTreeMap::new();
        let mut ticks = 0u64;
        info!(
            "game: {} fps with {} controls",
            self.settings.fps,
            self.controls.name()
        );

        let result = loop {
            if self.shutdown.load(Ordering::SeqCst) {
                info!("game: shutdown requested");
                break Ok(());
            }
            if max_ticks.is_some_and(|m| ticks >= m) {
                break Ok(());
            }
            let started = Instant::now();

            let inputs = self.controls.poll();
            for i in inputs.iter() {
                *inputs_seen.entry(i).or_default() += 1;
            }
            if !self.menu(inputs) {
                break Ok(());
            }
            if !self.paused {
                if let Err(e) = self.world.step(&Tick::new(dt_ms, inputs)) {
                    break Err(e);
                }
            }
            ticks += 1;

            if self.world.hero.is_dead() {
                info!("game: the hero has fallen");
                break Ok(());
            }
            if self.realtime {
                thread::sleep(tick_len.saturating_sub(started.elapsed()));
            }
        };

        let stopped = self.controls.shutdown();
        settle(result, stopped)?;

        let hero = &self.world.hero;
        Ok(Summary {
            ticks,
            controls: self.controls.name(),
            hero_state: hero.state_name(),
            hero_hp: hero.hp(),
            hero_x: hero.body().pos.x,
            enemies_left: self.world.enemies.len(),
            spells_cast: self.world.spells_cast(),
            inputs: inputs_seen,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{Key, KeyboardMouse};
    use crate::entity::{EnemyState, HeroState};

    struct Script(Vec<InputSet>);

    impl Controls for Script {
        fn name(&self) -> &'static str {
            "script"
        }
        fn poll(&mut self) -> InputSet {
            if self.0.is_empty() {
                InputSet::default()
            } else {
                self.0.remove(0)
            }
        }
    }

    fn inputs(list: &[Input]) -> InputSet {
        list.iter().copied().collect()
    }

    fn game(script: Vec<InputSet>) -> Game {
        Game::new(
            GameSettings::default(),
            Box::new(Script(script)),
            Arc::new(AtomicBool::new(false)),
        )
        .unpaced()
    }

    #[test]
    fn loop_error_outranks_shutdown_error() {
        let failed = Err(anyhow::anyhow!("hero update failed"));
        let err = settle(failed, Err(anyhow::anyhow!("join"))).unwrap_err();
        assert_eq!(err.to_string(), "hero update failed");
        assert!(settle(Ok(()), Err(anyhow::anyhow!("join"))).is_err());
        assert!(settle(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn failed_shutdown_is_reported_after_a_clean_run() {
        struct Stuck;
        impl Controls for Stuck {
            fn name(&self) -> &'static str {
                "stuck"
            }
            fn poll(&mut self) -> InputSet {
                InputSet::default()
            }
            fn shutdown(&mut self) -> Result<()> {
                Err(anyhow::anyhow!("recognition thread panicked"))
            }
        }
        let mut g = Game::new(
            GameSettings::default(),
            Box::new(Stuck),
            Arc::new(AtomicBool::new(false)),
        )
        .unpaced();
        let err = g.run(Some(3)).unwrap_err();
        assert!(err.to_string().contains("panicked"));
    }

    #[test]
    fn runs_the_requested_number_of_ticks() {
        let mut g = game(vec![]);
        let s = g.run(Some(30)).unwrap();
        assert_eq!(s.ticks, 30);
        assert_eq!(s.hero_state, "Idle");
        assert_eq!(s.enemies_left, 4);
    }

    #[test]
    fn shutdown_flag_stops_immediately() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut g = Game::new(GameSettings::default(), Box::new(KeyboardMouse::new()), flag);
        assert_eq!(g.run(None).unwrap().ticks, 0);
    }

    #[test]
    fn exit_input_ends_the_loop() {
        let mut g = game(vec![InputSet::default(), inputs(&[Input::Exit])]);
        let s = g.run(Some(100)).unwrap();
        assert_eq!(s.ticks, 1);
        assert_eq!(s.inputs[&Input::Exit], 1);
    }

    #[test]
    fn pause_freezes_the_world() {
        let mut script = vec![inputs(&[Input::Pause])];
        script.extend(std::iter::repeat_n(inputs(&[Input::Right]), 10));
        let mut g = game(script);
        let s = g.run(Some(11)).unwrap();
        assert_eq!(s.hero_x, 64.0);
        assert_eq!(s.hero_state, "Init");
    }

    #[test]
    fn hero_walks_with_input() {
        let script = std::iter::repeat_n(inputs(&[Input::Right]), 20).collect();
        let mut g = game(script);
        let s = g.run(Some(20)).unwrap();
        assert!(s.hero_x > 64.0);
        assert_eq!(g.world().hero.state(), HeroState::Walk);
    }

    #[test]
    fn sun_strike_kills_the_servant() {
        let mut script = vec![InputSet::default(), inputs(&[Input::SunStrike])];
        script.extend(std::iter::repeat_n(InputSet::default(), 200));
        let mut g = game(script);
        let s = g.run(Some(200)).unwrap();
        assert_eq!(s.spells_cast, 1);
        assert_eq!(s.enemies_left, 3);
        assert!(g
            .world()
            .enemies
            .iter()
            .all(|e| e.kind() != EnemyKind::Servant));
    }

    #[test]
    fn fireball_damages_the_first_enemy_in_line() {
        let arena = Arena::default();
        let hero = Hero::new(Default::default(), 100.0, &arena);
        let enemies = vec![Enemy::new(EnemyKind::Monarch, 200.0, &arena)];
        let mut w = World::with_entities(arena, hero, enemies);
        w.step(&Tick::new(16, InputSet::default())).unwrap();
        w.step(&Tick::new(16, inputs(&[Input::Cast]))).unwrap();
        assert_eq!(w.spells.len(), 1);
        let mut n = 0;
        while !w.spells.is_empty() {
            w.step(&Tick::new(16, InputSet::default())).unwrap();
            n += 1;
            assert!(n < 60, "fireball never landed");
        }
        assert_eq!(w.enemies[0].hp(), 110);
        assert_eq!(w.enemies[0].state(), EnemyState::Hurt);
    }

    #[test]
    fn keyboard_controls_drive_the_world() {
        let mut km = KeyboardMouse::new();
        km.press(Key::D);
        let mut g = Game::new(
            GameSettings::default(),
            Box::new(km),
            Arc::new(AtomicBool::new(false)),
        )
        .unpaced();
        let s = g.run(Some(5)).unwrap();
        assert_eq!(s.controls, "keyboard-mouse");
        assert_eq!(s.inputs[&Input::Right], 5);
    }
}
