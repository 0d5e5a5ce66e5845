//! Table-driven finite state machine shared by every animated entity.
//!
//! Each entity type defines a closed `State` enum and one transition function per
//! state it can enter. Transitions receive an explicit per-tick context instead of
//! reaching into the entity, so tables can be shared between instances.

use std::{collections::HashMap, fmt::Debug, hash::Hash, sync::Arc};

use thiserror::Error;

pub trait State: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every machine starts here.
    const INIT: Self;
    /// Terminal; entity tables map it onto itself.
    const DEAD: Self;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FsmError {
    #[error("no transition defined for state {state}")]
    MissingTransition { state: String },
}

pub type TransitionFn<S, C> = Box<dyn Fn(&C) -> S + Send + Sync>;

pub struct TransitionTable<S: State, C> {
    entries: HashMap<S, TransitionFn<S, C>>,
}

impl<S: State, C> Default for TransitionTable<S, C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<S: State, C> TransitionTable<S, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, state: S, f: impl Fn(&C) -> S + Send + Sync + 'static) -> Self {
        self.entries.insert(state, Box::new(f));
        self
    }
}

pub struct StateMachine<S: State, C> {
    table: Arc<TransitionTable<S, C>>,
    state: S,
    previous: S,
}

impl<S: State, C> Debug for StateMachine<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.state)
            .field("previous", &self.previous)
            .finish()
    }
}

impl<S: State, C> StateMachine<S, C> {
    pub fn new(table: Arc<TransitionTable<S, C>>) -> Self {
        Self {
            table,
            state: S::INIT,
            previous: S::INIT,
        }
    }

    pub fn state(&self) -> S {
        self.state
    }

    pub fn previous(&self) -> S {
        self.previous
    }

    /// True on the tick a new state was entered.
    pub fn entered(&self) -> bool {
        self.state != self.previous
    }

    pub fn is_dead(&self) -> bool {
        self.state == S::DEAD
    }

    /// Runs the current state's transition once. A state without an entry is an error
    /// and leaves the machine where it was.
    pub fn update(&mut self, ctx: &C) -> Result<S, FsmError> {
        self.previous = self.state;
        let f = self
            .table
            .entries
            .get(&self.state)
            .ok_or_else(|| FsmError::MissingTransition {
                state: format!("{:?}", self.state),
            })?;
        self.state = f(ctx);
        Ok(self.state)
    }

    /// Forces the terminal state, outside the transition table.
    pub fn kill(&mut self) {
        self.previous = self.state;
        self.state = S::DEAD;
    }
}
