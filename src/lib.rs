//! Gesture recognition and state-machine core of the Flow Heroes game.
//!
//! Hand landmarks come in from a [`source::LandmarkSource`], get scored by the
//! [`gestures`] registries and picked by the [`classifier`] on a background
//! [`recognition`] thread. Results cross to the game loop over the [`bridge`] and are
//! mapped to [`controls::Input`]s that drive [`fsm`]-based [`entity`] controllers.

pub mod bridge;
pub mod classifier;
pub mod config;
pub mod controls;
pub mod entity;
pub mod features;
pub mod fsm;
pub mod game;
pub mod gestures;
pub mod landmarks;
pub mod logging;
pub mod recognition;
pub mod source;
