//! Pure fleet logic for minefleet.
//!
//! This crate contains every rule of the truck synchronization engine that
//! can be expressed without threads, locks or transports. Functions take
//! plain data and return results, so the engine crate, the headless
//! harness and any future front end all agree on the same geometry.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`arbiter`] | Authority precedence between telemetry, manual and simulated writers |
//! | [`collision`] | Truck-vs-truck, truck-vs-wall and truck-vs-collectible predicates |
//! | [`command`] | Line-oriented operator commands (`add_truck`, `set_manual:…`) |
//! | [`constants`] | Coordinate space, canvas, icon sizes, wire keys |
//! | [`geometry`] | Logical/pixel points, AABBs and the logical→pixel projection |
//! | [`map`] | Static wall layout, default maze, layout validation |
//! | [`motion`] | Bounded random-walk step for unsupervised trucks |
//! | [`telemetry`] | Topic and payload parsing for inbound telemetry |

pub mod arbiter;
pub mod collision;
pub mod command;
pub mod constants;
pub mod geometry;
pub mod map;
pub mod motion;
pub mod telemetry;

/// Unique truck identifier, assigned by the registry starting at 1.
pub type TruckId = u32;
