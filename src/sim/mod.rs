//! Deterministic arena simulation
//!
//! Everything here runs on the logical clock and the seeded RNG owned by
//! `ArenaState`; iteration follows insertion order. No rendering or audio.

pub mod ai;
pub mod collision;
pub mod detect;
pub mod entity;
pub mod module;
pub mod score;
pub mod state;
pub mod tick;
pub mod vector;

pub use ai::{AiCommand, AiController, AiState};
pub use collision::{PairOutcome, PairRule, WallOutcome, classify, resolve_pair, resolve_wall};
pub use detect::{
    Arena, BroadPhase, BruteForce, CollisionListener, Contacts, DetectorKind, SweepAndPrune,
    WallSide, make_detector,
};
pub use entity::{Entity, EntityId, Faction, ItemKind, Role, StatBlock};
pub use module::{ModuleEffect, ModuleKind, ModuleSlot, SpawnRequest};
pub use score::Score;
pub use state::{ArenaState, SimEvent};
pub use tick::{Simulation, TickInput, tick};
pub use vector::{VectorExt, vec2d};
