//! Broad-phase collision detection
//!
//! Two interchangeable strategies behind `BroadPhase`. Bodies are circles, so
//! the broad phase doubles as the exact overlap test. Both strategies must
//! report the same set of pairs for the same snapshot; only the number of
//! exact tests they perform differs.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use crate::settings::Settings;

/// Playable arena bounds. Origin at the north-west corner, y grows south.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub wall_margin: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32, wall_margin: f32) -> Self {
        Self {
            width,
            height,
            wall_margin,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.arena_width,
            settings.arena_height,
            settings.wall_margin,
        )
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(self.width * 0.5, self.height * 0.5, 0.0)
    }

    /// Wall touched by a circle, checked North, South, East, West.
    /// Only the first match is reported.
    pub fn wall_contact(&self, position: Vec3, radius: f32) -> Option<WallSide> {
        let m = self.wall_margin;
        if position.y - radius < m {
            Some(WallSide::North)
        } else if position.y + radius > self.height - m {
            Some(WallSide::South)
        } else if position.x + radius > self.width - m {
            Some(WallSide::East)
        } else if position.x - radius < m {
            Some(WallSide::West)
        } else {
            None
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Arena boundary sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WallSide {
    North,
    South,
    East,
    West,
}

impl WallSide {
    /// Unit normal pointing from the wall into the arena
    pub fn inward_normal(&self) -> Vec3 {
        match self {
            WallSide::North => Vec3::Y,
            WallSide::South => Vec3::NEG_Y,
            WallSide::East => Vec3::NEG_X,
            WallSide::West => Vec3::X,
        }
    }
}

/// Receives detection results, indices into the scanned slice
pub trait CollisionListener {
    fn on_collision(&mut self, a: usize, b: usize);
    fn on_wall_collision(&mut self, entity: usize, side: WallSide);
}

/// Pluggable broad-phase strategy
pub trait BroadPhase {
    /// Scan `entities` and report every overlapping pair and wall contact
    fn detect(&mut self, entities: &[Entity], arena: &Arena, listener: &mut dyn CollisionListener);

    /// Exact pair tests performed by the last `detect`
    fn collision_check_count(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Strategy selector used by settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorKind {
    BruteForce,
    SweepAndPrune,
}

/// Build the configured strategy
pub fn make_detector(kind: DetectorKind) -> Box<dyn BroadPhase> {
    match kind {
        DetectorKind::BruteForce => Box::new(BruteForce::default()),
        DetectorKind::SweepAndPrune => Box::new(SweepAndPrune::default()),
    }
}

/// Circle overlap: center distance strictly less than the radius sum
#[inline]
pub fn circles_overlap(a: &Entity, b: &Entity) -> bool {
    let reach = a.radius + b.radius;
    a.position.distance_squared(b.position) < reach * reach
}

/// Shared wall pass. Seekers may leave the arena and are never checked.
fn report_walls(entities: &[Entity], arena: &Arena, listener: &mut dyn CollisionListener) {
    for (i, entity) in entities.iter().enumerate() {
        if entity.role.is_seeker() {
            continue;
        }
        if let Some(side) = arena.wall_contact(entity.position, entity.radius) {
            listener.on_wall_collision(i, side);
        }
    }
}

/// Checks every unordered pair once. O(n²).
#[derive(Debug, Default)]
pub struct BruteForce {
    checks: usize,
}

impl BroadPhase for BruteForce {
    fn detect(&mut self, entities: &[Entity], arena: &Arena, listener: &mut dyn CollisionListener) {
        self.checks = 0;
        report_walls(entities, arena, listener);

        for i in 0..entities.len() {
            for j in (i + 1)..entities.len() {
                self.checks += 1;
                if circles_overlap(&entities[i], &entities[j]) {
                    listener.on_collision(i, j);
                }
            }
        }
    }

    fn collision_check_count(&self) -> usize {
        self.checks
    }

    fn name(&self) -> &'static str {
        "brute-force"
    }
}

/// Single-axis sweep and prune over x. Re-sorts from scratch every pass.
#[derive(Debug, Default)]
pub struct SweepAndPrune {
    checks: usize,
    /// Entity indices sorted by left edge (reused between passes)
    sorted: Vec<usize>,
    /// Entities whose x extent may still reach the sweep line
    active: Vec<usize>,
}

impl BroadPhase for SweepAndPrune {
    fn detect(&mut self, entities: &[Entity], arena: &Arena, listener: &mut dyn CollisionListener) {
        debug_assert!(
            entities.iter().all(|e| e.position.x.is_finite() && e.radius.is_finite()),
            "sweep and prune needs finite extents for a stable sort"
        );

        self.checks = 0;
        report_walls(entities, arena, listener);

        let left = |e: &Entity| e.position.x - e.radius;
        let right = |e: &Entity| e.position.x + e.radius;

        self.sorted.clear();
        self.sorted.extend(0..entities.len());
        self.sorted
            .sort_by(|&a, &b| left(&entities[a]).total_cmp(&left(&entities[b])));

        self.active.clear();
        for &current in &self.sorted {
            let current_left = left(&entities[current]);
            self.active.retain(|&k| right(&entities[k]) >= current_left);

            for &other in &self.active {
                self.checks += 1;
                if circles_overlap(&entities[other], &entities[current]) {
                    listener.on_collision(other.min(current), other.max(current));
                }
            }
            self.active.push(current);
        }
    }

    fn collision_check_count(&self) -> usize {
        self.checks
    }

    fn name(&self) -> &'static str {
        "sweep-and-prune"
    }
}

/// Listener that records contacts for the response pass
#[derive(Debug, Default, Clone)]
pub struct Contacts {
    pub pairs: Vec<(usize, usize)>,
    pub walls: Vec<(usize, WallSide)>,
}

impl Contacts {
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.walls.clear();
    }

    /// Order contacts by entity index so response is independent of the strategy
    pub fn sort(&mut self) {
        self.pairs.sort_unstable();
        self.walls.sort_unstable();
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.walls.is_empty()
    }
}

impl CollisionListener for Contacts {
    fn on_collision(&mut self, a: usize, b: usize) {
        self.pairs.push((a, b));
    }

    fn on_wall_collision(&mut self, entity: usize, side: WallSide) {
        self.walls.push((entity, side));
    }
}
