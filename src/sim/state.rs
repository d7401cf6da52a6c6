//! Arena state and entity lifecycle
//!
//! Owns the active entity collection. Entities join either directly through
//! the spawner API (between ticks) or through the pending queue (mid-tick),
//! and leave only through `cleanup`, so every tick scans a stable snapshot.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::AiController;
use super::detect::{Arena, WallSide};
use super::entity::{Entity, EntityId, ItemKind, Role, StatBlock};
use super::module::{ModuleKind, ModuleSlot, SpawnRequest};
use super::score::Score;
use crate::error::{SimError, SimResult};
use crate::settings::Settings;

/// Notifications for presentation, audio and score collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Spawned {
        id: EntityId,
        role: Role,
    },
    Destroyed {
        id: EntityId,
        role: Role,
        /// Last entity credited with hitting it
        killer: Option<EntityId>,
    },
    Damaged {
        target: EntityId,
        source: EntityId,
        amount: f32,
    },
    ItemPickedUp {
        player: EntityId,
        item: EntityId,
        kind: ItemKind,
    },
    /// A projectile was destroyed by the arena boundary
    WallHit {
        entity: EntityId,
        side: WallSide,
    },
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct ArenaState {
    pub settings: Settings,
    pub arena: Arena,
    /// Logical clock: accumulated elapsed milliseconds
    pub time_ms: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub score: Score,
    /// The player entity, if one is alive
    pub player: Option<EntityId>,
    pub(crate) entities: Vec<Entity>,
    /// Spawns requested during the current tick
    pub(crate) pending: Vec<SpawnRequest>,
    pub(crate) events: Vec<SimEvent>,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl ArenaState {
    /// Create an empty arena
    pub fn new(settings: Settings) -> SimResult<Self> {
        settings.validate()?;
        log::info!(
            "Arena {}x{} (margin {}), seed {}",
            settings.arena_width,
            settings.arena_height,
            settings.wall_margin,
            settings.seed
        );
        Ok(Self {
            arena: Arena::from_settings(&settings),
            rng: Pcg32::seed_from_u64(settings.seed),
            settings,
            time_ms: 0.0,
            time_ticks: 0,
            score: Score::new(),
            player: None,
            entities: Vec::new(),
            pending: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        })
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Active entities in insertion order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.player.and_then(|id| self.entity(id))
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        log::debug!("spawn {} {} at {:?}", entity.role.name(), id, entity.position);
        self.events.push(SimEvent::Spawned {
            id,
            role: entity.role,
        });
        self.entities.push(entity);
        id
    }

    fn build(&mut self, role: Role, stats: &StatBlock, position: Vec3) -> SimResult<Entity> {
        let id = self.next_entity_id();
        let mut entity = Entity::new(id, role, stats, position)?;
        entity.expires_at_ms = stats.lifetime_ms.map(|ms| self.time_ms + ms);
        Ok(entity)
    }

    /// Add an entity immediately. Call between ticks.
    pub fn spawn(&mut self, role: Role, stats: &StatBlock, position: Vec3) -> SimResult<EntityId> {
        let entity = self.build(role, stats, position)?;
        Ok(self.insert(entity))
    }

    /// Add the player with the standard module loadout
    pub fn spawn_player(&mut self, stats: &StatBlock, position: Vec3) -> SimResult<EntityId> {
        let entity = self.build(Role::Player, stats, position)?.with_modules(vec![
            ModuleSlot::new(ModuleKind::Cannon),
            ModuleSlot::new(ModuleKind::SeekerLauncher),
            ModuleSlot::new(ModuleKind::ShieldProjector),
            ModuleSlot::new(ModuleKind::Thruster),
        ]);
        let id = self.insert(entity);
        self.player = Some(id);
        Ok(id)
    }

    /// Add an enemy hunting `target`
    pub fn spawn_enemy(
        &mut self,
        stats: &StatBlock,
        position: Vec3,
        target: EntityId,
    ) -> SimResult<EntityId> {
        if self.entity(target).is_none() {
            return Err(SimError::UnknownEntity(target));
        }
        let controller = AiController::new(target, &mut self.rng);
        let entity = self
            .build(Role::Enemy, stats, position)?
            .with_controller(controller);
        Ok(self.insert(entity))
    }

    pub fn spawn_item(&mut self, kind: ItemKind, position: Vec3) -> SimResult<EntityId> {
        self.spawn(Role::Item { kind }, &StatBlock::item(), position)
    }

    /// Queue an entity to join at the end of the current tick
    pub fn queue_spawn(&mut self, request: SpawnRequest) {
        self.pending.push(request);
    }

    /// Append queued spawns to the active set
    pub(crate) fn flush_spawns(&mut self) {
        for request in std::mem::take(&mut self.pending) {
            match self.build(request.role, &request.stats, request.position) {
                Ok(mut entity) => {
                    entity.velocity = request.velocity;
                    entity.heading = request.heading;
                    self.insert(entity);
                }
                Err(err) => log::warn!("dropped {} spawn: {}", request.role.name(), err),
            }
        }
    }

    /// Update score from events emitted since `from`
    pub(crate) fn score_events(&mut self, from: usize) {
        let Some(player) = self.player else {
            return;
        };
        for event in &self.events[from..] {
            match *event {
                SimEvent::Damaged { target, amount, .. } if target == player && amount > 0.0 => {
                    self.score.break_chain();
                }
                SimEvent::ItemPickedUp {
                    kind: ItemKind::Bonus { points },
                    ..
                } => self.score.add_bonus(points),
                _ => {}
            }
        }
    }

    /// Remove dead, spent and expired entities; credit kills
    pub(crate) fn cleanup(&mut self) {
        let now = self.time_ms;
        let player = self.player;
        let mut removed = Vec::new();

        self.entities.retain(|e| {
            if e.should_despawn(now) {
                removed.push((e.id, e.role, e.last_hit_by, e.is_dead(), e.score_value));
                false
            } else {
                true
            }
        });

        for (id, role, killer, dead, value) in removed {
            if role.is_enemy() && dead && killer.is_some() && killer == player {
                self.score.record_kill(value);
            }
            if Some(id) == self.player {
                log::info!("player {} destroyed", id);
                self.player = None;
            } else {
                log::debug!("despawn {} {}", role.name(), id);
            }
            self.events.push(SimEvent::Destroyed { id, role, killer });
        }
    }
}
