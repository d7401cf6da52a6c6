//! Per-frame simulation driver
//!
//! One call advances every stage in a fixed order:
//! input -> AI -> seekers -> integration -> shield anchoring ->
//! detection -> response -> scoring -> cleanup -> queued spawns.

use glam::Vec3;

use super::collision::Responder;
use super::detect::{BroadPhase, Contacts, make_detector};
use super::entity::{Entity, EntityId, Faction, Role};
use super::module::{ModuleEffect, projectile_request};
use super::score::Score;
use super::state::{ArenaState, SimEvent};
use super::vector::VectorExt;
use crate::error::SimResult;
use crate::settings::Settings;

/// Player signals for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Accelerate in this direction (engine thrust)
    pub accelerate: Option<Vec3>,
    /// Point the player's heading this way
    pub aim: Option<Vec3>,
    /// Module slots to activate
    pub activate: Vec<usize>,
}

/// Apply queued player input
fn apply_input(state: &mut ArenaState, input: &TickInput) {
    let now = state.time_ms;
    let Some(index) = state.player.and_then(|id| state.index_of(id)) else {
        return;
    };

    let player = &mut state.entities[index];
    if let Some(aim) = input.aim.filter(|a| a.mag() > 0.0) {
        player.heading = aim.normalized();
    }
    if let Some(direction) = input.accelerate {
        player.thrust_toward(direction);
    }

    let mut modules = std::mem::take(&mut player.modules);
    for &slot in &input.activate {
        let Some(module) = modules.get_mut(slot) else {
            log::warn!("no module in slot {}", slot);
            continue;
        };
        if let Some(ModuleEffect::Spawn(request)) = module.activate(player, now) {
            state.pending.push(request);
        }
    }
    player.modules = modules;
}

/// Run every enemy controller against its target
fn run_ai(state: &mut ArenaState) {
    let now = state.time_ms;
    for i in 0..state.entities.len() {
        let Some(target) = state.entities[i].controller.as_ref().map(|ai| ai.target) else {
            continue;
        };
        let Some(target_pos) = state.entity(target).map(|t| t.position) else {
            continue;
        };

        let entity = &mut state.entities[i];
        let Some(mut controller) = entity.controller.take() else {
            continue;
        };
        let command = controller.update_behaviour(entity, target_pos, now, &mut state.rng);
        entity.controller = Some(controller);

        if command.fire {
            if let Some(request) = projectile_request(entity, false) {
                state.pending.push(request);
            }
        }
    }
}

/// Nearest body a seeker of `faction` should chase
fn nearest_hostile(entities: &[Entity], from: Vec3, faction: Faction) -> Option<Vec3> {
    entities
        .iter()
        .filter(|e| match faction {
            Faction::Player => e.role.is_enemy(),
            Faction::Enemy => e.role.is_player(),
        })
        .map(|e| e.position)
        .min_by(|a, b| from.distance_squared(*a).total_cmp(&from.distance_squared(*b)))
}

/// Steer seeker projectiles toward the closest hostile
fn steer_seekers(state: &mut ArenaState) {
    for i in 0..state.entities.len() {
        let Role::Projectile {
            faction,
            seeker: true,
            ..
        } = state.entities[i].role
        else {
            continue;
        };
        let from = state.entities[i].position;
        if let Some(goal) = nearest_hostile(&state.entities, from, faction) {
            let seeker = &mut state.entities[i];
            seeker.heading = (goal - from).normalized();
            seeker.thrust_toward(goal - from);
        }
    }
}

/// Shields ride on their owners; orphaned shields collapse
fn anchor_shields(state: &mut ArenaState) {
    for i in 0..state.entities.len() {
        let Role::Shield { owner } = state.entities[i].role else {
            continue;
        };
        let anchor = state.entity(owner).map(|o| (o.position, o.velocity));
        match anchor {
            Some((position, velocity)) => {
                let shield = &mut state.entities[i];
                shield.position = position;
                shield.velocity = velocity;
            }
            None => state.entities[i].set_hit_points(0.0),
        }
    }
}

/// Advance the arena by `dt` milliseconds
pub fn tick(
    state: &mut ArenaState,
    input: &TickInput,
    detector: &mut dyn BroadPhase,
    contacts: &mut Contacts,
    dt: f32,
) {
    let dt = dt.clamp(0.0, state.settings.max_tick_ms);
    state.time_ticks += 1;
    state.time_ms += f64::from(dt);
    let first_event = state.events.len();

    apply_input(state, input);
    run_ai(state);
    steer_seekers(state);

    let epsilon = state.settings.velocity_epsilon;
    for entity in &mut state.entities {
        entity.update(dt, epsilon);
    }
    anchor_shields(state);

    contacts.clear();
    detector.detect(&state.entities, &state.arena, contacts);
    contacts.sort();
    log::trace!(
        "tick {}: {} pairs, {} wall contacts, {} checks ({})",
        state.time_ticks,
        contacts.pairs.len(),
        contacts.walls.len(),
        detector.collision_check_count(),
        detector.name()
    );

    Responder::new(&mut state.entities, dt, &mut state.events).apply(contacts);

    state.score_events(first_event);
    state.cleanup();
    state.flush_spawns();
}

/// Simulation facade driven once per frame by the host
pub struct Simulation {
    state: ArenaState,
    detector: Box<dyn BroadPhase>,
    contacts: Contacts,
    input: TickInput,
}

impl Simulation {
    pub fn new(settings: Settings) -> SimResult<Self> {
        let detector = make_detector(settings.detector);
        log::info!("Simulation using {} broad phase", detector.name());
        Ok(Self {
            state: ArenaState::new(settings)?,
            detector,
            contacts: Contacts::default(),
            input: TickInput::default(),
        })
    }

    /// Swap the broad-phase strategy
    pub fn with_detector(mut self, detector: Box<dyn BroadPhase>) -> Self {
        self.detector = detector;
        self
    }

    /// Queue "accelerate in direction" for the next advance
    pub fn accelerate(&mut self, direction: Vec3) {
        self.input.accelerate = Some(direction);
    }

    /// Queue a heading change for the next advance
    pub fn aim(&mut self, direction: Vec3) {
        self.input.aim = Some(direction);
    }

    /// Queue a module activation for the next advance
    pub fn activate_module(&mut self, slot: usize) {
        self.input.activate.push(slot);
    }

    /// Advance by the elapsed frame time and consume queued input
    pub fn advance(&mut self, elapsed_ms: f32) {
        let input = std::mem::take(&mut self.input);
        tick(
            &mut self.state,
            &input,
            self.detector.as_mut(),
            &mut self.contacts,
            elapsed_ms,
        );
    }

    pub fn state(&self) -> &ArenaState {
        &self.state
    }

    /// Spawner access between ticks
    pub fn state_mut(&mut self) -> &mut ArenaState {
        &mut self.state
    }

    pub fn entities(&self) -> &[Entity] {
        self.state.entities()
    }

    pub fn player(&self) -> Option<EntityId> {
        self.state.player
    }

    pub fn score(&self) -> &Score {
        &self.state.score
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.state.drain_events()
    }

    /// Exact pair tests in the last tick
    pub fn collision_check_count(&self) -> usize {
        self.detector.collision_check_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ai::AiState;
    use crate::sim::detect::DetectorKind;
    use crate::sim::entity::{ItemKind, StatBlock};
    use crate::sim::vector::vec2d;

    fn sim() -> Simulation {
        Simulation::new(Settings::default()).unwrap()
    }

    #[test]
    fn test_force_then_integrate_moves_player() {
        let mut sim = sim();
        let player = sim
            .state_mut()
            .spawn_player(&StatBlock::player(), vec2d(800.0, 600.0))
            .unwrap();

        sim.accelerate(vec2d(1.0, 0.0));
        sim.advance(16.0);
        let p = sim.state().entity(player).unwrap();
        assert!(p.velocity.x > 0.0);
        assert!(p.position.x > 800.0);
        assert_eq!(p.accumulated_force, Vec3::ZERO);

        // Input is consumed: without a new signal friction slows the player
        let speed = p.velocity.x;
        sim.advance(16.0);
        assert!(sim.state().entity(player).unwrap().velocity.x < speed);
    }

    #[test]
    fn test_deferred_removal() {
        let mut sim = sim();
        let state = sim.state_mut();
        let mut fragile = StatBlock::player();
        fragile.max_hit_points = 5.0;
        let victim = state.spawn_player(&fragile, vec2d(500.0, 500.0)).unwrap();
        let left = state
            .spawn(Role::Enemy, &StatBlock::enemy(), vec2d(470.0, 500.0))
            .unwrap();
        let right = state
            .spawn(Role::Enemy, &StatBlock::enemy(), vec2d(530.0, 500.0))
            .unwrap();
        state.entity_mut(left).unwrap().velocity = vec2d(0.1, 0.0);
        state.entity_mut(right).unwrap().velocity = vec2d(-0.1, 0.0);

        sim.advance(1.0);

        // The victim died on its first contact but still hit the second enemy
        let enemy_hp = StatBlock::enemy().max_hit_points - StatBlock::player().collision_damage;
        assert_eq!(sim.state().entity(left).unwrap().hit_points(), enemy_hp);
        assert_eq!(sim.state().entity(right).unwrap().hit_points(), enemy_hp);
        assert!(sim.state().entity(victim).is_none());
        assert!(sim.player().is_none());
        assert!(sim.drain_events().iter().any(|e| matches!(
            e,
            SimEvent::Destroyed { id, .. } if *id == victim
        )));
    }

    #[test]
    fn test_spawned_projectile_waits_a_tick() {
        let mut sim = sim();
        let state = sim.state_mut();
        state
            .spawn_player(&StatBlock::player(), vec2d(500.0, 500.0))
            .unwrap();
        let enemy = state
            .spawn(Role::Enemy, &StatBlock::enemy(), vec2d(540.0, 500.0))
            .unwrap();

        sim.activate_module(0);
        sim.advance(1.0);
        assert_eq!(sim.entities().len(), 3);
        let full = StatBlock::enemy().max_hit_points;
        assert_eq!(sim.state().entity(enemy).unwrap().hit_points(), full);

        sim.advance(1.0);
        let damage = StatBlock::bullet().collision_damage;
        assert_eq!(sim.state().entity(enemy).unwrap().hit_points(), full - damage);
        assert_eq!(sim.entities().len(), 2, "bullet is spent after the hit");
    }

    #[test]
    fn test_player_kill_scores() {
        let mut sim = sim();
        let state = sim.state_mut();
        state
            .spawn_player(&StatBlock::player(), vec2d(500.0, 500.0))
            .unwrap();
        let enemy = state
            .spawn(Role::Enemy, &StatBlock::enemy(), vec2d(540.0, 500.0))
            .unwrap();
        state.entity_mut(enemy).unwrap().set_hit_points(3.0);

        sim.activate_module(0);
        sim.advance(1.0);
        sim.advance(1.0);

        assert!(sim.state().entity(enemy).is_none());
        assert_eq!(sim.score().points, StatBlock::enemy().score_value);
        assert_eq!(sim.score().kill_chain, 1);
    }

    #[test]
    fn test_bonus_item_pickup() {
        let mut sim = sim();
        let state = sim.state_mut();
        let player = state
            .spawn_player(&StatBlock::player(), vec2d(500.0, 500.0))
            .unwrap();
        let item = state
            .spawn_item(ItemKind::Bonus { points: 250 }, vec2d(520.0, 500.0))
            .unwrap();

        sim.advance(1.0);
        assert!(sim.state().entity(item).is_none());
        assert_eq!(sim.score().points, 250);
        assert!(sim.drain_events().iter().any(|e| matches!(
            e,
            SimEvent::ItemPickedUp { player: p, .. } if *p == player
        )));
    }

    #[test]
    fn test_enemy_ai_hunts_player() {
        let mut sim = sim();
        let state = sim.state_mut();
        let player = state
            .spawn_player(&StatBlock::player(), vec2d(1400.0, 600.0))
            .unwrap();
        let enemy = state
            .spawn_enemy(&StatBlock::enemy(), vec2d(200.0, 600.0), player)
            .unwrap();

        sim.advance(16.0);
        let e = sim.state().entity(enemy).unwrap();
        assert!(e.velocity.x > 0.0, "enemy accelerates toward the player");
        assert!(e.heading.x > 0.99);
        assert!(matches!(
            e.controller.as_ref().unwrap().state(),
            AiState::ApproachTarget { .. }
        ));
    }

    #[test]
    fn test_low_health_enemy_turns_kamikaze_and_fires() {
        let mut sim = sim();
        let state = sim.state_mut();
        let player = state
            .spawn_player(&StatBlock::player(), vec2d(1000.0, 600.0))
            .unwrap();
        let enemy = state
            .spawn_enemy(&StatBlock::enemy(), vec2d(200.0, 600.0), player)
            .unwrap();
        state.entity_mut(enemy).unwrap().set_hit_points(4.0);

        sim.advance(16.0);
        let e = sim.state().entity(enemy).unwrap();
        assert_eq!(e.controller.as_ref().unwrap().state(), AiState::Kamikaze);
        assert!(
            sim.entities().iter().any(|x| matches!(
                x.role,
                Role::Projectile { owner, faction: Faction::Enemy, .. } if owner == enemy
            )),
            "kamikaze fires as soon as the cooldown allows"
        );
    }

    #[test]
    fn test_projectile_leaves_arena_through_wall() {
        let mut sim = sim();
        let state = sim.state_mut();
        let shot = state
            .spawn(
                Role::Projectile {
                    owner: EntityId(999),
                    faction: Faction::Enemy,
                    seeker: false,
                },
                &StatBlock::bullet(),
                vec2d(30.0, 600.0),
            )
            .unwrap();
        state.entity_mut(shot).unwrap().velocity = vec2d(-1.0, 0.0);

        sim.advance(16.0);
        assert!(sim.state().entity(shot).is_none());
        assert!(sim.drain_events().iter().any(|e| matches!(e, SimEvent::WallHit { .. })));
    }

    #[test]
    fn test_seeker_ignores_walls_and_steers() {
        let mut sim = sim();
        let state = sim.state_mut();
        let target = state
            .spawn(Role::Enemy, &StatBlock::enemy(), vec2d(800.0, 600.0))
            .unwrap();
        let seeker = state
            .spawn(
                Role::Projectile {
                    owner: EntityId(999),
                    faction: Faction::Player,
                    seeker: true,
                },
                &StatBlock::seeker(),
                vec2d(5.0, 600.0),
            )
            .unwrap();

        sim.advance(16.0);
        let s = sim.state().entity(seeker).expect("seeker survives the wall margin");
        assert!(s.velocity.x > 0.0);
        assert!(sim.state().entity(target).is_some());
    }

    #[test]
    fn test_shield_follows_owner_and_expires() {
        let mut sim = sim();
        let player = sim
            .state_mut()
            .spawn_player(&StatBlock::player(), vec2d(800.0, 600.0))
            .unwrap();

        sim.activate_module(2);
        sim.advance(16.0);
        let shield = sim
            .entities()
            .iter()
            .find(|e| matches!(e.role, Role::Shield { owner } if owner == player))
            .map(|e| e.id)
            .expect("shield spawned");

        sim.accelerate(vec2d(0.0, 1.0));
        sim.advance(16.0);
        let owner_pos = sim.state().entity(player).unwrap().position;
        assert_eq!(sim.state().entity(shield).unwrap().position, owner_pos);
        // Owner and its shield overlap but never damage each other
        assert_eq!(
            sim.state().entity(player).unwrap().hit_points(),
            StatBlock::player().max_hit_points
        );

        let lifetime = StatBlock::shield().lifetime_ms.unwrap() as f32;
        for _ in 0..(lifetime / 50.0) as usize + 2 {
            sim.advance(50.0);
        }
        assert!(sim.state().entity(shield).is_none());
    }

    #[test]
    fn test_elapsed_time_is_clamped() {
        let mut sim = sim();
        sim.advance(10_000.0);
        assert_eq!(sim.state().time_ms, f64::from(Settings::default().max_tick_ms));
        sim.advance(-5.0);
        assert_eq!(sim.state().time_ms, f64::from(Settings::default().max_tick_ms));
    }

    fn skirmish(detector: DetectorKind) -> Simulation {
        let settings = Settings {
            seed: 1234,
            detector,
            ..Settings::default()
        };
        let mut sim = Simulation::new(settings).unwrap();
        let state = sim.state_mut();
        let player = state
            .spawn_player(&StatBlock::player(), vec2d(800.0, 600.0))
            .unwrap();
        for i in 0..8 {
            let x = 150.0 + 180.0 * i as f32;
            let y = if i % 2 == 0 { 150.0 } else { 1050.0 };
            state
                .spawn_enemy(&StatBlock::enemy(), vec2d(x, y), player)
                .unwrap();
        }
        sim
    }

    #[test]
    fn test_detectors_drive_identical_simulations() {
        let mut brute = skirmish(DetectorKind::BruteForce);
        let mut sap = skirmish(DetectorKind::SweepAndPrune);

        for frame in 0..600 {
            if frame % 20 == 0 {
                brute.activate_module(0);
                sap.activate_module(0);
            }
            brute.advance(16.0);
            sap.advance(16.0);
        }

        assert_eq!(brute.entities().len(), sap.entities().len());
        for (a, b) in brute.entities().iter().zip(sap.entities()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.position, b.position);
            assert_eq!(a.velocity, b.velocity);
            assert_eq!(a.hit_points(), b.hit_points());
        }
        assert_eq!(brute.score(), sap.score());
    }
}
