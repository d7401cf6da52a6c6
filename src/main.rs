//! Arena Skirmish headless runner
//!
//! Seeds an arena with a player, a ring of enemies and a few items, then
//! steps the simulation at a fixed frame time with a scripted pilot.
//!
//! Usage: `arena-skirmish [settings.json] [frames]`

use std::process::ExitCode;

use arena_skirmish::sim::{EntityId, ItemKind, SimEvent, Simulation, StatBlock, vec2d};
use arena_skirmish::{Settings, SimResult};

/// Frame time fed to the simulation (ms)
const FRAME_MS: f32 = 16.0;
const DEFAULT_FRAMES: usize = 3600;
const ENEMY_COUNT: usize = 6;

fn populate(sim: &mut Simulation) -> SimResult<EntityId> {
    let state = sim.state_mut();
    let center = state.arena.center();
    let player = state.spawn_player(&StatBlock::player(), center)?;

    let ring = state.arena.height.min(state.arena.width) * 0.4;
    for i in 0..ENEMY_COUNT {
        let angle = i as f32 / ENEMY_COUNT as f32 * std::f32::consts::TAU;
        let position = center + vec2d(angle.cos(), angle.sin()) * ring;
        state.spawn_enemy(&StatBlock::enemy(), position, player)?;
    }

    state.spawn_item(ItemKind::Repair { amount: 25.0 }, center + vec2d(150.0, 0.0))?;
    state.spawn_item(ItemKind::Bonus { points: 500 }, center + vec2d(-150.0, 80.0))?;
    state.spawn_item(ItemKind::Upgrade { code: 1 }, center + vec2d(0.0, -200.0))?;
    Ok(player)
}

/// Aim at the nearest enemy, circle it and keep every module cycling
fn pilot(sim: &mut Simulation, frame: usize) {
    let Some(me) = sim.state().player_entity().map(|p| p.position) else {
        return;
    };
    let nearest = sim
        .entities()
        .iter()
        .filter(|e| e.role.is_enemy())
        .map(|e| e.position)
        .min_by(|a, b| me.distance_squared(*a).total_cmp(&me.distance_squared(*b)));

    if let Some(enemy) = nearest {
        let aim = enemy - me;
        sim.aim(aim);
        sim.accelerate(vec2d(-aim.y, aim.x));
        sim.activate_module(0);
        if frame % 90 == 0 {
            sim.activate_module(1);
        }
    }
    if frame % 400 == 0 {
        sim.activate_module(2);
    }
}

fn run(settings: Settings, frames: usize) -> SimResult<()> {
    let mut sim = Simulation::new(settings)?;
    populate(&mut sim)?;

    let mut kills_seen = 0;
    let mut pickups = 0;
    for frame in 0..frames {
        pilot(&mut sim, frame);
        sim.advance(FRAME_MS);

        for event in sim.drain_events() {
            match event {
                SimEvent::Destroyed { role, .. } if role.is_enemy() => kills_seen += 1,
                SimEvent::ItemPickedUp { kind, .. } => {
                    pickups += 1;
                    log::info!("frame {}: picked up {:?}", frame, kind);
                }
                _ => {}
            }
        }

        if sim.player().is_none() {
            log::info!("player destroyed at frame {}", frame);
            break;
        }
        if !sim.entities().iter().any(|e| e.role.is_enemy()) {
            log::info!("arena cleared at frame {}", frame);
            break;
        }
    }

    let score = sim.score();
    let survivors = sim.entities().iter().filter(|e| e.role.is_enemy()).count();
    println!(
        "t={:.0}ms ticks={} score={} kills={} best_chain={} enemies_destroyed={} pickups={} enemies_left={} player_alive={}",
        sim.state().time_ms,
        sim.state().time_ticks,
        score.points,
        score.kills,
        score.best_chain,
        kills_seen,
        pickups,
        survivors,
        sim.player().is_some()
    );
    Ok(())
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("failed to load settings from {}: {}", path, err);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    let frames = match args.next().map(|s| s.parse::<usize>()) {
        Some(Ok(frames)) => frames,
        Some(Err(err)) => {
            log::error!("invalid frame count: {}", err);
            return ExitCode::FAILURE;
        }
        None => DEFAULT_FRAMES,
    };

    log::info!("Arena Skirmish starting ({} frames)", frames);
    match run(settings, frames) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("simulation failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
