//! Enemy combat controller
//!
//! A small state machine per enemy. Each tick it re-aims at the target,
//! checks the low-health interrupt, takes at most one state-local
//! transition, then applies thrust for the resulting state. Firing is
//! requested through the returned command; the orchestrator spawns the shot.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};
use super::vector::VectorExt;
use crate::consts::*;

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AiState {
    /// Close in until nearer than `threshold`
    ApproachTarget { threshold: f32 },
    /// Strafe and shoot; fall back to approach beyond `threshold_high`
    DistanceAttack { threshold_high: f32 },
    /// Back off until a safe distance
    Flee,
    /// Low health: charge and keep shooting. Never left.
    Kamikaze,
}

impl AiState {
    pub fn name(&self) -> &'static str {
        match self {
            AiState::ApproachTarget { .. } => "approach",
            AiState::DistanceAttack { .. } => "distance-attack",
            AiState::Flee => "flee",
            AiState::Kamikaze => "kamikaze",
        }
    }
}

/// Requests produced by one controller update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AiCommand {
    /// Fire along the entity heading this tick
    pub fire: bool,
}

/// Per-enemy controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiController {
    /// Entity being hunted
    pub target: EntityId,
    state: AiState,
    /// +1 or -1, which side of the attack vector to strafe toward
    strafe_sign: f32,
    next_strafe_flip_ms: f64,
    next_fire_ms: f64,
}

impl AiController {
    /// New controller approaching `target` with a randomized threshold
    pub fn new(target: EntityId, rng: &mut impl Rng) -> Self {
        let threshold = rng.random_range(APPROACH_MIN..APPROACH_MAX);
        Self::with_state(target, AiState::ApproachTarget { threshold })
    }

    /// New controller starting in an explicit state
    pub fn with_state(target: EntityId, state: AiState) -> Self {
        Self {
            target,
            state,
            strafe_sign: 1.0,
            next_strafe_flip_ms: 0.0,
            next_fire_ms: 0.0,
        }
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    /// Earliest logical time the next shot may be fired
    pub fn next_fire_ms(&self) -> f64 {
        self.next_fire_ms
    }

    fn enter(&mut self, me: EntityId, state: AiState, now_ms: f64, rng: &mut impl Rng) {
        log::debug!(
            "enemy {} AI {} -> {}",
            me,
            self.state.name(),
            state.name()
        );
        if matches!(state, AiState::DistanceAttack { .. }) {
            self.next_strafe_flip_ms =
                now_ms + rng.random_range(STRAFE_FLIP_MIN_MS..STRAFE_FLIP_MAX_MS);
        }
        self.state = state;
    }

    /// Single state-local transition for the current distance
    fn transition(&self, distance: f32, rng: &mut impl Rng) -> Option<AiState> {
        match self.state {
            AiState::ApproachTarget { threshold } if distance < threshold => {
                Some(AiState::DistanceAttack {
                    threshold_high: threshold + ATTACK_BAND,
                })
            }
            AiState::DistanceAttack { threshold_high } if distance > threshold_high => {
                Some(AiState::ApproachTarget {
                    threshold: rng.random_range(APPROACH_MIN..APPROACH_MAX),
                })
            }
            AiState::DistanceAttack { .. } if distance < FLEE_DISTANCE => Some(AiState::Flee),
            AiState::Flee if distance >= FLEE_SAFE_DISTANCE => Some(AiState::DistanceAttack {
                threshold_high: rng.random_range(REENGAGE_MIN..REENGAGE_MAX),
            }),
            _ => None,
        }
    }

    fn try_fire(&mut self, now_ms: f64, rng: &mut impl Rng) -> bool {
        if now_ms < self.next_fire_ms {
            return false;
        }
        self.next_fire_ms = now_ms + FIRE_COOLDOWN_MS + rng.random_range(0.0..FIRE_JITTER_MS);
        true
    }

    /// Run one tick of behaviour for `me` hunting a target at `target_pos`
    pub fn update_behaviour(
        &mut self,
        me: &mut Entity,
        target_pos: Vec3,
        now_ms: f64,
        rng: &mut impl Rng,
    ) -> AiCommand {
        let attack = target_pos - me.position;
        let distance = attack.mag();
        if distance > 0.0 {
            me.heading = attack.normalized();
        }

        if me.hit_points() < KAMIKAZE_HEALTH && self.state != AiState::Kamikaze {
            self.enter(me.id, AiState::Kamikaze, now_ms, rng);
        } else if let Some(next) = self.transition(distance, rng) {
            self.enter(me.id, next, now_ms, rng);
        }

        let mut command = AiCommand::default();
        match self.state {
            AiState::ApproachTarget { .. } => {
                me.thrust_toward(attack);
            }
            AiState::DistanceAttack { .. } => {
                if now_ms >= self.next_strafe_flip_ms {
                    self.strafe_sign = -self.strafe_sign;
                    self.next_strafe_flip_ms =
                        now_ms + rng.random_range(STRAFE_FLIP_MIN_MS..STRAFE_FLIP_MAX_MS);
                }
                me.thrust_toward(attack.perp_2d() * self.strafe_sign);
                command.fire = self.try_fire(now_ms, rng);
            }
            AiState::Flee => {
                me.thrust_toward(-attack);
            }
            AiState::Kamikaze => {
                me.thrust_toward(attack);
                command.fire = self.try_fire(now_ms, rng);
            }
        }
        command
    }
}
