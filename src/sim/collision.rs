//! Collision response
//!
//! Detected contacts are resolved by role. Pair rules are tried in priority
//! order and the first matching predicate decides the handler; pairs no rule
//! claims fall through to a full bounce with mutual damage.

use glam::Vec3;

use super::detect::{CollisionListener, Contacts, WallSide};
use super::entity::{Entity, EntityId, Faction, Role};
use super::state::SimEvent;
use crate::consts::WALL_PUSH_FACTOR;

/// How a pair of roles is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRule {
    /// Player collects an item, no bounce
    Pickup,
    /// Velocity exchange only
    BounceOnly,
    /// Nothing happens
    Ignore,
    /// Projectile strikes a target
    ProjectileHit,
    /// Bounce, mutual damage and hit attribution
    Exchange,
}

/// What resolving a contact actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    PickedUp,
    Bounced,
    Ignored,
    ProjectileHit,
    Exchanged,
    /// Bodies already moving apart; left untouched
    Separating,
}

/// What a wall contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallOutcome {
    Bounced,
    /// Already moving away from the wall; only the outward push applied
    Pushed,
    Destroyed,
    Ignored,
}

type Predicate = fn(&Entity, &Entity) -> bool;

/// Ordered rule table; symmetric predicates, first match wins
const PAIR_RULES: &[(Predicate, PairRule)] = &[
    (player_meets_item, PairRule::Pickup),
    (enemies_meet, PairRule::BounceOnly),
    (shield_meets_owner, PairRule::Ignore),
    (projectile_passes_through, PairRule::Ignore),
    (projectile_meets_target, PairRule::ProjectileHit),
];

fn either(a: &Entity, b: &Entity, pred: impl Fn(&Entity, &Entity) -> bool) -> bool {
    pred(a, b) || pred(b, a)
}

fn player_meets_item(a: &Entity, b: &Entity) -> bool {
    either(a, b, |p, i| p.role.is_player() && i.role.is_item())
}

fn enemies_meet(a: &Entity, b: &Entity) -> bool {
    a.role.is_enemy() && b.role.is_enemy()
}

fn shield_meets_owner(a: &Entity, b: &Entity) -> bool {
    either(a, b, |s, o| matches!(s.role, Role::Shield { owner } if owner == o.id))
}

fn projectile_passes_through(a: &Entity, b: &Entity) -> bool {
    either(a, b, |p, other| {
        let Role::Projectile { owner, faction, .. } = p.role else {
            return false;
        };
        other.id == owner
            || other.role.is_projectile()
            || matches!(other.role, Role::Shield { owner: shield_owner } if shield_owner == owner)
            || (faction == Faction::Enemy && other.role.is_enemy())
            || other.role.is_item()
    })
}

fn projectile_meets_target(a: &Entity, b: &Entity) -> bool {
    a.role.is_projectile() || b.role.is_projectile()
}

/// Pick the rule for a pair of entities
pub fn classify(a: &Entity, b: &Entity) -> PairRule {
    PAIR_RULES
        .iter()
        .find(|(pred, _)| pred(a, b))
        .map(|&(_, rule)| rule)
        .unwrap_or(PairRule::Exchange)
}

/// True when relative velocity points along the center difference
#[inline]
pub fn is_separating(a: &Entity, b: &Entity) -> bool {
    (a.velocity - b.velocity).dot(a.position - b.position) > 0.0
}

/// One-axis elastic exchange for masses `ma`, `mb` and speeds `ua`, `ub`
#[inline]
pub fn elastic_axis(ma: f32, mb: f32, ua: f32, ub: f32) -> (f32, f32) {
    let total = ma + mb;
    let diff = (ma - mb) / total;
    let va = diff * ua + (2.0 * mb / total) * ub;
    let vb = (2.0 * ma / total) * ua - diff * ub;
    (va, vb)
}

/// Elastic exchange applied to x and y independently (z untouched)
pub fn elastic_velocities(ma: f32, va: Vec3, mb: f32, vb: Vec3) -> (Vec3, Vec3) {
    let (ax, bx) = elastic_axis(ma, mb, va.x, vb.x);
    let (ay, by) = elastic_axis(ma, mb, va.y, vb.y);
    (Vec3::new(ax, ay, va.z), Vec3::new(bx, by, vb.z))
}

fn bounce(a: &mut Entity, b: &mut Entity) {
    let (va, vb) = elastic_velocities(a.mass(), a.velocity, b.mass(), b.velocity);
    a.velocity = va;
    b.velocity = vb;
}

/// Entity credited for damage this body deals (shields and projectiles credit their owner)
fn credit(entity: &Entity) -> EntityId {
    entity.role.owner().unwrap_or(entity.id)
}

fn damage(target: &mut Entity, source: &Entity, events: &mut Vec<SimEvent>) {
    let amount = source.collision_damage;
    if amount <= 0.0 {
        return;
    }
    target.take_damage(amount);
    events.push(SimEvent::Damaged {
        target: target.id,
        source: credit(source),
        amount,
    });
}

/// Resolve one overlapping pair
pub fn resolve_pair(a: &mut Entity, b: &mut Entity, events: &mut Vec<SimEvent>) -> PairOutcome {
    match classify(a, b) {
        PairRule::Ignore => PairOutcome::Ignored,

        PairRule::Pickup => {
            let (player, item) = if a.role.is_player() { (a, b) } else { (b, a) };
            if item.consumed {
                return PairOutcome::Ignored;
            }
            let Role::Item { kind } = item.role else {
                return PairOutcome::Ignored;
            };
            item.consumed = true;
            if let super::entity::ItemKind::Repair { amount } = kind {
                player.heal(amount);
            }
            log::debug!("{} picked up {} ({:?})", player.id, item.id, kind);
            events.push(SimEvent::ItemPickedUp {
                player: player.id,
                item: item.id,
                kind,
            });
            PairOutcome::PickedUp
        }

        PairRule::BounceOnly => {
            if is_separating(a, b) {
                return PairOutcome::Separating;
            }
            bounce(a, b);
            PairOutcome::Bounced
        }

        PairRule::ProjectileHit => {
            if is_separating(a, b) {
                return PairOutcome::Separating;
            }
            let (projectile, target) = if a.role.is_projectile() { (a, b) } else { (b, a) };
            bounce(projectile, target);
            damage(projectile, target, events);
            damage(target, projectile, events);
            target.last_hit_by = Some(credit(projectile));
            projectile.target_hit = true;
            log::trace!("{} hit {}", projectile.id, target.id);
            PairOutcome::ProjectileHit
        }

        PairRule::Exchange => {
            if is_separating(a, b) {
                return PairOutcome::Separating;
            }
            bounce(a, b);
            damage(a, b, events);
            damage(b, a, events);
            a.last_hit_by = Some(credit(b));
            b.last_hit_by = Some(credit(a));
            PairOutcome::Exchanged
        }
    }
}

/// Resolve a wall contact after a step of `dt` milliseconds
pub fn resolve_wall(entity: &mut Entity, side: WallSide, dt: f32) -> WallOutcome {
    match entity.role {
        Role::Shield { .. } => return WallOutcome::Ignored,
        Role::Projectile { seeker: true, .. } => return WallOutcome::Ignored,
        Role::Projectile { .. } => {
            entity.target_hit = true;
            return WallOutcome::Destroyed;
        }
        _ => {}
    }

    let normal = side.inward_normal();
    let moving_in = entity.velocity.dot(normal) < 0.0;
    if moving_in {
        entity.rollback(dt);
        match side {
            WallSide::North | WallSide::South => {
                entity.velocity.y *= -entity.bounce;
            }
            WallSide::East | WallSide::West => {
                entity.velocity.x *= -entity.bounce;
            }
        }
    }
    entity.apply_force(normal * (WALL_PUSH_FACTOR * entity.engine_thrust));

    if moving_in {
        WallOutcome::Bounced
    } else {
        WallOutcome::Pushed
    }
}

/// Borrow two distinct entities mutably
fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = entities.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = entities.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

/// Applies contacts to the entity slice they were detected on
pub struct Responder<'a> {
    entities: &'a mut [Entity],
    dt: f32,
    events: &'a mut Vec<SimEvent>,
}

impl<'a> Responder<'a> {
    pub fn new(entities: &'a mut [Entity], dt: f32, events: &'a mut Vec<SimEvent>) -> Self {
        Self {
            entities,
            dt,
            events,
        }
    }

    /// Replay recorded contacts, walls first then pairs
    pub fn apply(&mut self, contacts: &Contacts) {
        for &(entity, side) in &contacts.walls {
            self.on_wall_collision(entity, side);
        }
        for &(a, b) in &contacts.pairs {
            self.on_collision(a, b);
        }
    }
}

impl CollisionListener for Responder<'_> {
    fn on_collision(&mut self, a: usize, b: usize) {
        let (ea, eb) = pair_mut(self.entities, a, b);
        resolve_pair(ea, eb, self.events);
    }

    fn on_wall_collision(&mut self, entity: usize, side: WallSide) {
        let e = &mut self.entities[entity];
        if resolve_wall(e, side, self.dt) == WallOutcome::Destroyed {
            self.events.push(SimEvent::WallHit { entity: e.id, side });
        }
    }
}
