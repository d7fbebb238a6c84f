//! Combat-related components.

use std::collections::HashSet;

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::world::LevelEntity;

/// Component for entities that can take damage.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub maximum: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            maximum: max,
        }
    }

    /// Reduce health, flooring at zero. Returns the damage actually taken;
    /// once dead nothing more is taken.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if self.is_dead() {
            return 0.0;
        }
        let actual = amount.max(0.0).min(self.current);
        self.current -= actual;
        actual
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

/// Marker component for entities that have died (prevents multiple death events).
#[derive(Component)]
pub struct Dead;

/// Enemies currently pressing against the player, kept from collision
/// start/stop pairs.
#[derive(Component, Debug, Default)]
pub struct EnemyContacts(HashSet<Entity>);

impl EnemyContacts {
    pub fn touch(&mut self, enemy: Entity) {
        self.0.insert(enemy);
    }

    pub fn release(&mut self, enemy: Entity) {
        self.0.remove(&enemy);
    }

    pub fn retain(&mut self, mut keep: impl FnMut(Entity) -> bool) {
        self.0.retain(|enemy| keep(*enemy));
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Static geometry that stops projectiles: walls, closed doors, decorations.
#[derive(Component)]
pub struct Obstacle;

/// Which side fired a projectile. Projectiles never hurt their own side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileOrigin {
    Player,
    Enemy,
}

/// Ballistics for a new projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpec {
    pub damage: f32,
    /// World units per second.
    pub speed: f32,
    pub max_travel: f32,
}

/// A bullet flying in a straight line.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub origin: ProjectileOrigin,
    pub traveled: f32,
    pub max_travel: f32,
}

impl Projectile {
    pub fn new(direction: Vec2, spec: ProjectileSpec, origin: ProjectileOrigin) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            speed: spec.speed,
            damage: spec.damage,
            origin,
            traveled: 0.0,
            max_travel: spec.max_travel,
        }
    }

    /// Step forward by `dt` seconds. Returns the displacement.
    pub fn advance(&mut self, dt: f32) -> Vec2 {
        let step = self.speed * dt;
        self.traveled += step;
        self.direction * step
    }

    /// Out of range. The cap itself counts as spent.
    pub fn is_spent(&self) -> bool {
        self.traveled >= self.max_travel
    }
}

/// Radius of every projectile's sensor ball.
pub const PROJECTILE_RADIUS: f32 = 3.0;

/// Spawn a projectile at `position` heading along `direction`.
pub fn spawn_projectile(
    commands: &mut Commands,
    position: Vec2,
    direction: Vec2,
    spec: ProjectileSpec,
    origin: ProjectileOrigin,
) -> Entity {
    commands
        .spawn((
            Projectile::new(direction, spec, origin),
            Transform::from_translation(position.extend(1.0)),
            RigidBody::KinematicPositionBased,
            Collider::ball(PROJECTILE_RADIUS),
            Sensor,
            ActiveEvents::COLLISION_EVENTS,
            ActiveCollisionTypes::default() | ActiveCollisionTypes::KINEMATIC_STATIC,
            LevelEntity,
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_floors_at_zero_and_stays_dead() {
        let mut health = Health::new(100.0);
        assert_eq!(health.take_damage(40.0), 40.0);
        assert_eq!(health.take_damage(40.0), 40.0);
        assert_eq!(health.take_damage(40.0), 20.0);
        assert_eq!(health.current, 0.0);
        assert!(health.is_dead());

        assert_eq!(health.take_damage(10.0), 0.0);
        assert_eq!(health.current, 0.0);
    }

    #[test]
    fn projectile_is_spent_exactly_at_the_cap() {
        let spec = ProjectileSpec {
            damage: 10.0,
            speed: 100.0,
            max_travel: 350.0,
        };
        let mut projectile = Projectile::new(Vec2::new(3.0, 0.0), spec, ProjectileOrigin::Enemy);

        assert_eq!(projectile.advance(3.0), Vec2::new(300.0, 0.0));
        assert!(!projectile.is_spent());
        projectile.advance(0.5);
        assert_eq!(projectile.traveled, 350.0);
        assert!(projectile.is_spent());
    }
}
