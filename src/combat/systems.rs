//! Combat systems - projectile flight, hit resolution, damage handling.

use std::collections::HashSet;

use bevy::prelude::*;
use bevy_rapier2d::prelude::CollisionEvent;

use super::components::*;
use crate::core::{DamageEvent, DeathEvent, ImpactEffect, ImpactKind, PlayerHp, PlaySound, SoundCue};
use crate::enemies::Enemy;
use crate::player::Player;
use crate::world::EncounterConfig;

/// What a projectile touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Player,
    Enemy,
    Obstacle,
}

/// How a hit plays out. Every outcome destroys the projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    pub damages: bool,
    pub impact: ImpactKind,
}

/// Decide what a projectile fired by `origin` does to `target`.
///
/// `None` means the projectile passes through (its own side).
pub fn resolve_hit(origin: ProjectileOrigin, target: HitTarget) -> Option<HitOutcome> {
    match (origin, target) {
        (ProjectileOrigin::Enemy, HitTarget::Player) => Some(HitOutcome {
            damages: true,
            impact: ImpactKind::Player,
        }),
        (ProjectileOrigin::Player, HitTarget::Enemy) => Some(HitOutcome {
            damages: true,
            impact: ImpactKind::Enemy,
        }),
        (_, HitTarget::Obstacle) => Some(HitOutcome {
            damages: false,
            impact: ImpactKind::Wall,
        }),
        _ => None,
    }
}

/// Fly projectiles forward and drop the ones past their range.
pub fn move_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Projectile, &mut Transform)>,
) {
    let dt = time.delta_secs();
    for (entity, mut projectile, mut transform) in query.iter_mut() {
        let step = projectile.advance(dt);
        transform.translation += step.extend(0.0);
        if projectile.is_spent() {
            commands.entity(entity).despawn_recursive();
        }
    }
}

/// Turn projectile collisions into damage and impact effects.
///
/// A projectile is spent by its first hit; later collision pairs for it in
/// the same frame are ignored.
#[allow(clippy::too_many_arguments)]
pub fn resolve_projectile_hits(
    mut commands: Commands,
    mut collisions: EventReader<CollisionEvent>,
    projectiles: Query<(&Projectile, &Transform)>,
    players: Query<(), With<Player>>,
    enemies: Query<(), (With<Enemy>, Without<Dead>)>,
    obstacles: Query<(), With<Obstacle>>,
    mut damage_events: EventWriter<DamageEvent>,
    mut impacts: EventWriter<ImpactEffect>,
    mut sounds: EventWriter<PlaySound>,
) {
    let mut spent = HashSet::new();

    for event in collisions.read() {
        let CollisionEvent::Started(a, b, _) = event else {
            continue;
        };
        let (bullet, other) = if projectiles.contains(*a) {
            (*a, *b)
        } else if projectiles.contains(*b) {
            (*b, *a)
        } else {
            continue;
        };
        if spent.contains(&bullet) {
            continue;
        }
        let Ok((projectile, transform)) = projectiles.get(bullet) else {
            continue;
        };

        let target = if players.contains(other) {
            HitTarget::Player
        } else if enemies.contains(other) {
            HitTarget::Enemy
        } else if obstacles.contains(other) {
            HitTarget::Obstacle
        } else {
            continue;
        };
        let Some(outcome) = resolve_hit(projectile.origin, target) else {
            continue;
        };

        spent.insert(bullet);
        commands.entity(bullet).despawn_recursive();
        impacts.send(ImpactEffect {
            position: transform.translation.truncate(),
            kind: outcome.impact,
        });
        if outcome.damages {
            damage_events.send(DamageEvent {
                target: other,
                source: None,
                amount: projectile.damage,
            });
            sounds.send(PlaySound::now(SoundCue::BulletHit));
        } else {
            sounds.send(PlaySound::now(SoundCue::WallImpact));
        }
    }
}

/// Enemies pressing against the player hurt a little every frame.
pub fn contact_damage(
    mut collisions: EventReader<CollisionEvent>,
    config: Res<EncounterConfig>,
    mut players: Query<(Entity, &mut EnemyContacts), With<Player>>,
    enemies: Query<(), (With<Enemy>, Without<Dead>)>,
    mut damage_events: EventWriter<DamageEvent>,
) {
    for event in collisions.read() {
        let (a, b, touching) = match event {
            CollisionEvent::Started(a, b, _) => (*a, *b, true),
            CollisionEvent::Stopped(a, b, _) => (*a, *b, false),
        };
        let (player, other) = if players.contains(a) {
            (a, b)
        } else if players.contains(b) {
            (b, a)
        } else {
            continue;
        };
        let Ok((_, mut contacts)) = players.get_mut(player) else {
            continue;
        };
        if !touching {
            contacts.release(other);
        } else if enemies.contains(other) {
            contacts.touch(other);
        }
    }

    for (player, mut contacts) in players.iter_mut() {
        // Dead or despawned enemies stop hurting even without a stop event.
        contacts.retain(|enemy| enemies.contains(enemy));
        for enemy in contacts.iter() {
            damage_events.send(DamageEvent {
                target: player,
                source: Some(enemy),
                amount: config.player.contact_damage,
            });
        }
    }
}

/// Apply damage to entities.
pub fn apply_damage(
    mut commands: Commands,
    mut damage_events: EventReader<DamageEvent>,
    mut health_query: Query<(&mut Health, Option<&Dead>, Has<Player>)>,
    mut death_events: EventWriter<DeathEvent>,
    mut hp_events: EventWriter<PlayerHp>,
) {
    // Track entities that died this frame to avoid duplicate death events
    let mut died_this_frame = HashSet::new();

    for event in damage_events.read() {
        if died_this_frame.contains(&event.target) {
            continue;
        }
        let Ok((mut health, dead, is_player)) = health_query.get_mut(event.target) else {
            continue;
        };
        if dead.is_some() {
            continue;
        }

        health.take_damage(event.amount);
        if is_player {
            hp_events.send(PlayerHp {
                current: health.current,
            });
        }

        if health.is_dead() {
            died_this_frame.insert(event.target);
            commands.entity(event.target).insert(Dead);
            death_events.send(DeathEvent { entity: event.target });
        }
    }
}
