//! Enemy AI behavior systems.

use std::time::Duration;

use bevy::prelude::*;
use bevy_rapier2d::prelude::{ColliderDisabled, Velocity};

use super::components::{AiState, Enemy, EnemyStats, EnemyTarget, LastAttack};
use crate::combat::{spawn_projectile, ProjectileOrigin, ProjectileSpec};
use crate::core::{AnimationKey, Animator, DeathEvent, EnemyDeath, Facing, PlaySound, SoundCue};

/// Next state for an enemy `distance` away from its target.
///
/// `None` means the target no longer exists, which counts as out of range.
/// Dead is terminal.
pub fn next_state(state: AiState, distance: Option<f32>, stats: &EnemyStats) -> AiState {
    match (state, distance) {
        (AiState::Dead, _) => AiState::Dead,
        (_, None) => AiState::Idle,
        (AiState::Idle, Some(d)) if d <= stats.aggression_radius => AiState::Moving,
        (AiState::Moving, Some(d)) if d <= stats.attack_radius => AiState::Attacking,
        (AiState::Moving, Some(d)) if d > stats.aggression_radius => AiState::Idle,
        (AiState::Attacking, Some(d)) if d > stats.attack_radius => AiState::Moving,
        (state, _) => state,
    }
}

fn target_position(targets: &Query<&Transform, Without<Enemy>>, target: &EnemyTarget) -> Option<Vec2> {
    targets.get(target.0).ok().map(|t| t.translation.truncate())
}

/// Idle enemies stand still and wake up when the target comes close.
pub fn ai_detection(
    targets: Query<&Transform, Without<Enemy>>,
    mut enemy_query: Query<
        (&Transform, &EnemyStats, &EnemyTarget, &mut AiState, &mut Velocity, &mut Animator),
        With<Enemy>,
    >,
) {
    for (transform, stats, target, mut ai_state, mut velocity, mut animator) in enemy_query.iter_mut() {
        if *ai_state != AiState::Idle {
            continue;
        }

        velocity.linvel = Vec2::ZERO;
        if !animator.is_playing() {
            animator.play(AnimationKey::EnemyIdle, false);
        }

        let position = transform.translation.truncate();
        let distance = target_position(&targets, target).map(|p| p.distance(position));
        *ai_state = next_state(*ai_state, distance, stats);
    }
}

/// Moving enemies walk straight at the target.
pub fn ai_chase(
    time: Res<Time>,
    targets: Query<&Transform, Without<Enemy>>,
    mut enemy_query: Query<
        (
            &Transform,
            &EnemyStats,
            &EnemyTarget,
            &mut AiState,
            &mut Velocity,
            &mut Animator,
            &mut Facing,
        ),
        With<Enemy>,
    >,
) {
    let delta_ms = time.delta_secs() * 1000.0;

    for (transform, stats, target, mut ai_state, mut velocity, mut animator, mut facing) in enemy_query.iter_mut() {
        if *ai_state != AiState::Moving {
            continue;
        }

        let position = transform.translation.truncate();
        let Some(target_pos) = target_position(&targets, target) else {
            *ai_state = next_state(*ai_state, None, stats);
            velocity.linvel = Vec2::ZERO;
            continue;
        };

        let offset = target_pos - position;
        *ai_state = next_state(*ai_state, Some(offset.length()), stats);
        if *ai_state != AiState::Moving {
            velocity.linvel = Vec2::ZERO;
            continue;
        }

        let direction = offset.normalize_or_zero();
        velocity.linvel = direction * stats.move_speed * delta_ms;
        facing.look_along(direction);
        if !animator.is_playing() {
            animator.play(AnimationKey::EnemyRun, false);
        }
    }
}

/// Attacking enemies hold position and shoot on a cooldown.
pub fn ai_attack(
    mut commands: Commands,
    time: Res<Time>,
    targets: Query<&Transform, Without<Enemy>>,
    mut enemy_query: Query<
        (
            Entity,
            &Transform,
            &EnemyStats,
            &EnemyTarget,
            &mut AiState,
            &mut Velocity,
            &mut Facing,
            &mut LastAttack,
        ),
        With<Enemy>,
    >,
) {
    let now = time.elapsed();

    for (entity, transform, stats, target, mut ai_state, mut velocity, mut facing, mut last_attack) in
        enemy_query.iter_mut()
    {
        if *ai_state != AiState::Attacking {
            continue;
        }
        velocity.linvel = Vec2::ZERO;

        let position = transform.translation.truncate();
        let Some(target_pos) = target_position(&targets, target) else {
            *ai_state = next_state(*ai_state, None, stats);
            continue;
        };

        let offset = target_pos - position;
        *ai_state = next_state(*ai_state, Some(offset.length()), stats);
        if *ai_state != AiState::Attacking {
            continue;
        }

        let direction = offset.normalize_or_zero();
        facing.look_along(direction);
        if direction == Vec2::ZERO || !last_attack.ready(now, Duration::from_millis(stats.fire_cooldown_ms)) {
            continue;
        }

        last_attack.0 = Some(now);
        spawn_projectile(
            &mut commands,
            position,
            direction,
            ProjectileSpec {
                damage: stats.projectile_damage,
                speed: stats.projectile_speed,
                max_travel: stats.projectile_max_travel,
            },
            ProjectileOrigin::Enemy,
        );
        debug!("Enemy {:?} fired", entity);
    }
}

/// Enemies whose health ran out enter Dead: they stop, lose their collider,
/// play the death animation and are announced on the bus. Only the first
/// death of an enemy counts.
pub fn handle_enemy_death(
    mut commands: Commands,
    mut death_events: EventReader<DeathEvent>,
    mut enemy_query: Query<(&mut AiState, &mut Velocity, &mut Animator), With<Enemy>>,
    mut enemy_deaths: EventWriter<EnemyDeath>,
    mut sounds: EventWriter<PlaySound>,
) {
    for event in death_events.read() {
        let Ok((mut ai_state, mut velocity, mut animator)) = enemy_query.get_mut(event.entity) else {
            continue;
        };
        if *ai_state == AiState::Dead {
            continue;
        }

        *ai_state = AiState::Dead;
        velocity.linvel = Vec2::ZERO;
        commands.entity(event.entity).insert(ColliderDisabled);
        animator.play(AnimationKey::EnemyDeath, true);
        sounds.send(PlaySound::delayed(SoundCue::EnemyDeath, 0.5));
        enemy_deaths.send(EnemyDeath { enemy: event.entity });
    }
}

/// Despawn enemies once their death animation has played out.
pub fn despawn_dead_enemies(mut commands: Commands, query: Query<(Entity, &AiState, &Animator), With<Enemy>>) {
    for (entity, ai_state, animator) in query.iter() {
        if *ai_state == AiState::Dead && animator.has_finished(AnimationKey::EnemyDeath) {
            commands.entity(entity).despawn_recursive();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{Health, Projectile};
    use crate::core::AnimationLibrary;
    use crate::core::advance_animations;
    use crate::enemies::spawning::spawn_enemy;
    use crate::player::Player;
    use crate::testing::{advance, create_test_app, record_events, recorded};

    fn stats() -> EnemyStats {
        EnemyStats::default()
    }

    #[test]
    fn transitions_follow_the_radii() {
        let s = stats();
        assert_eq!(next_state(AiState::Idle, Some(250.0), &s), AiState::Idle);
        assert_eq!(next_state(AiState::Idle, Some(200.0), &s), AiState::Moving);
        assert_eq!(next_state(AiState::Moving, Some(150.0), &s), AiState::Moving);
        assert_eq!(next_state(AiState::Moving, Some(120.0), &s), AiState::Attacking);
        assert_eq!(next_state(AiState::Moving, Some(201.0), &s), AiState::Idle);
        assert_eq!(next_state(AiState::Attacking, Some(121.0), &s), AiState::Moving);
        assert_eq!(next_state(AiState::Attacking, Some(10.0), &s), AiState::Attacking);
        assert_eq!(next_state(AiState::Moving, None, &s), AiState::Idle);
        assert_eq!(next_state(AiState::Dead, Some(0.0), &s), AiState::Dead);
    }

    struct Arena {
        app: App,
        player: Entity,
        enemy: Entity,
    }

    fn arena() -> Arena {
        let mut app = create_test_app();
        app.init_resource::<AnimationLibrary>().add_systems(
            Update,
            (
                advance_animations,
                ai_detection,
                ai_chase,
                ai_attack,
                handle_enemy_death,
                despawn_dead_enemies,
            )
                .chain(),
        );
        record_events::<EnemyDeath>(&mut app);

        let player = app.world_mut().spawn((Player, Transform::default())).id();
        let enemy = {
            let mut commands = app.world_mut().commands();
            spawn_enemy(&mut commands, Vec2::new(300.0, 0.0), &stats(), player)
        };
        app.world_mut().flush();
        Arena { app, player, enemy }
    }

    fn place_player(arena: &mut Arena, x: f32) {
        arena.app.world_mut().get_mut::<Transform>(arena.player).unwrap().translation.x = x;
    }

    fn enemy_state(arena: &Arena) -> AiState {
        *arena.app.world().get::<AiState>(arena.enemy).unwrap()
    }

    fn projectile_count(arena: &mut Arena) -> usize {
        let world = arena.app.world_mut();
        world.query::<&Projectile>().iter(world).count()
    }

    #[test]
    fn enemy_hunts_then_shoots_then_gives_up() {
        let mut arena = arena();
        advance(&mut arena.app, 16);
        assert_eq!(enemy_state(&arena), AiState::Idle);

        // 150 units away: inside aggression, outside attack range.
        place_player(&mut arena, 150.0);
        advance(&mut arena.app, 16);
        assert_eq!(enemy_state(&arena), AiState::Moving);
        advance(&mut arena.app, 16);
        let velocity = arena.app.world().get::<Velocity>(arena.enemy).unwrap().linvel;
        assert!(velocity.x < 0.0);
        assert!((velocity.length() - 1.5 * 16.0).abs() < 0.01);
        assert!(arena.app.world().get::<Facing>(arena.enemy).unwrap().flip_x);

        place_player(&mut arena, 200.0);
        advance(&mut arena.app, 16);
        assert_eq!(enemy_state(&arena), AiState::Attacking);
        advance(&mut arena.app, 16);
        assert_eq!(arena.app.world().get::<Velocity>(arena.enemy).unwrap().linvel, Vec2::ZERO);
        assert_eq!(projectile_count(&mut arena), 1);

        // Cooldown holds the next shot back.
        advance(&mut arena.app, 16);
        assert_eq!(projectile_count(&mut arena), 1);

        place_player(&mut arena, 50.0);
        advance(&mut arena.app, 16);
        assert_eq!(enemy_state(&arena), AiState::Moving);
        advance(&mut arena.app, 16);
        assert_eq!(enemy_state(&arena), AiState::Idle);
    }

    #[test]
    fn vanished_target_sends_enemy_back_to_idle() {
        let mut arena = arena();
        place_player(&mut arena, 150.0);
        advance(&mut arena.app, 16);
        assert_eq!(enemy_state(&arena), AiState::Moving);

        arena.app.world_mut().despawn(arena.player);
        advance(&mut arena.app, 16);
        assert_eq!(enemy_state(&arena), AiState::Idle);
    }

    #[test]
    fn death_is_terminal_and_announced_once() {
        let mut arena = arena();
        arena.app.world_mut().get_mut::<Health>(arena.enemy).unwrap().take_damage(1000.0);
        arena.app.world_mut().send_event(DeathEvent { entity: arena.enemy });
        arena.app.world_mut().send_event(DeathEvent { entity: arena.enemy });
        advance(&mut arena.app, 16);

        assert_eq!(enemy_state(&arena), AiState::Dead);
        assert!(arena.app.world().entity(arena.enemy).contains::<ColliderDisabled>());
        assert_eq!(recorded::<EnemyDeath>(&arena.app), vec![EnemyDeath { enemy: arena.enemy }]);

        // A target in range does not wake a dead enemy.
        place_player(&mut arena, 280.0);
        advance(&mut arena.app, 16);
        assert_eq!(enemy_state(&arena), AiState::Dead);

        // Death clip is one second long.
        advance(&mut arena.app, 1000);
        advance(&mut arena.app, 16);
        assert!(!arena.app.world().entities().contains(arena.enemy));
        assert_eq!(recorded::<EnemyDeath>(&arena.app).len(), 1);
    }
}
