//! Player spawning, movement, weapons and death.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use super::components::*;
use crate::combat::{spawn_projectile, Dead, EnemyContacts, FireResult, Health, Loadout, ProjectileOrigin};
use crate::core::{
    AmmoCount, AnimationKey, Animator, DeathEvent, Facing, GameEnd, GameStatus, PlaySound, PlayerFire,
    PlayerHp, PlayerReload, SessionOutcome, SoundCue, WeaponKind, WeaponSwap,
};
use crate::world::{EncounterConfig, LevelEntity};

/// Spawn the player entity.
pub fn spawn_player(commands: &mut Commands, position: Vec2, config: &EncounterConfig) -> Entity {
    commands
        .spawn((
            Player,
            Health::new(config.player.max_health),
            EnemyContacts::default(),
            Loadout::new(config.pistol.clone(), config.auto_rifle.clone()),
            Animator::default(),
            Facing::default(),
            Transform::from_translation(position.extend(1.0)),
            LevelEntity,
        ))
        .insert((
            RigidBody::Dynamic,
            Collider::ball(config.player.body_radius),
            Velocity::zero(),
            LockedAxes::ROTATION_LOCKED,
            GravityScale(0.0),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

/// Publish the starting loadout and health once the player exists, so the
/// HUD has something to show before the first shot.
pub fn announce_loadout(
    query: Query<(&Loadout, &Health), Added<Player>>,
    mut swap_events: EventWriter<WeaponSwap>,
    mut hp_events: EventWriter<PlayerHp>,
    mut ammo_events: EventWriter<AmmoCount>,
) {
    for (loadout, health) in query.iter() {
        let weapon = loadout.active();
        swap_events.send(WeaponSwap {
            weapon: weapon.kind(),
            clip: weapon.clip(),
            ammo: weapon.ammo(),
        });
        hp_events.send(PlayerHp {
            current: health.current,
        });
        ammo_events.send(AmmoCount { ammo: weapon.ammo() });
    }
}

/// Move the player along the input axis at constant speed.
pub fn player_movement(
    input: Res<PlayerInput>,
    config: Res<EncounterConfig>,
    mut player_query: Query<(&mut Velocity, &mut Animator, &mut Facing), (With<Player>, Without<Dead>)>,
) {
    let Ok((mut velocity, mut animator, mut facing)) = player_query.get_single_mut() else {
        return;
    };

    let direction = input.move_axis.normalize_or_zero();
    velocity.linvel = direction * config.player.move_speed;
    if direction != Vec2::ZERO {
        facing.look_along(direction);
        if !animator.is_playing() {
            animator.play(AnimationKey::PlayerRun, false);
        }
    }
}

fn fire_cue(kind: WeaponKind) -> SoundCue {
    match kind {
        WeaponKind::Pistol => SoundCue::PistolFire,
        WeaponKind::AutoRifle => SoundCue::AutoRifleFire,
    }
}

/// Swap, reload and fire the player's weapons.
#[allow(clippy::too_many_arguments)]
pub fn player_weapons(
    mut commands: Commands,
    time: Res<Time>,
    mut input: ResMut<PlayerInput>,
    mut player_query: Query<(&Transform, &mut Loadout, &mut Animator, &mut Facing), (With<Player>, Without<Dead>)>,
    mut fire_events: EventWriter<PlayerFire>,
    mut reload_events: EventWriter<PlayerReload>,
    mut swap_events: EventWriter<WeaponSwap>,
    mut ammo_events: EventWriter<AmmoCount>,
    mut sounds: EventWriter<PlaySound>,
) {
    let swap = std::mem::take(&mut input.swap_pressed);
    let reload = std::mem::take(&mut input.reload_pressed);

    let Ok((transform, mut loadout, mut animator, mut facing)) = player_query.get_single_mut() else {
        return;
    };

    if swap {
        loadout.swap();
        let weapon = loadout.active();
        swap_events.send(WeaponSwap {
            weapon: weapon.kind(),
            clip: weapon.clip(),
            ammo: weapon.ammo(),
        });
        sounds.send(PlaySound::now(SoundCue::WeaponSwap));
    }

    if reload {
        let weapon = loadout.active_mut();
        weapon.reload();
        reload_events.send(PlayerReload {
            clip_loaded: weapon.clip(),
        });
        sounds.send(PlaySound::now(SoundCue::WeaponSwap));
        animator.play(AnimationKey::PlayerAttack, true);
    }

    if !input.fire {
        return;
    }
    let Some(aim) = input.aim else {
        return;
    };
    let position = transform.translation.truncate();
    let direction = (aim - position).normalize_or_zero();
    if direction == Vec2::ZERO {
        return;
    }
    facing.look_along(direction);

    let weapon = loadout.active_mut();
    match weapon.try_fire(time.elapsed()) {
        FireResult::Fired => {
            spawn_projectile(
                &mut commands,
                position,
                direction,
                weapon.stats().projectile(),
                ProjectileOrigin::Player,
            );
            fire_events.send(PlayerFire {
                clip_remaining: weapon.clip(),
            });
            if let Some(ammo) = weapon.ammo() {
                ammo_events.send(AmmoCount { ammo: Some(ammo) });
            }
            sounds.send(PlaySound::now(fire_cue(weapon.kind())));
            animator.play(AnimationKey::PlayerAttack, true);
        }
        FireResult::Empty => {
            sounds.send(PlaySound::now(SoundCue::NoAmmo));
        }
        FireResult::Cooling => {}
    }
}

/// The player running out of health loses the session.
pub fn handle_player_death(
    mut death_events: EventReader<DeathEvent>,
    player_query: Query<(), With<Player>>,
    mut outcome: ResMut<SessionOutcome>,
    mut game_end: EventWriter<GameEnd>,
) {
    for event in death_events.read() {
        if !player_query.contains(event.entity) {
            continue;
        }
        if outcome.conclude(GameStatus::Lose) {
            info!("Player died");
            game_end.send(GameEnd {
                status: GameStatus::Lose,
            });
        }
    }
}
