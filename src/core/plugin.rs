//! Core plugin that sets up game states, the event bus, and session flow.

use bevy::prelude::*;

use super::events::*;
use super::states::*;

/// Ordering of the encounter simulation inside `Update`.
///
/// Attribution runs before combat so an `EnemyAdded` is always handled before
/// any `EnemyDeath` for the same enemy.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EncounterSet {
    /// Player input: movement, weapons, pickups
    Input,
    /// Spawner timers
    Spawn,
    /// Rooms claim freshly spawned enemies
    Attribution,
    /// Enemy state machine
    Ai,
    /// Projectiles, hits, damage, deaths
    Combat,
    /// Room activation, door locks, clearance, victory
    Rooms,
    /// Despawning finished entities
    Cleanup,
}

/// Core plugin - must be added first as other plugins depend on it.
///
/// This plugin sets up:
/// - Game states (Loading, InGame, GameOver, GenerationFailed)
/// - The event bus topics
/// - Session flow: Loading hands over to InGame, GameEnd freezes the game,
///   RestartRequested goes back through Loading
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        register_event_bus(app);

        app.init_state::<GameState>()
            .init_resource::<SessionOutcome>()
            .configure_sets(
                Update,
                (
                    EncounterSet::Input,
                    EncounterSet::Spawn,
                    EncounterSet::Attribution,
                    EncounterSet::Ai,
                    EncounterSet::Combat,
                    EncounterSet::Rooms,
                    EncounterSet::Cleanup,
                )
                    .chain()
                    .run_if(in_state(GameState::InGame)),
            )
            .add_systems(
                OnEnter(GameState::Loading),
                (reset_event_bus, begin_session).chain(),
            )
            .add_systems(
                Update,
                enter_game_over
                    .after(EncounterSet::Cleanup)
                    .run_if(in_state(GameState::InGame)),
            )
            .add_systems(
                Update,
                handle_restart_request.run_if(not(in_state(GameState::Loading))),
            );
    }
}

/// Register every bus topic on the app.
pub fn register_event_bus(app: &mut App) {
    app.add_event::<EnemyAdded>()
        .add_event::<EnemyDeath>()
        .add_event::<RoomCleared>()
        .add_event::<PlayerHp>()
        .add_event::<AmmoCount>()
        .add_event::<PlayerFire>()
        .add_event::<PlayerReload>()
        .add_event::<WeaponSwap>()
        .add_event::<GameEnd>()
        .add_event::<ChestLoot>()
        .add_event::<DamageEvent>()
        .add_event::<DeathEvent>()
        .add_event::<ImpactEffect>()
        .add_event::<PlaySound>()
        .add_event::<RestartRequested>();
}

/// Drop anything still queued from the previous session.
fn reset_event_bus(world: &mut World) {
    clear_topic::<EnemyAdded>(world);
    clear_topic::<EnemyDeath>(world);
    clear_topic::<RoomCleared>(world);
    clear_topic::<PlayerHp>(world);
    clear_topic::<AmmoCount>(world);
    clear_topic::<PlayerFire>(world);
    clear_topic::<PlayerReload>(world);
    clear_topic::<WeaponSwap>(world);
    clear_topic::<GameEnd>(world);
    clear_topic::<ChestLoot>(world);
    clear_topic::<DamageEvent>(world);
    clear_topic::<DeathEvent>(world);
    clear_topic::<ImpactEffect>(world);
    clear_topic::<PlaySound>(world);
    clear_topic::<RestartRequested>(world);

    if let Some(mut outcome) = world.get_resource_mut::<SessionOutcome>() {
        outcome.reset();
    }
}

fn clear_topic<E: Event>(world: &mut World) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        events.clear();
    }
}

/// Config is read on entering Loading; once that is done the level can be
/// built.
fn begin_session(mut next_state: ResMut<NextState<GameState>>) {
    next_state.set(GameState::InGame);
}

fn enter_game_over(
    mut game_end: EventReader<GameEnd>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if let Some(event) = game_end.read().last() {
        info!("Session ended: {:?}", event.status);
        next_state.set(GameState::GameOver);
    }
}

fn handle_restart_request(
    mut restarts: EventReader<RestartRequested>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if restarts.read().last().is_some() {
        info!("Restart requested, rebuilding level");
        next_state.set(GameState::Loading);
    }
}
