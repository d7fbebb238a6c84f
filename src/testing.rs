//! Helpers for headless app tests.
//!
//! Apps built here have no `TimePlugin`; each step advances `Time` by an
//! exact amount so timer-driven behaviour is reproducible.

use std::time::Duration;

use bevy::prelude::*;
use bevy_rapier2d::prelude::CollisionEvent;

use crate::core::register_event_bus;

/// Every event of type `E` seen so far.
#[derive(Resource)]
pub struct EventLog<E: Event>(pub Vec<E>);

impl<E: Event> Default for EventLog<E> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

/// App with the event bus, a manual clock and the collision event channel.
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.init_resource::<Time>();
    register_event_bus(&mut app);
    app.add_event::<CollisionEvent>();
    app
}

/// Advance the clock by `millis` and run one frame.
pub fn advance(app: &mut App, millis: u64) {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_millis(millis));
    app.update();
}

/// Start recording events of type `E`.
pub fn record_events<E: Event + Clone>(app: &mut App) {
    app.init_resource::<EventLog<E>>()
        .add_systems(Last, collect_events::<E>);
}

fn collect_events<E: Event + Clone>(mut reader: EventReader<E>, mut log: ResMut<EventLog<E>>) {
    log.0.extend(reader.read().cloned());
}

/// Events of type `E` recorded since [`record_events`].
pub fn recorded<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world().resource::<EventLog<E>>().0.clone()
}

/// A started collision between two entities.
pub fn collision(a: Entity, b: Entity) -> CollisionEvent {
    CollisionEvent::Started(a, b, bevy_rapier2d::rapier::geometry::CollisionEventFlags::empty())
}

/// A stopped collision between two entities.
pub fn separation(a: Entity, b: Entity) -> CollisionEvent {
    CollisionEvent::Stopped(a, b, bevy_rapier2d::rapier::geometry::CollisionEventFlags::empty())
}
