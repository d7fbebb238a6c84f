//! Game state definitions that control the overall flow of a session.
//!
//! The encounter systems only run in `InGame`. `GameOver` freezes the world
//! so the HUD can show the result, and `GenerationFailed` is the blocking
//! state entered when no layout could be produced.

use bevy::prelude::*;

use super::events::GameStatus;

/// Main game states.
///
/// - Start in `Loading`, which tears down any previous level and reads config
/// - `InGame` builds the level on entry and runs the simulation
/// - `GameOver` when every room is cleared or the player dies
/// - `GenerationFailed` when layout retries are exhausted
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum GameState {
    #[default]
    Loading,
    InGame,
    GameOver,
    GenerationFailed,
}

/// How the current session ended, if it has.
///
/// The first conclusion wins; later ones (a win and a death on the same
/// frame) are ignored.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome(Option<GameStatus>);

impl SessionOutcome {
    pub fn status(&self) -> Option<GameStatus> {
        self.0
    }

    /// Record the outcome. Returns false if the session had already ended.
    pub fn conclude(&mut self, status: GameStatus) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(status);
        true
    }

    pub fn reset(&mut self) {
        self.0 = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_conclusion_wins() {
        let mut outcome = SessionOutcome::default();
        assert!(outcome.conclude(GameStatus::Win));
        assert!(!outcome.conclude(GameStatus::Lose));
        assert_eq!(outcome.status(), Some(GameStatus::Win));

        outcome.reset();
        assert_eq!(outcome.status(), None);
    }
}
