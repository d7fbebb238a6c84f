//! Error types for config loading and dungeon generation.

use thiserror::Error;

/// Errors that can occur when loading encounter data.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// File could not be found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// File could not be read.
    #[error("Failed to read file '{path}': {details}")]
    ReadError { path: String, details: String },

    /// RON parsing failed.
    #[error("Parse error in '{path}': {details}")]
    ParseError { path: String, details: String },

    /// Values parsed but cannot be used.
    #[error("Invalid encounter config: {0}")]
    InvalidConfig(String),
}

/// Errors produced while generating a dungeon layout.
///
/// All of them are recoverable: the caller retries with a different seed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutGenerationError {
    /// The generator config can never produce a valid layout.
    #[error("Invalid generator config: {0}")]
    InvalidConfig(String),

    /// Not enough rooms fit into the grid.
    #[error("Placed only {placed} of {required} required rooms after {attempts} attempts")]
    RoomPlacement {
        placed: usize,
        required: usize,
        attempts: u32,
    },

    /// No corridor could join the remaining rooms to the rest of the graph.
    #[error("Room {room} could not be connected to the room graph")]
    Disconnected { room: usize },

    /// Every retry failed.
    #[error("Layout generation failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<LayoutGenerationError>,
    },
}
