use thiserror::Error;

/// Errors that can arise while acting on the world graph.
///
/// The first three variants are the player-facing taxonomy: they are recovered
/// at the dispatch boundary, shown to the acting living, and never escape one
/// command's handling. `StoryComplete` is a control signal rather than a
/// failure: it ends normal processing of the triggering command and hands
/// control to the end-game callback.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Problem with a command's arguments (missing or ambiguous). Shown to the
    /// actor verbatim. No state change has happened.
    #[error("{0}")]
    Parse(String),

    /// A game-logic refusal with a narrative message. No state change has
    /// happened.
    #[error("{0}")]
    ActionRefused(String),

    /// The actor lacks a required privilege. Reported as a refusal and
    /// audit-logged. No state change has happened.
    #[error("security violation: {0}")]
    SecurityViolation(String),

    /// Not an error: the story has been completed by the triggering action.
    /// The actor's final movement has already been recorded when this is
    /// raised.
    #[error("story complete")]
    StoryComplete,

    /// An entity id did not resolve in the registry. Indicates a broken
    /// cross-reference, not a player mistake.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Snapshot save/load failure. Aborts only the triggering operation,
    /// never the running simulation.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}
