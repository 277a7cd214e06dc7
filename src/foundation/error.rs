/// Crate-wide result alias.
pub type GazeloopResult<T> = Result<T, GazeloopError>;

#[derive(thiserror::Error, Debug)]
/// Errors returned by fallible constructors and commands.
///
/// Runtime playback faults (ray misses, backend desync, dropped frames) are logged and counted
/// rather than returned.
pub enum GazeloopError {
    /// Authored data or configuration violates an invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Gaze or viewport geometry could not be resolved.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// A playback command could not be applied.
    #[error("playback error: {0}")]
    Playback(String),

    /// Configuration (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Opaque error from a collaborator.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GazeloopError {
    /// Build a [`GazeloopError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GazeloopError::Geometry`].
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`GazeloopError::Playback`].
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Build a [`GazeloopError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
