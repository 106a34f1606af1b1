//! Tween configuration errors

use thiserror::Error;

/// Errors raised while configuring a tween
///
/// These are programmer errors: the caller fixes the parameters and builds
/// the tween again.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No duration was given
    #[error("tween duration is missing, pass at least a duration in milliseconds")]
    MissingDuration,

    /// Duration is zero, negative or not finite
    #[error("tween duration must be a positive number of milliseconds, got {0}")]
    InvalidDuration(f64),

    /// Properties were given but there is no live target to write them to
    #[error("tween animates {0} properties but has no target")]
    MissingTarget(usize),

    /// The target cannot read the named property
    #[error("target has no numeric property `{0}`")]
    UnknownProperty(String),

    /// Named ease is not in the ease registry
    #[error("ease `{0}` is not registered")]
    UnknownEase(String),

    /// A reserved `$` key that is not a known option
    #[error("unknown tween option `{0}`")]
    UnknownOption(String),

    /// A parameter has the wrong kind of value
    #[error("parameter `{key}` expects {expected}")]
    InvalidValue { key: String, expected: &'static str },
}

/// Result type for tween configuration
pub type Result<T> = std::result::Result<T, ConfigError>;
