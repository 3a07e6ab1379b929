//! Explicit runtime configuration.
//!
//! Every tunable is passed through constructors instead of living in
//! ambient globals; this module only defines the shared value types and
//! their defaults.

/// Default tile file extension (without the dot).
pub const DEFAULT_TILE_EXT: &str = "png";

/// Default reference zoom level of the leaf tiles.
pub const DEFAULT_LEAF_ZOOM: u8 = 18;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 1;

/// Console/log verbosity, threaded explicitly from the CLI.
///
/// The numeric scale matches the tool's `-v` flag: 0 only errors, 1 adds
/// warnings, 2 adds progress info, 3 adds debug detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Only error messages.
    Errors,
    /// Errors plus warnings.
    Warnings,
    /// General progress information.
    Info,
    /// Debug detail.
    Debug,
}

impl Verbosity {
    /// Maps the numeric `-v` level onto a verbosity; values above 3 clamp
    /// to `Debug`.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Verbosity::Errors,
            1 => Verbosity::Warnings,
            2 => Verbosity::Info,
            _ => Verbosity::Debug,
        }
    }

    /// Filter directive understood by the tracing subscriber.
    pub fn directive(&self) -> &'static str {
        match self {
            Verbosity::Errors => "error",
            Verbosity::Warnings => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(Verbosity::from_level(0), Verbosity::Errors);
        assert_eq!(Verbosity::from_level(1), Verbosity::Warnings);
        assert_eq!(Verbosity::from_level(2), Verbosity::Info);
        assert_eq!(Verbosity::from_level(3), Verbosity::Debug);
        assert_eq!(Verbosity::from_level(9), Verbosity::Debug);
    }

    #[test]
    fn test_directives() {
        assert_eq!(Verbosity::Errors.directive(), "error");
        assert_eq!(Verbosity::Debug.directive(), "debug");
    }

    #[test]
    fn test_default_matches_cli_default() {
        assert_eq!(Verbosity::default(), Verbosity::Warnings);
    }
}
