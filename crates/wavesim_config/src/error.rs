//! Error types for circuit file loading and validation.

use wavesim_sim::SimError;

/// Errors that can occur when loading or validating a circuit file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the circuit file.
    #[error("failed to read circuit file: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse circuit file: {0}")]
    ParseError(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The described circuit was rejected by the simulator.
    #[error(transparent)]
    Sim(#[from] SimError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error() {
        let err = ConfigError::ParseError("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse circuit file: expected '=' at line 3"
        );
    }

    #[test]
    fn display_validation_error() {
        let err = ConfigError::ValidationError("CLK has both a clock and a stimulus".to_string());
        assert_eq!(
            format!("{err}"),
            "validation error: CLK has both a clock and a stimulus"
        );
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::IoError(io_err);
        assert!(format!("{err}").starts_with("failed to read circuit file:"));
    }

    #[test]
    fn sim_errors_pass_through() {
        let err: ConfigError = SimError::UnknownSignal("EN".into()).into();
        assert_eq!(format!("{err}"), SimError::UnknownSignal("EN".into()).to_string());
    }
}
