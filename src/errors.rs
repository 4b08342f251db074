// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera controls backend

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Top-level error used by the command-line front end
#[derive(Debug, Clone)]
pub enum AppError {
    /// Device control gateway errors
    Gateway(GatewayError),
    /// Effects pipeline errors
    Pipeline(PipelineError),
    /// Configuration errors
    Config(ConfigError),
    /// Generic error with message
    Other(String),
}

/// Errors reported by a [`ControlGateway`](crate::backends::camera::ControlGateway)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The enumeration mechanism itself could not be used (tool missing,
    /// spawn failure, timeout). Retryable on demand.
    Discovery(String),
    /// The named control is not present on the device at call time
    ControlUnavailable { device: String, control: String },
    /// The device refused a control write
    WriteRejected {
        control: String,
        value: i64,
        reason: String,
    },
}

/// Errors reported by the effects pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A position outside `0..len` was passed in
    PositionOutOfRange { position: usize, len: usize },
    /// The control name is not listed for the active device
    UnknownControl(String),
    /// No device is selected
    NoDevice,
    /// A gateway call made on behalf of the pipeline failed
    Gateway(GatewayError),
}

/// Configuration loading errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read
    Read { path: String, reason: String },
    /// The config file is not valid JSON for [`Config`](crate::config::Config)
    Parse { path: String, reason: String },
    /// The tool command is empty
    EmptyToolCommand,
}

impl GatewayError {
    /// Whether the error only affects a single control and the session can
    /// carry on unchanged
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GatewayError::Discovery(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Gateway(e) => write!(f, "Device error: {}", e),
            AppError::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Discovery(msg) => write!(f, "Device discovery failed: {}", msg),
            GatewayError::ControlUnavailable { device, control } => {
                write!(f, "Control '{}' is not available on {}", control, device)
            }
            GatewayError::WriteRejected {
                control,
                value,
                reason,
            } => write!(f, "Setting {}={} was rejected: {}", control, value, reason),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::PositionOutOfRange { position, len } => {
                write!(f, "Effect position {} out of range (length {})", position, len)
            }
            PipelineError::UnknownControl(name) => {
                write!(f, "Control '{}' is not listed for the active device", name)
            }
            PipelineError::NoDevice => write!(f, "No camera selected"),
            PipelineError::Gateway(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, reason } => {
                write!(f, "Failed to read {}: {}", path, reason)
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "Failed to parse {}: {}", path, reason)
            }
            ConfigError::EmptyToolCommand => write!(f, "tool_command must not be empty"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for GatewayError {}
impl std::error::Error for PipelineError {}
impl std::error::Error for ConfigError {}

impl From<GatewayError> for PipelineError {
    fn from(err: GatewayError) -> Self {
        PipelineError::Gateway(err)
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err)
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Gateway(e) => AppError::Gateway(e),
            other => AppError::Pipeline(other),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_is_not_recoverable() {
        assert!(!GatewayError::Discovery("v4l2-ctl not found".into()).is_recoverable());
        assert!(
            GatewayError::WriteRejected {
                control: "zoom_absolute".into(),
                value: 300,
                reason: "Permission denied".into(),
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_pipeline_gateway_error_unwraps_into_app_error() {
        let err = PipelineError::Gateway(GatewayError::ControlUnavailable {
            device: "/dev/video0".into(),
            control: "gain".into(),
        });
        assert!(matches!(AppError::from(err), AppError::Gateway(_)));
        assert!(matches!(
            AppError::from(PipelineError::NoDevice),
            AppError::Pipeline(PipelineError::NoDevice)
        ));
    }

    #[test]
    fn test_display_messages() {
        let err = PipelineError::PositionOutOfRange {
            position: 4,
            len: 2,
        };
        assert_eq!(err.to_string(), "Effect position 4 out of range (length 2)");

        let err = GatewayError::ControlUnavailable {
            device: "/dev/video2".into(),
            control: "zoom_absolute".into(),
        };
        assert_eq!(
            err.to_string(),
            "Control 'zoom_absolute' is not available on /dev/video2"
        );
    }
}
