//! Crate-wide error type.
//!
//! Every failure in the core is a validation-time failure surfaced
//! immediately to the caller; nothing is transient, so nothing is retried.
//! Each variant carries a message that names the offending field.

/// Errors produced by the core and the I/O layer.
#[derive(Clone, PartialEq)]
pub enum AppError {
    /// Non-positive or contradictory bore/stroke/displacement/cylinder inputs.
    InvalidGeometry(String),
    /// Malformed load-profile control points.
    InvalidProfile(String),
    /// Non-monotonic or non-positive RPM sweep bounds.
    InvalidRange(String),
    /// Unsupported fuel identifier or non-positive density/BSFC.
    InvalidFuel(String),
    /// Match was given no target and no fixed peak BMEP.
    UnderspecifiedTarget(String),
    /// Design sweep has no combinations to try.
    EmptySearchSpace(String),
    /// Missing or non-positive vehicle/drivetrain parameters.
    InvalidVehicle(String),
    /// Preset name not found in the built-in tables.
    UnknownPreset(String),
    /// File read/write/parse failure in the persistence layer.
    Io(String),
}

impl AppError {
    /// Process exit code for the CLI: validation errors exit 2, I/O errors 3.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Io(_) => 3,
            _ => 2,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AppError::InvalidGeometry(_) => "invalid geometry",
            AppError::InvalidProfile(_) => "invalid profile",
            AppError::InvalidRange(_) => "invalid range",
            AppError::InvalidFuel(_) => "invalid fuel",
            AppError::UnderspecifiedTarget(_) => "underspecified target",
            AppError::EmptySearchSpace(_) => "empty search space",
            AppError::InvalidVehicle(_) => "invalid vehicle",
            AppError::UnknownPreset(_) => "unknown preset",
            AppError::Io(_) => "io error",
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::InvalidGeometry(m)
            | AppError::InvalidProfile(m)
            | AppError::InvalidRange(m)
            | AppError::InvalidFuel(m)
            | AppError::UnderspecifiedTarget(m)
            | AppError::EmptySearchSpace(m)
            | AppError::InvalidVehicle(m)
            | AppError::UnknownPreset(m)
            | AppError::Io(m) => m,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label(), self.message())
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.label())
            .field("message", &self.message())
            .finish()
    }
}

impl std::error::Error for AppError {}
