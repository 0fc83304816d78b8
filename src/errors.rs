use thiserror::Error;

#[derive(Debug, Error)]
pub enum TwinError {
    #[error("Request was considered invalid due to input error: {0}")]
    InvalidInput(#[from] InputError),
    #[error("Request referred to an unknown or invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),
}

/// Shape and value problems with caller-supplied series. These are always detected before any
/// integration step runs.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InputError {
    #[error("The {series} series is empty; at least one timestep is required")]
    Empty { series: &'static str },
    #[error("The {series} series has {actual} values but {expected} were expected")]
    MismatchedLength {
        series: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("The {series} series has a non-finite value ({value}) at index {index}")]
    NonFinite {
        series: &'static str,
        index: usize,
        value: f64,
    },
    #[error("{name} must be a finite number, got {value}")]
    NonFiniteScalar { name: &'static str, value: f64 },
    #[error("Timestep must be a positive number of seconds")]
    NonPositiveTimestep,
    #[error("Timestamps must advance by {expected} s, but advanced by {actual} s at index {index}")]
    IrregularTimestep {
        index: usize,
        expected: i64,
        actual: i64,
    },
    #[error("Timestamp {timestamp} leaves no room for the end of its step")]
    TimestampOutOfRange { timestamp: i64 },
    #[error("Optimization horizon is empty; forecasts must cover at least one step")]
    EmptyHorizon,
    #[error("The {series} history has {actual} samples but at least {required} are needed")]
    InsufficientHistory {
        series: &'static str,
        required: usize,
        actual: usize,
    },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Unknown scenario type: '{0}'")]
    UnknownScenarioType(String),
    #[error("Unknown HVAC mode code: {0} (expected 0=off, 1=heat, 2=cool or 3=auto)")]
    UnknownHvacMode(u8),
    #[error("Invalid parameters for {scenario_type} scenario: {reason}")]
    InvalidScenarioParameters {
        scenario_type: &'static str,
        reason: String,
    },
    #[error("Invalid {subject}: {reason}")]
    InvalidParameters {
        subject: &'static str,
        reason: String,
    },
    #[error("No preset scenario with id '{0}'")]
    UnknownPreset(String),
}

impl ConfigurationError {
    pub(crate) fn invalid_parameters(subject: &'static str, errors: impl ToString) -> Self {
        Self::InvalidParameters {
            subject,
            reason: errors.to_string(),
        }
    }
}
