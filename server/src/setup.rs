use crate::data_store::BookingConflictMode;
use std::env;
use std::env::VarError;
use std::fmt::{Display, Formatter};

/// Get the database URL from the environment variable.
pub fn get_database_url_from_env() -> Result<String, SetupError> {
    env::var("DATABASE_URL").map_err(|e| SetupError::from_env_error(e, "DATABASE_URL"))
}

/// Get the cryptographic application secret for verifying session tokens from the environment
/// variable. The secret is shared with the authentication provider, which signs the tokens.
pub fn get_secret_from_env() -> Result<String, SetupError> {
    env::var("SECRET").map_err(|e| SetupError::from_env_error(e, "SECRET"))
}

/// Get the web server TCP listening port from the environment variable
pub fn get_listen_port_from_env() -> Result<u16, SetupError> {
    env::var("LISTEN_PORT")
        .map_err(|e| SetupError::from_env_error(e, "LISTEN_PORT"))
        .and_then(|v| {
            v.parse().map_err(|_| SetupError::EnvVariableInvalid {
                variable_name: "LISTEN_PORT",
                problem: "Not a valid uint16",
            })
        })
}

/// Get the web server TCP listening interface address from the environment variable
pub fn get_listen_address_from_env() -> Result<String, SetupError> {
    env::var("LISTEN_ADDRESS").map_err(|e| SetupError::from_env_error(e, "LISTEN_ADDRESS"))
}

/// Get the booking conflict policy from the optional environment variable
/// BOOKING_CONFLICT_MODE ("advisory" or "strict"). Defaults to advisory.
pub fn get_booking_conflict_mode_from_env() -> Result<BookingConflictMode, SetupError> {
    match env::var("BOOKING_CONFLICT_MODE") {
        Err(VarError::NotPresent) => Ok(BookingConflictMode::default()),
        Err(e) => Err(SetupError::from_env_error(e, "BOOKING_CONFLICT_MODE")),
        Ok(v) => parse_booking_conflict_mode(&v),
    }
}

fn parse_booking_conflict_mode(value: &str) -> Result<BookingConflictMode, SetupError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "advisory" => Ok(BookingConflictMode::Advisory),
        "strict" => Ok(BookingConflictMode::Strict),
        _ => Err(SetupError::EnvVariableInvalid {
            variable_name: "BOOKING_CONFLICT_MODE",
            problem: "Must be 'advisory' or 'strict'",
        }),
    }
}

#[derive(Debug)]
pub enum SetupError {
    EnvVariableMissing {
        variable_name: &'static str,
    },
    EnvVariableInvalid {
        variable_name: &'static str,
        problem: &'static str,
    },
}

impl SetupError {
    fn from_env_error(error: VarError, variable_name: &'static str) -> Self {
        match error {
            VarError::NotPresent => Self::EnvVariableMissing { variable_name },
            VarError::NotUnicode(_) => Self::EnvVariableInvalid {
                variable_name,
                problem: "no valid unicode",
            },
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::EnvVariableMissing { variable_name } => {
                write!(f, "Environment variable {} must be defined", variable_name)
            }
            SetupError::EnvVariableInvalid {
                variable_name,
                problem,
            } => write!(
                f,
                "Value of environment variable {} is invalid: {}",
                variable_name, problem
            ),
        }
    }
}

impl std::error::Error for SetupError {}
