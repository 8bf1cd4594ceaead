//! Implementation of the command line subcommands, apart from `serve`, which is implemented in
//! [crate::web].

pub mod database_migration;
pub mod manage_reservations;
pub mod manage_sessions;

/// Key for creating [crate::data_store::auth_token::AuthToken]s with full privileges for command
/// line functionality. It can only be created from within the cli module and the web server
/// startup.
pub struct CliAuthTokenKey {
    _private: (),
}

impl CliAuthTokenKey {
    #[allow(clippy::new_without_default)] // We always want to explicitly create these objects
    pub fn new() -> Self {
        Self { _private: () }
    }
}
