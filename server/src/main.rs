use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, warn};
use roombook_server::cli;
use roombook_server::cli_error::CliError;

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if let Err(e) = dotenv_result {
        warn!("Could not read .env file: {}", e);
    }

    let result = run_command(args.command);
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve => {
            cli::database_migration::check_migration_state()?;
            roombook_server::web::serve()
        }
        Command::MigrateDb => cli::database_migration::run_migrations(),
        Command::ListPending => cli::manage_reservations::print_pending_reservations(),
        Command::IssueToken { user_id, admin } => {
            cli::manage_sessions::issue_session_token(user_id, admin)
        }
    }
}

/// Room reservation service with review workflow
#[derive(Debug, Parser)]
#[clap(name = "roombook", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the RoomBook REST API
    Serve,
    /// Apply pending database schema migrations
    MigrateDb,
    /// List all reservations awaiting review
    ListPending,
    /// Issue a signed session token for a user, as the authentication provider would do
    IssueToken {
        /// The user's id
        #[clap(long)]
        user_id: uuid::Uuid,
        /// Issue the token with the admin role
        #[clap(long)]
        admin: bool,
    },
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
