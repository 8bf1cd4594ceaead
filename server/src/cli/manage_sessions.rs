use crate::auth_session::SessionToken;
use crate::cli_error::CliError;
use crate::data_store::auth_token::AccessRole;
use crate::data_store::UserId;
use crate::setup::get_secret_from_env;

/// Print a signed session token for the given user, as the authentication provider would issue it.
///
/// This is meant for development and administration, when the authentication provider is not at
/// hand.
pub fn issue_session_token(user_id: UserId, admin: bool) -> Result<(), CliError> {
    let secret = get_secret_from_env()?;
    let role = if admin {
        AccessRole::Admin
    } else {
        AccessRole::User
    };
    let token = SessionToken::new(user_id, role);
    println!("{}", token.as_string(&secret));
    Ok(())
}
