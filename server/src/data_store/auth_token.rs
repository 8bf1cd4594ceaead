use crate::auth_session::SessionToken;
use crate::cli::CliAuthTokenKey;
use crate::data_store::{EnumMemberNotExistingError, StoreError, UserId};

/// Authorization token for authorizing access to the data_store on behalf of a specific user
///
/// The AuthToken is the typed principal of a request: it holds the id of the authenticated user
/// (as issued by the external authentication provider) and the user's [AccessRole], which implies
/// specific [Privilege]s.
///
/// This structure is our main protection against accidental unauthorized-access bugs: All
/// data_store access functions require an AuthToken and check it for the required privilege. An
/// AuthToken can only be created from a verified [SessionToken] via [Self::create_for_session] and
/// by cli functions via [Self::create_for_cli].
#[derive(Debug, Clone)]
pub struct AuthToken {
    user_id: UserId,
    role: AccessRole,
}

impl AuthToken {
    /// Create a new AuthToken for a client session, based on the user id and role stored in the
    /// client's [SessionToken].
    ///
    /// The session token must have been verified (see [SessionToken::from_string]) before.
    pub(crate) fn create_for_session(session_token: &SessionToken) -> Self {
        AuthToken {
            user_id: session_token.user_id(),
            role: session_token.role(),
        }
    }

    /// Create a new AuthToken for a command line interface functionality.
    ///
    /// The AuthToken is created with the AccessRole::Admin and the nil user id.
    ///
    /// This function must only be used by command line interface functions, not in the context of
    /// the web server!
    pub fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        AuthToken {
            user_id: uuid::Uuid::nil(),
            role: AccessRole::Admin,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> AccessRole {
        self.role
    }

    /// Check if the AuthToken authorizes for the given `privilege`.
    ///
    /// The actual authorization check is delegated to [Privilege::qualifying_roles].
    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        privilege.qualifying_roles().contains(&self.role)
    }

    /// Check if the AuthToken authorizes for the given `privilege`. If not, return an appropriate
    /// PermissionDenied error.
    pub fn check_privilege(&self, privilege: Privilege) -> Result<(), StoreError> {
        if self.has_privilege(privilege.clone()) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
            })
        }
    }

    /// Check access to a reservation owned by `owner`. Users may always access their own
    /// reservations (given `own_privilege`), others' reservations require `foreign_privilege`.
    pub fn check_reservation_privilege(
        &self,
        owner: UserId,
        own_privilege: Privilege,
        foreign_privilege: Privilege,
    ) -> Result<(), StoreError> {
        if owner == self.user_id {
            self.check_privilege(own_privilege)
        } else {
            self.check_privilege(foreign_privilege)
        }
    }

    /// Get the principal in the API representation.
    pub fn api_authorization_info(&self) -> roombook_api_types::AuthorizationInfo {
        roombook_api_types::AuthorizationInfo {
            user_id: self.user_id,
            role: self.role.into(),
        }
    }
}

/// Possible roles of authenticated users, as asserted by the external authentication provider.
///
/// Each role qualifies for a set of [Privilege]s. See [Privilege::qualifying_roles].
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy)]
#[repr(i32)]
pub enum AccessRole {
    User = 1,
    Admin = 2,
}

impl TryFrom<i32> for AccessRole {
    type Error = EnumMemberNotExistingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AccessRole::User),
            2 => Ok(AccessRole::Admin),
            value => Err(EnumMemberNotExistingError {
                member_value: value.to_string(),
                enum_name: "AccessRole",
            }),
        }
    }
}

impl From<AccessRole> for roombook_api_types::AuthorizationRole {
    fn from(value: AccessRole) -> Self {
        match value {
            AccessRole::User => roombook_api_types::AuthorizationRole::User,
            AccessRole::Admin => roombook_api_types::AuthorizationRole::Admin,
        }
    }
}

impl AccessRole {
    pub fn name(&self) -> &str {
        match self {
            AccessRole::User => "User",
            AccessRole::Admin => "Admin",
        }
    }
}

/// Enum of available authorization privileges.
///
/// Each data_store action and web endpoint typically requires a single privilege.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privilege {
    ShowRooms,
    BookRooms,
    BookRoomsForOthers,
    ShowOwnReservations,
    ShowAllReservations,
    CancelOwnReservations,
    CancelAnyReservation,
    ReviewReservations,
    ManageMasterData,
}

impl Privilege {
    /// Get the list of user [AccessRole]s that qualify for this privilege. Each returned role is
    /// individually sufficient for the privilege.
    ///
    /// This is function is our source of truth for authorization!
    pub fn qualifying_roles(&self) -> &'static [AccessRole] {
        match self {
            Privilege::ShowRooms => &[AccessRole::User, AccessRole::Admin],
            Privilege::BookRooms => &[AccessRole::User, AccessRole::Admin],
            Privilege::BookRoomsForOthers => &[AccessRole::Admin],
            Privilege::ShowOwnReservations => &[AccessRole::User, AccessRole::Admin],
            Privilege::ShowAllReservations => &[AccessRole::Admin],
            Privilege::CancelOwnReservations => &[AccessRole::User, AccessRole::Admin],
            Privilege::CancelAnyReservation => &[AccessRole::Admin],
            Privilege::ReviewReservations => &[AccessRole::Admin],
            Privilege::ManageMasterData => &[AccessRole::Admin],
        }
    }
}
