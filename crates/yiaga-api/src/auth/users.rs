//! Identity records and the credential store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use yiaga_core::{
    Collection, Record, RecordMeta, Store, StoreError, ValidationError,
    validation::{email_in_domain, normalize_email, require},
};

use super::{AuthError, password};
use crate::error::ApiError;

/// User role for access control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full administrative access.
    Admin,
    /// Content editor.
    Editor,
    /// Technical staff.
    Technical,
    /// Registered public user.
    #[default]
    User,
}

impl UserRole {
    /// Roles that may only be held by organisation email addresses.
    #[must_use]
    pub const fn requires_org_email(self) -> bool {
        matches!(self, Self::Admin | Self::Technical)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Editor => write!(f, "editor"),
            Self::Technical => write!(f, "technical"),
            Self::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "technical" => Ok(Self::Technical),
            "user" => Ok(Self::User),
            _ => Err(ValidationError::Invalid {
                field: "role",
                reason: format!("unknown role: {s}"),
            }),
        }
    }
}

/// User account as stored.
///
/// Only [`PublicUser`] is ever serialized into a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Record bookkeeping.
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Username, unique.
    pub username: String,
    /// Normalized email, unique.
    pub email: String,
    /// Argon2 password digest.
    pub password_hash: String,
    /// User role.
    pub role: UserRole,
}

impl Record for User {
    const COLLECTION: &'static str = "users";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            ("username", self.username.clone()),
            ("email", self.email.clone()),
        ]
    }
}

impl User {
    /// Create a safe version of user for API responses (no password hash).
    #[must_use]
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.meta.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.meta.created_at,
            updated_at: self.meta.updated_at,
        }
    }
}

/// Public user representation (for API responses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    /// User ID.
    pub id: u64,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// User role.
    pub role: UserRole,
    /// When created.
    pub created_at: DateTime<Utc>,
    /// When last modified.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Role; defaults to `user`.
    #[serde(default)]
    pub role: UserRole,
}

/// Partial update for a user. Absent or empty fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    /// New username.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New plaintext password.
    pub password: Option<String>,
    /// New role name, parsed once known to be non-empty.
    pub role: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Credential store over the `users` collection.
///
/// Methods that take a password hash it inline, so async callers should run
/// them on the blocking pool.
#[derive(Clone)]
pub struct UserStore {
    users: Collection<User>,
    org_email_domain: String,
}

impl UserStore {
    /// Open the user collection.
    ///
    /// # Errors
    ///
    /// Returns error if the collection cannot be opened.
    pub fn open(store: &Store, org_email_domain: impl Into<String>) -> Result<Self, StoreError> {
        Ok(Self {
            users: store.collection()?,
            org_email_domain: org_email_domain.into(),
        })
    }

    /// Organisation email domain enforced for privileged roles.
    #[must_use]
    pub fn org_email_domain(&self) -> &str {
        &self.org_email_domain
    }

    /// Check the role/domain invariant for a resulting email and role pair.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Invalid` when a privileged role is paired
    /// with an address outside the organisation domain.
    pub fn check_role_email(&self, email: &str, role: UserRole) -> Result<(), ValidationError> {
        if role.requires_org_email() && !email_in_domain(email, &self.org_email_domain) {
            return Err(ValidationError::Invalid {
                field: "email",
                reason: format!(
                    "Admin and Technical users must have a @{} email address",
                    self.org_email_domain
                ),
            });
        }
        Ok(())
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing fields or a role/domain violation,
    /// `Conflict` if the username or email is taken and `Internal` if
    /// hashing or storage fails.
    pub fn create(&self, input: NewUser) -> Result<User, ApiError> {
        let username = input.username.trim().to_string();
        require("username", &username)?;
        require("password", &input.password)?;
        let email = normalize_email(&input.email)?;
        self.check_role_email(&email, input.role)?;

        if self.users.find_by("email", &email)?.is_some() {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let user = User {
            meta: RecordMeta::default(),
            username,
            email,
            password_hash: password::hash(&input.password)?,
            role: input.role,
        };
        let user = self.users.insert(user)?;

        tracing::info!(user_id = user.meta.id, role = %user.role, "User created");
        Ok(user)
    }

    /// Public self-registration: always creates a `user`.
    ///
    /// # Errors
    ///
    /// Same as [`UserStore::create`].
    pub fn signup(&self, username: String, email: String, password: String) -> Result<User, ApiError> {
        self.create(NewUser {
            username,
            email,
            password,
            role: UserRole::User,
        })
    }

    /// Check credentials and return the matching user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password, without saying which.
    pub fn authenticate(&self, email: &str, plaintext: &str) -> Result<User, ApiError> {
        let Ok(email) = normalize_email(email) else {
            return Err(AuthError::InvalidCredentials.into());
        };

        match self.users.find_by("email", &email)? {
            Some(user) if password::verify(plaintext, &user.password_hash) => Ok(user),
            _ => Err(AuthError::InvalidCredentials.into()),
        }
    }

    /// Apply a partial update.
    ///
    /// The role/domain invariant is checked against the resulting email and
    /// role, whichever of them changed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, `Validation` for a bad email or
    /// role/domain violation and `Conflict` for a taken username or email.
    pub fn update(&self, id: u64, changes: UserUpdate) -> Result<User, ApiError> {
        let mut user = self.get(id)?;

        let email = match non_empty(changes.email) {
            Some(email) => normalize_email(&email)?,
            None => user.email.clone(),
        };
        let role = match non_empty(changes.role) {
            Some(raw) => raw.trim().parse::<UserRole>()?,
            None => user.role,
        };
        self.check_role_email(&email, role)?;

        if let Some(username) = non_empty(changes.username) {
            user.username = username.trim().to_string();
        }
        if let Some(plaintext) = non_empty(changes.password) {
            user.password_hash = password::hash(&plaintext)?;
        }
        user.email = email;
        user.role = role;

        let user = self.users.update(user)?;
        tracing::info!(user_id = id, role = %user.role, "User updated");
        Ok(user)
    }

    /// Replace a user's password, looked up by email.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no user has this email.
    pub fn reset_password(&self, email: &str, plaintext: &str) -> Result<User, ApiError> {
        require("password", plaintext)?;
        let user = self
            .find_by_email(email)?
            .ok_or_else(|| ApiError::NotFound(format!("No user with email {email}")))?;
        self.update(
            user.meta.id,
            UserUpdate {
                password: Some(plaintext.to_string()),
                ..UserUpdate::default()
            },
        )
    }

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn get(&self, id: u64) -> Result<User, ApiError> {
        self.users
            .get(id)?
            .ok_or_else(|| ApiError::NotFound(format!("User {id} not found")))
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let Ok(email) = normalize_email(email) else {
            return Ok(None);
        };
        Ok(self.users.find_by("email", &email)?)
    }

    /// Delete a user by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn delete(&self, id: u64) -> Result<(), ApiError> {
        if self.users.delete(id)? {
            tracing::info!(user_id = id, "User deleted");
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("User {id} not found")))
        }
    }

    /// All users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if storage fails.
    pub fn list(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.users.list()?)
    }

    /// Count total users.
    #[must_use]
    pub fn count(&self) -> usize {
        self.users.count()
    }

    /// Check if any users exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("org_email_domain", &self.org_email_domain)
            .field("user_count", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_store() -> UserStore {
        UserStore::open(&Store::temporary().unwrap(), "yiaga.org").unwrap()
    }

    fn new_user(username: &str, email: &str, role: UserRole) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            role,
        }
    }

    #[test]
    fn test_role_parse_display() {
        assert_eq!("Technical".parse::<UserRole>().unwrap(), UserRole::Technical);
        assert!("operator".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Editor.to_string(), "editor");
        assert!(UserRole::Admin.requires_org_email());
        assert!(!UserRole::Editor.requires_org_email());
    }

    #[test]
    fn test_create_and_authenticate() {
        let store = create_store();
        let user = store
            .create(new_user("ada", " Ada@Yiaga.org ", UserRole::Admin))
            .unwrap();
        assert_eq!(user.email, "ada@yiaga.org");
        assert_ne!(user.password_hash, "secret123");

        let found = store.authenticate("ADA@yiaga.org", "secret123").unwrap();
        assert_eq!(found.meta.id, user.meta.id);

        assert!(matches!(
            store.authenticate("ada@yiaga.org", "wrong"),
            Err(ApiError::Auth(AuthError::InvalidCredentials))
        ));
        assert!(matches!(
            store.authenticate("nobody@yiaga.org", "secret123"),
            Err(ApiError::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[test]
    fn test_privileged_role_requires_org_email() {
        let store = create_store();
        for role in [UserRole::Admin, UserRole::Technical] {
            let result = store.create(new_user("x", "x@gmail.com", role));
            assert!(matches!(result, Err(ApiError::Validation(_))));
        }
        assert!(store.is_empty());

        assert!(store.create(new_user("ed", "ed@gmail.com", UserRole::Editor)).is_ok());
    }

    #[test]
    fn test_update_checks_resulting_combination() {
        let store = create_store();
        let editor = store
            .create(new_user("ed", "ed@gmail.com", UserRole::Editor))
            .unwrap();
        let admin = store
            .create(new_user("ada", "ada@yiaga.org", UserRole::Admin))
            .unwrap();

        // Role change alone, current email outside the domain.
        let promote = UserUpdate {
            role: Some("admin".to_string()),
            ..UserUpdate::default()
        };
        assert!(matches!(
            store.update(editor.meta.id, promote),
            Err(ApiError::Validation(_))
        ));

        // Email change alone, current role privileged.
        let move_out = UserUpdate {
            email: Some("ada@gmail.com".to_string()),
            ..UserUpdate::default()
        };
        assert!(matches!(
            store.update(admin.meta.id, move_out),
            Err(ApiError::Validation(_))
        ));

        // Both together, resulting pair valid.
        let promote_with_email = UserUpdate {
            email: Some("ed@yiaga.org".to_string()),
            role: Some("admin".to_string()),
            ..UserUpdate::default()
        };
        let updated = store.update(editor.meta.id, promote_with_email).unwrap();
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.email, "ed@yiaga.org");

        // Demotion frees the email constraint.
        let demote = UserUpdate {
            email: Some("ada@gmail.com".to_string()),
            role: Some("editor".to_string()),
            ..UserUpdate::default()
        };
        assert!(store.update(admin.meta.id, demote).is_ok());

        assert_eq!(store.get(admin.meta.id).unwrap().email, "ada@gmail.com");
    }

    #[test]
    fn test_update_password_and_username() {
        let store = create_store();
        let user = store
            .create(new_user("ed", "ed@gmail.com", UserRole::Editor))
            .unwrap();

        let changes = UserUpdate {
            username: Some("edwin".to_string()),
            password: Some("new-pass".to_string()),
            ..UserUpdate::default()
        };
        let updated = store.update(user.meta.id, changes).unwrap();
        assert_eq!(updated.username, "edwin");
        assert!(store.authenticate("ed@gmail.com", "new-pass").is_ok());
        assert!(store.authenticate("ed@gmail.com", "secret123").is_err());

        // Empty strings mean "unchanged".
        let blank = UserUpdate {
            username: Some(String::new()),
            email: Some(String::new()),
            password: Some(String::new()),
            role: Some(String::new()),
        };
        let same = store.update(user.meta.id, blank).unwrap();
        assert_eq!(same.username, "edwin");
        assert_eq!(same.email, "ed@gmail.com");
        assert_eq!(same.role, UserRole::Editor);
        assert!(store.authenticate("ed@gmail.com", "new-pass").is_ok());

        let bogus = UserUpdate {
            role: Some("owner".to_string()),
            ..UserUpdate::default()
        };
        assert!(matches!(
            store.update(user.meta.id, bogus),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicates_conflict() {
        let store = create_store();
        store
            .signup("ed".to_string(), "ed@gmail.com".to_string(), "pw".to_string())
            .unwrap();

        let dup_email = store.signup("other".to_string(), "ED@gmail.com".to_string(), "pw".to_string());
        assert!(matches!(dup_email, Err(ApiError::Conflict(_))));

        let dup_name = store.signup("ed".to_string(), "ed2@gmail.com".to_string(), "pw".to_string());
        assert!(matches!(dup_name, Err(ApiError::Conflict(_))));

        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_signup_forces_user_role() {
        let store = create_store();
        let user = store
            .signup("ada".to_string(), "ada@yiaga.org".to_string(), "pw".to_string())
            .unwrap();
        assert_eq!(user.role, UserRole::User);
    }

    #[test]
    fn test_public_view_has_no_hash() {
        let store = create_store();
        let user = store
            .create(new_user("ed", "ed@gmail.com", UserRole::Editor))
            .unwrap();
        let json = serde_json::to_value(user.to_public()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "editor");
    }

    #[test]
    fn test_delete_and_reset() {
        let store = create_store();
        let user = store
            .create(new_user("ed", "ed@gmail.com", UserRole::Editor))
            .unwrap();

        store.reset_password("ed@gmail.com", "fresh").unwrap();
        assert!(store.authenticate("ed@gmail.com", "fresh").is_ok());
        assert!(matches!(
            store.reset_password("none@gmail.com", "x"),
            Err(ApiError::NotFound(_))
        ));

        store.delete(user.meta.id).unwrap();
        assert!(matches!(store.delete(user.meta.id), Err(ApiError::NotFound(_))));
        assert!(store.find_by_email("ed@gmail.com").unwrap().is_none());
    }
}
