//! Account management commands.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use yiaga_api::auth::{NewUser, UserRole, UserStore, setup::generate_password};
use yiaga_core::{Config, Store};

use crate::ui;

/// Length of generated passwords.
const GENERATED_PASSWORD_LEN: usize = 16;

/// Arguments for admin commands.
pub struct AdminArgs {
    /// The admin action to perform.
    pub action: AdminAction,
    /// Data directory override.
    pub data_dir: Option<PathBuf>,
}

/// Admin actions.
pub enum AdminAction {
    /// Create a new user.
    Create {
        username: String,
        email: String,
        password: Option<String>,
        role: String,
        generate_password: bool,
    },
    /// List all users.
    List,
    /// Reset a user's password.
    ResetPassword {
        email: String,
        password: Option<String>,
    },
    /// Delete a user.
    Delete { email: String },
}

/// Run the admin command.
///
/// # Errors
///
/// Returns error if the store cannot be opened or the operation fails.
pub fn run_admin(config: &Config, args: AdminArgs) -> Result<()> {
    let data_dir = args.data_dir.unwrap_or_else(|| config.data_dir());
    std::fs::create_dir_all(&data_dir)?;

    let store = Store::open(&data_dir).with_context(|| {
        format!(
            "Failed to open {} (is the server running?)",
            data_dir.display()
        )
    })?;
    let users = UserStore::open(&store, config.auth.org_email_domain.clone())?;

    match args.action {
        AdminAction::Create {
            username,
            email,
            password,
            role,
            generate_password: gen_pwd,
        } => create_user(&users, username, email, password, &role, gen_pwd)?,
        AdminAction::List => list_users(&users)?,
        AdminAction::ResetPassword { email, password } => {
            reset_password(&users, &email, password)?;
        }
        AdminAction::Delete { email } => delete_user(&users, &email)?,
    }

    store.flush()?;
    Ok(())
}

fn create_user(
    users: &UserStore,
    username: String,
    email: String,
    password: Option<String>,
    role_str: &str,
    gen_pwd: bool,
) -> Result<()> {
    let role: UserRole = role_str.parse().map_err(|_| {
        anyhow!("Invalid role: {role_str}. Use: admin, editor, technical, or user")
    })?;

    let password = if gen_pwd {
        let pwd = generate_password(GENERATED_PASSWORD_LEN);
        ui::success(&format!("Generated password: {pwd}"));
        pwd
    } else {
        password.ok_or_else(|| {
            anyhow!("Password required. Use --password or --generate-password")
        })?
    };

    let user = users
        .create(NewUser {
            username,
            email,
            password,
            role,
        })
        .context("Failed to create user")?;
    tracing::info!(user_id = user.meta.id, role = %user.role, "User created from CLI");

    ui::success(&format!(
        "Created user '{}' <{}> with role '{}'",
        user.username, user.email, user.role
    ));
    Ok(())
}

fn list_users(users: &UserStore) -> Result<()> {
    let users = users.list()?;

    if users.is_empty() {
        ui::info("No users configured.");
        ui::info(
            "Run 'yiaga admin create --username admin --email admin@yiaga.org --generate-password' to create one.",
        );
        return Ok(());
    }

    ui::info(&format!("Users ({}):", users.len()));
    println!();
    println!(
        "{:<6} {:<20} {:<32} {:<10} {:<20}",
        "ID", "USERNAME", "EMAIL", "ROLE", "CREATED"
    );
    println!("{}", "-".repeat(90));

    for user in users {
        let created = user.meta.created_at.format("%Y-%m-%d %H:%M:%S");
        println!(
            "{:<6} {:<20} {:<32} {:<10} {:<20}",
            user.meta.id,
            user.username,
            user.email,
            user.role.to_string(),
            created.to_string()
        );
    }

    Ok(())
}

fn reset_password(users: &UserStore, email: &str, password: Option<String>) -> Result<()> {
    let generated = password.is_none();
    let password = password.unwrap_or_else(|| generate_password(GENERATED_PASSWORD_LEN));

    let user = users
        .reset_password(email, &password)
        .context("Failed to reset password")?;
    tracing::info!(user_id = user.meta.id, generated, "Password reset from CLI");

    ui::success(&format!("Password reset for '{}'", user.email));
    if generated {
        ui::success(&format!("New password: {password}"));
    }
    Ok(())
}

fn delete_user(users: &UserStore, email: &str) -> Result<()> {
    let user = users
        .find_by_email(email)?
        .ok_or_else(|| anyhow!("User not found: {email}"))?;

    let admin_count = users
        .list()?
        .iter()
        .filter(|u| u.role == UserRole::Admin)
        .count();
    if user.role == UserRole::Admin && admin_count <= 1 {
        tracing::warn!(user_id = user.meta.id, "Refused to delete the last admin");
        bail!("Cannot delete the last admin user");
    }

    users.delete(user.meta.id)?;
    tracing::info!(user_id = user.meta.id, "User deleted from CLI");
    ui::success(&format!("Deleted user '{}'", user.email));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_store() -> UserStore {
        UserStore::open(&Store::temporary().unwrap(), "yiaga.org").unwrap()
    }

    #[test]
    fn test_create_enforces_org_domain_for_admins() {
        let users = user_store();

        let err = create_user(
            &users,
            "ops".to_string(),
            "ops@gmail.com".to_string(),
            Some("pw-123456".to_string()),
            "admin",
            false,
        );
        assert!(err.is_err());
        assert!(users.is_empty());

        create_user(
            &users,
            "ops".to_string(),
            "ops@yiaga.org".to_string(),
            None,
            "admin",
            true,
        )
        .unwrap();
        assert_eq!(users.count(), 1);
    }

    #[test]
    fn test_create_requires_password_and_known_role() {
        let users = user_store();
        assert!(create_user(&users, "a".into(), "a@yiaga.org".into(), None, "admin", false).is_err());
        assert!(
            create_user(
                &users,
                "a".into(),
                "a@yiaga.org".into(),
                Some("pw".into()),
                "owner",
                false
            )
            .is_err()
        );
        assert!(users.is_empty());
    }

    #[test]
    fn test_last_admin_cannot_be_deleted() {
        let users = user_store();
        create_user(
            &users,
            "root".into(),
            "root@yiaga.org".into(),
            Some("pw-123456".into()),
            "admin",
            false,
        )
        .unwrap();
        create_user(
            &users,
            "writer".into(),
            "writer@example.com".into(),
            Some("pw-123456".into()),
            "editor",
            false,
        )
        .unwrap();

        assert!(delete_user(&users, "root@yiaga.org").is_err());
        delete_user(&users, "writer@example.com").unwrap();
        assert!(delete_user(&users, "writer@example.com").is_err());
        assert_eq!(users.count(), 1);
    }

    #[test]
    fn test_reset_password_changes_credentials() {
        let users = user_store();
        create_user(
            &users,
            "root".into(),
            "root@yiaga.org".into(),
            Some("old-password".into()),
            "admin",
            false,
        )
        .unwrap();

        reset_password(&users, "root@yiaga.org", Some("new-password".into())).unwrap();
        assert!(users.authenticate("root@yiaga.org", "old-password").is_err());
        assert!(users.authenticate("root@yiaga.org", "new-password").is_ok());

        assert!(reset_password(&users, "nobody@yiaga.org", None).is_err());
    }

    #[test]
    fn test_run_admin_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let config = Config::default();

        run_admin(
            &config,
            AdminArgs {
                action: AdminAction::Create {
                    username: "root".into(),
                    email: "root@yiaga.org".into(),
                    password: Some("pw-123456".into()),
                    role: "admin".into(),
                    generate_password: false,
                },
                data_dir: Some(data_dir.clone()),
            },
        )
        .unwrap();

        assert!(data_dir.is_dir());
        assert!(std::fs::read_dir(&data_dir).unwrap().next().is_some());
    }
}
