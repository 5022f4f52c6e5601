//! Capability checks shared by every authenticated operation.
//!
//! Each [`Operation`] maps to one [`Policy`]: the capabilities that satisfy it
//! and the error a caller gets when none do.

use std::collections::HashSet;

use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    db::OrmConn,
    entity::accounts::{Entity as Accounts, Model as AccountModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Role,
};

/// Access settings injected at startup.
#[derive(Debug, Clone, Default)]
pub struct AccessConfig {
    superadmins: HashSet<String>,
}

impl AccessConfig {
    pub fn new<I, S>(superadmins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            superadmins: superadmins.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a comma separated username list, ignoring blanks.
    pub fn from_list(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }
}

pub fn is_superadmin(account: &AccountModel, config: &AccessConfig) -> bool {
    Role::from(account.role.as_str()) == Role::Superadmin
        || config.superadmins.contains(&account.username)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Owner,
    Admin,
    Superadmin,
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateCart,
    UpdateCart,
    ViewCart,
    ListOwnCarts,
    ViewOwnOrder,
    ListOwnOrders,
    ListAllOrders,
    UpdateOrderStatus,
    BrowseListings,
    CreateListing,
    UpdateListing,
    DeleteListing,
    ListOwnListings,
    ViewProfile,
    UpdateProfile,
    ListReferrals,
    ChangeRole,
    DeactivateAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthorized,
    Forbidden,
}

#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub allow: &'static [Capability],
    pub denial: Denial,
}

const fn policy_of(allow: &'static [Capability], denial: Denial) -> Policy {
    Policy { allow, denial }
}

pub fn policy(op: Operation) -> Policy {
    use Capability::*;
    use Operation::*;

    match op {
        CreateCart | UpdateCart | ListOwnCarts | ViewOwnOrder | ListOwnOrders => {
            policy_of(&[Owner], Denial::Forbidden)
        }
        ViewCart => policy_of(&[Owner], Denial::Unauthorized),
        ListAllOrders | UpdateOrderStatus => policy_of(&[Admin, Superadmin], Denial::Forbidden),
        BrowseListings => policy_of(&[Public], Denial::Forbidden),
        CreateListing => policy_of(&[Admin, Superadmin], Denial::Forbidden),
        UpdateListing => policy_of(&[Owner, Superadmin], Denial::Forbidden),
        DeleteListing => policy_of(&[Owner], Denial::Forbidden),
        ListOwnListings | ViewProfile | UpdateProfile | ListReferrals => {
            policy_of(&[Owner], Denial::Forbidden)
        }
        ChangeRole => policy_of(&[Superadmin], Denial::Forbidden),
        DeactivateAccount => policy_of(&[Owner, Superadmin], Denial::Forbidden),
    }
}

/// `resource_owner` is the account that owns the target, when there is one.
pub fn permits(
    op: Operation,
    account: &AccountModel,
    resource_owner: Option<Uuid>,
    config: &AccessConfig,
) -> bool {
    policy(op).allow.iter().any(|capability| match capability {
        Capability::Public => true,
        Capability::Owner => resource_owner == Some(account.id),
        Capability::Admin => Role::from(account.role.as_str()) == Role::Admin,
        Capability::Superadmin => is_superadmin(account, config),
    })
}

pub fn ensure(
    op: Operation,
    account: &AccountModel,
    resource_owner: Option<Uuid>,
    config: &AccessConfig,
) -> AppResult<()> {
    if permits(op, account, resource_owner, config) {
        return Ok(());
    }

    tracing::debug!(account_id = %account.id, operation = ?op, "access denied");
    Err(match policy(op).denial {
        Denial::Unauthorized => AppError::Unauthorized("Not authorized".into()),
        Denial::Forbidden => AppError::forbidden(),
    })
}

/// Gate for operations reachable without a credential.
pub fn ensure_anonymous(op: Operation) -> AppResult<()> {
    let policy = policy(op);
    if policy.allow.contains(&Capability::Public) {
        return Ok(());
    }

    tracing::debug!(operation = ?op, "anonymous access denied");
    Err(match policy.denial {
        Denial::Unauthorized => AppError::Unauthorized("Not authorized".into()),
        Denial::Forbidden => AppError::forbidden(),
    })
}

/// Resolves the bearer identity to a live account.
pub async fn load_account(orm: &OrmConn, user: &AuthUser) -> AppResult<AccountModel> {
    let account = Accounts::find_by_id(user.user_id)
        .one(orm)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    if !account.active {
        return Err(AppError::Forbidden("Account is deactivated".into()));
    }

    Ok(account)
}
