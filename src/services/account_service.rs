use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    access::{self, Operation},
    audit,
    dto::auth::{
        LoginRequest, ReferralSummary, RegisterRequest, UpdateProfileRequest, UpdateRoleRequest,
    },
    entity::accounts::{ActiveModel, Column, Entity as Accounts, Model as AccountModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Account, Role},
    response::{ApiResponse, Meta},
    services::is_unique_violation,
    state::AppState,
};

/// A response that starts a session.
#[derive(Debug)]
pub struct SignedIn {
    pub token: String,
    pub response: ApiResponse<Account>,
}

fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

pub async fn register_account(state: &AppState, payload: RegisterRequest) -> AppResult<SignedIn> {
    let RegisterRequest {
        first_name,
        middle_name,
        last_name,
        username,
        email,
        password,
        phone_number,
        role,
        referral_code,
    } = payload;

    let filled = [&first_name, &last_name, &username, &email, &password, &phone_number];
    if !filled.iter().all(|value| required(value)) {
        return Err(AppError::BadRequest("Fields cannot be empty".into()));
    }
    let email = email.trim().to_lowercase();
    let username = username.trim().to_string();
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }

    let role = role.unwrap_or(Role::User);
    if role == Role::Superadmin {
        return Err(AppError::Forbidden(
            "superadmin accounts cannot be self-registered".into(),
        ));
    }

    if Accounts::find()
        .filter(Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("User already exists".into()));
    }
    if Accounts::find()
        .filter(Column::Username.eq(username.as_str()))
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("User Name already exists".into()));
    }

    let referred_by = match referral_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => {
            let referrer = Accounts::find()
                .filter(Column::ReferralCode.eq(code))
                .one(&state.orm)
                .await?
                .ok_or_else(|| AppError::BadRequest("Invalid referral code".into()))?;
            Some(referrer.id)
        }
        None => None,
    };

    let password_hash = hash_password(&password)?;

    let account = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role.as_str().to_string()),
        active: Set(true),
        first_name: Set(first_name.trim().to_string()),
        middle_name: Set(middle_name.filter(|m| required(m))),
        last_name: Set(last_name.trim().to_string()),
        phone_number: Set(phone_number.trim().to_string()),
        bio: Set(None),
        subscription: Set("free".into()),
        referral_code: Set(new_referral_code()),
        referred_by: Set(referred_by),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("User already exists".into())
        } else {
            err.into()
        }
    })?;

    audit::record(
        &state.pool,
        Some(account.id),
        "account_register",
        "accounts",
        serde_json::json!({ "account_id": account.id, "referred_by": account.referred_by }),
    )
    .await;
    tracing::info!(account_id = %account.id, role = %account.role, "account registered");

    let token = state.sessions.issue(account.id, role)?;
    Ok(SignedIn {
        token,
        response: ApiResponse::success("User created", account_from_entity(account), None),
    })
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<SignedIn> {
    let LoginRequest { email, password } = payload;
    if !required(&email) || !required(&password) {
        return Err(AppError::BadRequest("Fields cannot be empty".into()));
    }

    let account = Accounts::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    let parsed_hash = PasswordHash::new(&account.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    if !account.active {
        return Err(AppError::Forbidden("Account is deactivated".into()));
    }

    let token = state
        .sessions
        .issue(account.id, Role::from(account.role.as_str()))?;

    audit::record(
        &state.pool,
        Some(account.id),
        "account_login",
        "accounts",
        serde_json::json!({ "account_id": account.id }),
    )
    .await;

    Ok(SignedIn {
        token,
        response: ApiResponse::success("Logged in", account_from_entity(account), Some(Meta::empty())),
    })
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Account>> {
    let account = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::ViewProfile, &account, Some(account.id), &state.access)?;
    Ok(ApiResponse::success("Account", account_from_entity(account), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Account>> {
    let account = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::UpdateProfile, &account, Some(account.id), &state.access)?;

    let mut active: ActiveModel = account.into();
    if let Some(first_name) = payload.first_name.filter(|v| required(v)) {
        active.first_name = Set(first_name);
    }
    if let Some(middle_name) = payload.middle_name {
        active.middle_name = Set(Some(middle_name).filter(|v| required(v)));
    }
    if let Some(last_name) = payload.last_name.filter(|v| required(v)) {
        active.last_name = Set(last_name);
    }
    if let Some(phone_number) = payload.phone_number.filter(|v| required(v)) {
        active.phone_number = Set(phone_number);
    }
    if let Some(bio) = payload.bio {
        active.bio = Set(Some(bio));
    }
    active.updated_at = Set(Utc::now().into());

    let account = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(account.id),
        "account_update",
        "accounts",
        serde_json::json!({ "account_id": account.id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", account_from_entity(account), Some(Meta::empty())))
}

pub async fn change_role(
    state: &AppState,
    user: &AuthUser,
    target_id: Uuid,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<Account>> {
    let actor = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::ChangeRole, &actor, Some(target_id), &state.access)?;

    let target = Accounts::find_by_id(target_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    let mut active: ActiveModel = target.into();
    active.role = Set(payload.role.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let target = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(actor.id),
        "account_role_change",
        "accounts",
        serde_json::json!({ "account_id": target.id, "role": target.role }),
    )
    .await;
    tracing::info!(actor = %actor.id, account_id = %target.id, role = %target.role, "role changed");

    Ok(ApiResponse::success("Role updated", account_from_entity(target), Some(Meta::empty())))
}

pub async fn deactivate(
    state: &AppState,
    user: &AuthUser,
    target_id: Uuid,
) -> AppResult<ApiResponse<Account>> {
    let actor = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::DeactivateAccount, &actor, Some(target_id), &state.access)?;

    let target = Accounts::find_by_id(target_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    let mut active: ActiveModel = target.into();
    active.active = Set(false);
    active.updated_at = Set(Utc::now().into());
    let target = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(actor.id),
        "account_deactivate",
        "accounts",
        serde_json::json!({ "account_id": target.id }),
    )
    .await;

    Ok(ApiResponse::success("Deactivated", account_from_entity(target), Some(Meta::empty())))
}

pub async fn referrals(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ReferralSummary>> {
    let account = access::load_account(&state.orm, user).await?;
    access::ensure(Operation::ListReferrals, &account, Some(account.id), &state.access)?;

    let referred_users: Vec<Account> = Accounts::find()
        .filter(Column::ReferredBy.eq(account.id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(account_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Referrals",
        ReferralSummary {
            referral_code: account.referral_code,
            referral_count: referred_users.len(),
            referred_users,
        },
        None,
    ))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn new_referral_code() -> String {
    let mut code = Uuid::new_v4().simple().to_string();
    code.truncate(8);
    code.to_uppercase()
}

pub(crate) fn account_from_entity(model: AccountModel) -> Account {
    Account {
        id: model.id,
        role: Role::from(model.role.as_str()),
        username: model.username,
        email: model.email,
        active: model.active,
        first_name: model.first_name,
        middle_name: model.middle_name,
        last_name: model.last_name,
        phone_number: model.phone_number,
        bio: model.bio,
        subscription: model.subscription,
        referral_code: model.referral_code,
        referred_by: model.referred_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_codes_are_short_and_uppercase() {
        let code = new_referral_code();
        assert_eq!(code.len(), 8);
        assert_eq!(code, code.to_uppercase());
        assert_ne!(code, new_referral_code());
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("hunter2").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"hunter2", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }
}
