use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Account, Role};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub role: Option<Role>,
    pub referral_code: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralSummary {
    pub referral_code: String,
    pub referral_count: usize,
    pub referred_users: Vec<Account>,
}
