use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

// Stored roles predate the enum; anything unrecognised is a plain user.
impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "superadmin" => Role::Superadmin,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Coffee,
    Barbers,
    Salon,
    Spa,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Coffee => "coffee",
            Category::Barbers => "barbers",
            Category::Salon => "salon",
            Category::Spa => "spa",
            Category::Other => "other",
        }
    }

    /// Bookable services that are never sold through a cart.
    pub fn is_cartable(&self) -> bool {
        !matches!(self, Category::Barbers)
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "coffee" => Category::Coffee,
            "barbers" => Category::Barbers,
            "salon" => Category::Salon,
            "spa" => Category::Spa,
            _ => Category::Other,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub phone_number: String,
    pub bio: Option<String>,
    pub subscription: String,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub keywords: Option<String>,
    pub images: Option<String>,
    pub description: Option<String>,
    pub category: Category,
    pub price: i64,
    pub contact_email: String,
    pub contact_number: String,
    pub owner_id: Uuid,
    pub approved: bool,
    pub available: bool,
    pub subscription: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner fields expanded onto a cart.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub email: String,
}

/// Listing fields expanded onto a line item.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListingSummary {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub images: Option<String>,
    pub contact_email: String,
    pub contact_number: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub image: Option<String>,
    pub quantity: i32,
    pub amount: i64,
    /// `None` once the listing has been deleted.
    pub product: Option<ListingSummary>,
}

/// A cart; once `paid` it is read as an order.
#[derive(Debug, Serialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub owner: Option<OwnerSummary>,
    pub items: Vec<LineItem>,
    pub total_amount: i64,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
