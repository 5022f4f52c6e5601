use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Listing};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    pub name: String,
    pub address: Option<String>,
    pub keywords: Option<String>,
    pub images: Option<String>,
    pub description: Option<String>,
    pub category: Category,
    pub price: i64,
    pub available: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateListingRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub keywords: Option<String>,
    pub images: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: Option<i64>,
    pub available: Option<bool>,
    pub approved: Option<bool>,
    pub contact_email: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ListingList {
    #[schema(value_type = Vec<Listing>)]
    pub items: Vec<Listing>,
}
