use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Cart;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RequestedItem {
    pub shop_id: Uuid,
    pub quantity: i32,
}

/// `items` is a JSON array of [`RequestedItem`], or a string encoding one.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CartRequest {
    #[schema(value_type = Vec<RequestedItem>)]
    pub items: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CartList {
    #[schema(value_type = Vec<Cart>)]
    pub items: Vec<Cart>,
}
