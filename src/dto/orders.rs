use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Cart;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub paid: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Cart>)]
    pub items: Vec<Cart>,
}
