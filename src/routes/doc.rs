use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            LoginRequest, ReferralSummary, RegisterRequest, UpdateProfileRequest,
            UpdateRoleRequest,
        },
        cart::{CartList, CartRequest, RequestedItem},
        listings::{CreateListingRequest, ListingList, UpdateListingRequest},
        orders::{OrderList, UpdateOrderStatusRequest},
    },
    models::{Account, Cart, Category, LineItem, Listing, ListingSummary, OwnerSummary, Role},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, listings, orders, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_me,
        auth::change_role,
        auth::deactivate,
        auth::referrals,
        cart::create_cart,
        cart::update_cart,
        cart::list_user_carts,
        cart::get_one_cart,
        orders::list_user_orders,
        orders::get_user_order,
        orders::update_order_status,
        orders::list_all_orders,
        listings::create_listing,
        listings::list_listings,
        listings::search_listings,
        listings::list_my_listings,
        listings::get_listing,
        listings::update_listing,
        listings::delete_listing
    ),
    components(
        schemas(
            Account,
            Role,
            Category,
            Listing,
            OwnerSummary,
            ListingSummary,
            LineItem,
            Cart,
            RequestedItem,
            CartRequest,
            CartList,
            OrderList,
            UpdateOrderStatusRequest,
            CreateListingRequest,
            UpdateListingRequest,
            ListingList,
            RegisterRequest,
            LoginRequest,
            UpdateProfileRequest,
            UpdateRoleRequest,
            ReferralSummary,
            params::Pagination,
            params::ListingQuery,
            params::SearchQuery,
            Meta,
            ApiResponse<Account>,
            ApiResponse<Cart>,
            ApiResponse<CartList>,
            ApiResponse<OrderList>,
            ApiResponse<Listing>,
            ApiResponse<ListingList>,
            ApiResponse<ReferralSummary>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Account and session endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Shops", description = "Shop listing endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
