mod common;

use marketplace_api::{
    dto::{cart::CartRequest, listings::UpdateListingRequest, orders::UpdateOrderStatusRequest},
    entity::{
        AuditLogs, Carts,
        audit_logs::Column as AuditCol,
        carts::Column as CartCol,
    },
    error::AppError,
    models::{Category, Role},
    services::{cart_service, listing_service, order_service},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

use common::{open_shop, sign_up, test_state};

fn items(shop_id: Uuid, quantity: i32) -> CartRequest {
    CartRequest {
        items: json!([{ "shop_id": shop_id, "quantity": quantity }]),
    }
}

// One flow per binary: the setup truncates every table.
#[tokio::test]
async fn cart_pricing_ownership_and_order_lifecycle() -> anyhow::Result<()> {
    let Some(state) = test_state().await? else {
        return Ok(());
    };

    let owner = sign_up(&state, "shopowner", Some(Role::Admin)).await?;
    let alice = sign_up(&state, "alice", None).await?;
    let bob = sign_up(&state, "bob", None).await?;

    let coffee = open_shop(&state, &owner, "Test Coffee", Category::Coffee, 500).await?;
    let barber = open_shop(&state, &owner, "Test Barber", Category::Barbers, 1000).await?;

    // First addition creates the cart.
    let created = cart_service::create_cart(&state, &alice, items(coffee, 2)).await?;
    assert!(matches!(created, cart_service::CartOutcome::Created(_)));
    assert_eq!(created.status(), axum::http::StatusCode::CREATED);
    let cart_id = created.cart().id;
    assert_eq!(created.cart().total_amount, 1000);
    assert_eq!(created.cart().items.len(), 1);
    assert_eq!(created.cart().items[0].quantity, 2);

    // A second create merges into the same unpaid cart.
    let merged = cart_service::create_cart(&state, &alice, items(coffee, 1)).await?;
    assert!(matches!(merged, cart_service::CartOutcome::Updated(_)));
    assert_eq!(merged.cart().id, cart_id);
    assert_eq!(merged.cart().items.len(), 1);
    assert_eq!(merged.cart().items[0].quantity, 3);
    assert_eq!(merged.cart().total_amount, 1500);

    // Earlier additions keep the price they were added at.
    listing_service::update_listing(
        &state,
        &owner,
        coffee,
        UpdateListingRequest {
            price: Some(700),
            ..Default::default()
        },
    )
    .await?;
    let repriced = cart_service::update_cart(&state, &alice, cart_id, items(coffee, 1)).await?;
    assert_eq!(repriced.status(), axum::http::StatusCode::OK);
    let line = &repriced.cart().items[0];
    assert_eq!(line.quantity, 4);
    assert_eq!(line.amount, 2200);
    assert_eq!(repriced.cart().total_amount, 2200);

    // String-encoded item arrays are accepted.
    let encoded = CartRequest {
        items: json!(format!(r#"[{{"shop_id":"{coffee}","quantity":1}}]"#)),
    };
    let encoded = cart_service::update_cart(&state, &alice, cart_id, encoded).await?;
    assert_eq!(encoded.cart().total_amount, 2900);

    // Rejections leave the cart untouched.
    let err = cart_service::create_cart(&state, &alice, items(barber, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    let err = cart_service::create_cart(&state, &alice, CartRequest { items: json!([]) })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let err = cart_service::update_cart(&state, &alice, cart_id, items(coffee, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let err = cart_service::create_cart(&state, &alice, items(Uuid::new_v4(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let unchanged = cart_service::get_one_cart(&state, &alice, cart_id).await?;
    let unchanged = unchanged.data.expect("cart");
    assert_eq!(unchanged.total_amount, 2900);
    assert_eq!(unchanged.items[0].quantity, 5);

    // Other accounts can neither modify nor read the cart.
    let err = cart_service::update_cart(&state, &bob, cart_id, items(coffee, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
    let err = cart_service::get_one_cart(&state, &bob, cart_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "got {err:?}");
    let err = order_service::get_user_order(&state, &bob, cart_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    // Only admins may settle orders.
    let err = order_service::update_order_status(
        &state,
        &alice,
        cart_id,
        UpdateOrderStatusRequest { paid: true },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");

    let version_before = Carts::find_by_id(cart_id)
        .one(&state.orm)
        .await?
        .expect("cart row")
        .version;
    let paid = order_service::update_order_status(
        &state,
        &owner,
        cart_id,
        UpdateOrderStatusRequest { paid: true },
    )
    .await?;
    assert!(paid.data.expect("order").paid);
    let version_after = Carts::find_by_id(cart_id)
        .one(&state.orm)
        .await?
        .expect("cart row")
        .version;
    assert_eq!(version_after, version_before + 1);

    // The settled state is what later reads return.
    let settled = cart_service::get_one_cart(&state, &alice, cart_id)
        .await?
        .data
        .expect("cart");
    assert!(settled.paid);
    let listed = order_service::list_all_orders(&state, &owner)
        .await?
        .data
        .expect("orders");
    assert!(listed.items.iter().any(|order| order.id == cart_id && order.paid));

    // Updating a paid cart starts a fresh one at the current price.
    let fresh = cart_service::update_cart(&state, &alice, cart_id, items(coffee, 1)).await?;
    assert!(matches!(fresh, cart_service::CartOutcome::Created(_)));
    assert_ne!(fresh.cart().id, cart_id);
    assert_eq!(fresh.cart().total_amount, 700);

    // Reopening the paid cart would give alice two unpaid carts.
    let err = order_service::update_order_status(
        &state,
        &owner,
        cart_id,
        UpdateOrderStatusRequest { paid: false },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");

    let carts = cart_service::list_user_carts(&state, &alice).await?;
    assert_eq!(carts.data.expect("carts").items.len(), 2);
    let orders = order_service::list_user_orders(&state, &alice).await?;
    assert_eq!(orders.data.expect("orders").items.len(), 2);

    let err = order_service::list_all_orders(&state, &bob).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
    let all = order_service::list_all_orders(&state, &owner).await?;
    assert_eq!(all.data.expect("orders").items.len(), 2);

    // Targeting someone else's paid cart falls back to the caller's own cart.
    let carol = sign_up(&state, "carol", None).await?;
    let own = cart_service::update_cart(&state, &carol, cart_id, items(coffee, 1)).await?;
    assert!(matches!(own, cart_service::CartOutcome::Created(_)));
    assert_ne!(own.cart().id, cart_id);
    assert_eq!(own.cart().user_id, carol.user_id);
    assert_eq!(own.cart().total_amount, 700);
    let untouched = cart_service::get_one_cart(&state, &alice, cart_id)
        .await?
        .data
        .expect("cart");
    assert!(untouched.paid);
    assert_eq!(untouched.total_amount, 2900);
    assert_eq!(untouched.items[0].quantity, 5);

    // Concurrent additions never produce a second unpaid cart or lose quantity.
    let mut handles = Vec::new();
    for _ in 0..5 {
        let state = state.clone();
        let bob = bob.clone();
        handles.push(tokio::spawn(async move {
            cart_service::create_cart(&state, &bob, items(coffee, 1)).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let unpaid = Carts::find()
        .filter(CartCol::UserId.eq(bob.user_id))
        .filter(CartCol::Paid.eq(false))
        .all(&state.orm)
        .await?;
    assert_eq!(unpaid.len(), 1);
    let bobs = cart_service::get_one_cart(&state, &bob, unpaid[0].id)
        .await?
        .data
        .expect("cart");
    assert_eq!(bobs.items[0].quantity, 5);
    assert_eq!(bobs.total_amount, 3500);

    // Merges into one cart queue on its row lock instead of failing.
    let mut handles = Vec::new();
    for _ in 0..10 {
        let state = state.clone();
        let bob = bob.clone();
        let bobs_cart = bobs.id;
        handles.push(tokio::spawn(async move {
            cart_service::update_cart(&state, &bob, bobs_cart, items(coffee, 1)).await
        }));
    }
    for handle in handles {
        let outcome = handle.await??;
        assert!(matches!(outcome, cart_service::CartOutcome::Updated(_)));
    }
    let bobs = cart_service::get_one_cart(&state, &bob, bobs.id)
        .await?
        .data
        .expect("cart");
    assert_eq!(bobs.items[0].quantity, 15);
    assert_eq!(bobs.total_amount, 700 * 15);

    let audited = AuditLogs::find()
        .filter(AuditCol::Action.eq("order_status_update"))
        .count(&state.orm)
        .await?;
    assert_eq!(audited, 1);

    Ok(())
}
