//! Line-item arithmetic for carts.
//!
//! Every addition is priced with the listing price current at the moment it is
//! added. Earlier amounts on a line are never repriced, so a line's amount is
//! the sum of its additions.

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::cart::RequestedItem,
    entity::{cart_items::Model as CartItemModel, listings::Model as ListingModel},
    error::{AppError, AppResult},
    models::Category,
};

/// The listing fields a line needs at the time of an addition.
#[derive(Debug, Clone)]
pub struct PriceSource {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub category: Category,
    pub price: i64,
}

impl From<&ListingModel> for PriceSource {
    fn from(listing: &ListingModel) -> Self {
        Self {
            id: listing.id,
            name: listing.name.clone(),
            image: listing.images.clone(),
            category: Category::from(listing.category.as_str()),
            price: listing.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub product_id: Uuid,
    pub product_name: String,
    pub image: Option<String>,
    pub quantity: i32,
    pub amount: i64,
}

impl From<&CartItemModel> for Line {
    fn from(item: &CartItemModel) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            amount: item.amount,
        }
    }
}

/// Accepts either a JSON array or a string holding one.
pub fn decode_items(raw: Value) -> AppResult<Vec<RequestedItem>> {
    let value = match raw {
        Value::String(encoded) => serde_json::from_str::<Value>(&encoded)
            .map_err(|_| AppError::BadRequest("Invalid items format".into()))?,
        other => other,
    };

    if !value.is_array() {
        return Err(AppError::BadRequest("Invalid items format".into()));
    }

    let items: Vec<RequestedItem> = serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid items format: {e}")))?;

    if items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".into()));
    }
    if items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".into(),
        ));
    }

    Ok(items)
}

pub fn price_line(listing: &PriceSource, quantity: i32) -> AppResult<Line> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".into(),
        ));
    }
    if !listing.category.is_cartable() {
        return Err(AppError::Forbidden(format!(
            "{} listings cannot be added to a cart",
            listing.category.as_str()
        )));
    }

    let amount = listing
        .price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::BadRequest("amount out of range".into()))?;

    Ok(Line {
        product_id: listing.id,
        product_name: listing.name.clone(),
        image: listing.image.clone(),
        quantity,
        amount,
    })
}

/// Folds an addition into the line for the same product, or appends it.
pub fn merge_line(lines: &mut Vec<Line>, addition: Line) -> AppResult<()> {
    match lines
        .iter_mut()
        .find(|line| line.product_id == addition.product_id)
    {
        Some(line) => {
            line.quantity = line
                .quantity
                .checked_add(addition.quantity)
                .ok_or_else(|| AppError::BadRequest("quantity out of range".into()))?;
            line.amount = line
                .amount
                .checked_add(addition.amount)
                .ok_or_else(|| AppError::BadRequest("amount out of range".into()))?;
        }
        None => lines.push(addition),
    }
    Ok(())
}

pub fn total_amount(lines: &[Line]) -> AppResult<i64> {
    lines.iter().try_fold(0i64, |total, line| {
        total
            .checked_add(line.amount)
            .ok_or_else(|| AppError::BadRequest("amount out of range".into()))
    })
}

/// Applies every requested item to `lines`. Fails before producing anything if
/// one listing is missing or not cartable.
pub fn aggregate(
    mut lines: Vec<Line>,
    requested: &[RequestedItem],
    listings: &HashMap<Uuid, PriceSource>,
) -> AppResult<Vec<Line>> {
    for item in requested {
        let listing = listings
            .get(&item.shop_id)
            .ok_or_else(|| AppError::not_found("Shop"))?;
        let line = price_line(listing, item.quantity)?;
        merge_line(&mut lines, line)?;
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn listing(price: i64, category: Category) -> PriceSource {
        PriceSource {
            id: Uuid::new_v4(),
            name: format!("{} place", category.as_str()),
            image: Some("img.png".into()),
            category,
            price,
        }
    }

    fn index(listings: &[&PriceSource]) -> HashMap<Uuid, PriceSource> {
        listings.iter().map(|l| (l.id, (*l).clone())).collect()
    }

    fn req(listing: &PriceSource, quantity: i32) -> RequestedItem {
        RequestedItem {
            shop_id: listing.id,
            quantity,
        }
    }

    #[test]
    fn decodes_plain_array() {
        let id = Uuid::new_v4();
        let items = decode_items(json!([{ "shop_id": id, "quantity": 2 }])).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].shop_id, id);
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn decodes_string_encoded_array() {
        let id = Uuid::new_v4();
        let encoded = json!([{ "shop_id": id, "quantity": 4 }]).to_string();
        let items = decode_items(Value::String(encoded)).unwrap();
        assert_eq!(items[0].quantity, 4);
    }

    #[test]
    fn rejects_non_sequences() {
        for raw in [
            json!({ "shop_id": Uuid::new_v4(), "quantity": 1 }),
            Value::String("{\"shop_id\":1}".into()),
            Value::String("not json".into()),
            json!(3),
            Value::Null,
            json!([]),
            json!([{ "shop_id": Uuid::new_v4(), "quantity": 0 }]),
        ] {
            let err = decode_items(raw.clone()).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{raw}: {err:?}");
        }
    }

    #[test]
    fn total_is_sum_of_quantity_times_price() {
        let a = listing(10, Category::Salon);
        let b = listing(250, Category::Coffee);
        let lines = aggregate(Vec::new(), &[req(&a, 3), req(&b, 2)], &index(&[&a, &b])).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].amount, 30);
        assert_eq!(lines[1].amount, 500);
        assert_eq!(total_amount(&lines).unwrap(), 530);
    }

    #[test]
    fn repeated_listing_merges_instead_of_duplicating() {
        let a = listing(7, Category::Coffee);
        let listings = index(&[&a]);

        let lines = aggregate(Vec::new(), &[req(&a, 2)], &listings).unwrap();
        let lines = aggregate(lines, &[req(&a, 3)], &listings).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].amount, 35);
    }

    #[test]
    fn duplicates_within_one_request_collapse() {
        let a = listing(5, Category::Spa);
        let lines = aggregate(Vec::new(), &[req(&a, 1), req(&a, 1)], &index(&[&a])).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn barbers_fail_the_whole_batch() {
        let ok = listing(10, Category::Coffee);
        let barber = listing(10, Category::Barbers);
        let err = aggregate(
            Vec::new(),
            &[req(&ok, 1), req(&barber, 1)],
            &index(&[&ok, &barber]),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    }

    #[test]
    fn unknown_listing_is_not_found() {
        let known = listing(10, Category::Coffee);
        let missing = listing(10, Category::Coffee);
        let err = aggregate(Vec::new(), &[req(&missing, 1)], &index(&[&known])).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn merged_additions_keep_earlier_prices() {
        let mut a = listing(10, Category::Coffee);
        let lines = aggregate(Vec::new(), &[req(&a, 2)], &index(&[&a])).unwrap();

        a.price = 12;
        let lines = aggregate(lines, &[req(&a, 1)], &index(&[&a])).unwrap();

        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].amount, 2 * 10 + 12);
    }

    #[test]
    fn new_products_are_appended_in_order() {
        let a = listing(1, Category::Coffee);
        let b = listing(2, Category::Coffee);
        let listings = index(&[&a, &b]);

        let lines = aggregate(Vec::new(), &[req(&a, 1)], &listings).unwrap();
        let lines = aggregate(lines, &[req(&b, 1), req(&a, 1)], &listings).unwrap();

        let order: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        assert_eq!(order, vec![a.id, b.id]);
    }

    #[test]
    fn overflow_is_rejected() {
        let a = listing(i64::MAX, Category::Coffee);
        let err = price_line(&a, 2).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
