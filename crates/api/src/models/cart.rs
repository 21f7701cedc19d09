//! Shopping cart aggregate.
//!
//! A cart belongs to exactly one owner - an authenticated user or an
//! anonymous guest token - and holds an ordered list of line items. Lines
//! are matched by the (`product_id`, `size`, `color`) tuple: adding the same
//! tuple twice accumulates quantity instead of growing the list.
//!
//! `total_price` is derived state. Every mutating method recomputes it from
//! the line items; it is never accepted from a caller.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tamarind_core::{CartId, GuestId, ProductId, UserId};

use crate::models::product::{Product, ProductImage};

/// Identity tuple used for matching and merging cart lines.
///
/// Exact equality on all three parts: the same product in a different size
/// or color is a different line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemKey {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
}

/// One line of a cart.
///
/// `name`, `image`, and `price` are snapshots taken from the product when
/// the line was first added. They are deliberately never re-read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<ProductImage>,
    pub price: Decimal,
    pub color: String,
    pub size: String,
    pub quantity: u32,
}

impl CartLineItem {
    /// Snapshot a product into a new cart line.
    #[must_use]
    pub fn snapshot(product: &Product, size: String, color: String, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            image: product.first_image().cloned(),
            price: product.price,
            color,
            size,
            quantity,
        }
    }

    /// The matching key for this line.
    #[must_use]
    pub fn key(&self) -> LineItemKey {
        LineItemKey {
            product_id: self.product_id,
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    fn matches(&self, key: &LineItemKey) -> bool {
        self.product_id == key.product_id && self.size == key.size && self.color == key.color
    }

    fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Exclusive cart ownership: a user id or a guest token, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOwner {
    User(UserId),
    Guest(GuestId),
}

impl CartOwner {
    /// The owning user id, if this cart belongs to a user.
    #[must_use]
    pub const fn as_user(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// The owning guest token, if this cart is anonymous.
    #[must_use]
    pub const fn as_guest(&self) -> Option<&GuestId> {
        match self {
            Self::Guest(id) => Some(id),
            Self::User(_) => None,
        }
    }
}

/// A shopping cart document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub owner: CartOwner,
    pub products: Vec<CartLineItem>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart for the given owner.
    #[must_use]
    pub fn new(owner: CartOwner) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::generate(),
            owner,
            products: Vec::new(),
            total_price: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the cart holds no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Add a line item, accumulating quantity when the key already exists.
    pub fn add_item(&mut self, item: CartLineItem) {
        let key = item.key();
        if let Some(existing) = self.products.iter_mut().find(|line| line.matches(&key)) {
            existing.quantity += item.quantity;
        } else {
            self.products.push(item);
        }
        self.recalculate();
    }

    /// Set the quantity of the line matching `key`.
    ///
    /// A quantity of zero removes the line. Returns `false` if no line
    /// matches, leaving the cart untouched.
    pub fn set_quantity(&mut self, key: &LineItemKey, quantity: u32) -> bool {
        let Some(index) = self.products.iter().position(|line| line.matches(key)) else {
            return false;
        };
        if quantity == 0 {
            self.products.remove(index);
        } else if let Some(line) = self.products.get_mut(index) {
            line.quantity = quantity;
        }
        self.recalculate();
        true
    }

    /// Remove the line matching `key`. Returns `false` if no line matches.
    pub fn remove_item(&mut self, key: &LineItemKey) -> bool {
        let Some(index) = self.products.iter().position(|line| line.matches(key)) else {
            return false;
        };
        self.products.remove(index);
        self.recalculate();
        true
    }

    /// Fold another cart's lines into this one.
    ///
    /// Matching keys accumulate quantity; everything else is appended
    /// verbatim, keeping the other cart's snapshots.
    pub fn merge_from(&mut self, other: Self) {
        for item in other.products {
            let key = item.key();
            if let Some(existing) = self.products.iter_mut().find(|line| line.matches(&key)) {
                existing.quantity += item.quantity;
            } else {
                self.products.push(item);
            }
        }
        self.recalculate();
    }

    /// Reassign the cart to a user, clearing its guest identity.
    pub fn transfer_to_user(&mut self, user: UserId) {
        self.owner = CartOwner::User(user);
        self.updated_at = Utc::now();
    }

    /// Recompute `total_price` from the line items.
    fn recalculate(&mut self) {
        self.total_price = self
            .products
            .iter()
            .fold(Decimal::ZERO, |total, line| total + line.line_total());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product_id: ProductId, size: &str, color: &str, quantity: u32, price: i64) -> CartLineItem {
        CartLineItem {
            product_id,
            name: "Tee".to_string(),
            image: None,
            price: Decimal::from(price),
            color: color.to_string(),
            size: size.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_add_same_key_accumulates_quantity() {
        let product_id = ProductId::generate();
        let mut cart = Cart::new(CartOwner::Guest(GuestId::generate()));

        cart.add_item(line(product_id, "M", "red", 2, 10));
        cart.add_item(line(product_id, "M", "red", 3, 10));

        assert_eq!(cart.products.len(), 1);
        assert_eq!(cart.products.first().unwrap().quantity, 5);
        assert_eq!(cart.total_price, Decimal::from(50));
    }

    #[test]
    fn test_add_different_size_is_a_new_line() {
        let product_id = ProductId::generate();
        let mut cart = Cart::new(CartOwner::Guest(GuestId::generate()));

        cart.add_item(line(product_id, "M", "red", 1, 10));
        cart.add_item(line(product_id, "L", "red", 1, 10));

        assert_eq!(cart.products.len(), 2);
        assert_eq!(cart.total_price, Decimal::from(20));
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let product_id = ProductId::generate();
        let other = ProductId::generate();
        let mut cart = Cart::new(CartOwner::User(UserId::generate()));

        cart.add_item(line(product_id, "M", "red", 2, 10));
        cart.add_item(line(other, "S", "blue", 1, 7));
        assert_eq!(cart.total_price, Decimal::from(27));

        let key = LineItemKey {
            product_id,
            size: "M".to_string(),
            color: "red".to_string(),
        };
        assert!(cart.set_quantity(&key, 4));
        assert_eq!(cart.total_price, Decimal::from(47));

        assert!(cart.remove_item(&key));
        assert_eq!(cart.total_price, Decimal::from(7));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let product_id = ProductId::generate();
        let mut cart = Cart::new(CartOwner::User(UserId::generate()));
        cart.add_item(line(product_id, "M", "red", 2, 10));

        let key = LineItemKey {
            product_id,
            size: "M".to_string(),
            color: "red".to_string(),
        };
        assert!(cart.set_quantity(&key, 0));

        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_set_quantity_unknown_key_is_noop() {
        let mut cart = Cart::new(CartOwner::User(UserId::generate()));
        cart.add_item(line(ProductId::generate(), "M", "red", 2, 10));

        let missing = LineItemKey {
            product_id: ProductId::generate(),
            size: "M".to_string(),
            color: "red".to_string(),
        };
        assert!(!cart.set_quantity(&missing, 3));
        assert_eq!(cart.products.first().unwrap().quantity, 2);
    }

    #[test]
    fn test_merge_sums_matching_keys_and_appends_the_rest() {
        let shared = ProductId::generate();
        let guest_only = ProductId::generate();

        let mut user_cart = Cart::new(CartOwner::User(UserId::generate()));
        user_cart.add_item(line(shared, "M", "red", 2, 10));

        let mut guest_cart = Cart::new(CartOwner::Guest(GuestId::generate()));
        guest_cart.add_item(line(shared, "M", "red", 3, 10));
        guest_cart.add_item(line(guest_only, "S", "green", 1, 5));

        user_cart.merge_from(guest_cart);

        assert_eq!(user_cart.products.len(), 2);
        let merged = user_cart
            .products
            .iter()
            .find(|l| l.product_id == shared)
            .unwrap();
        assert_eq!(merged.quantity, 5);
        assert_eq!(user_cart.total_price, Decimal::from(55));
    }

    #[test]
    fn test_transfer_to_user_clears_guest_identity() {
        let user = UserId::generate();
        let mut cart = Cart::new(CartOwner::Guest(GuestId::generate()));
        cart.add_item(line(ProductId::generate(), "M", "red", 1, 10));

        cart.transfer_to_user(user);

        assert_eq!(cart.owner.as_user(), Some(user));
        assert!(cart.owner.as_guest().is_none());
    }
}
