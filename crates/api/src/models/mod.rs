//! Domain models persisted as documents in the store.

pub mod cart;
pub mod checkout;
pub mod order;
pub mod product;
pub mod subscriber;
pub mod user;

pub use cart::{Cart, CartLineItem, CartOwner, LineItemKey};
pub use checkout::{CheckoutItem, CheckoutSession, ShippingAddress};
pub use order::Order;
pub use product::{Product, ProductImage, ProductInput, ProductPatch};
pub use subscriber::Subscriber;
pub use user::{User, UserPatch};
