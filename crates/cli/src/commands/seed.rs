//! Database seeding command.
//!
//! Wipes the user and product collections, then loads a known admin user
//! and a small sample catalog. Meant for local development only; there is
//! deliberately no guard rail, the command always destroys existing data.
//!
//! # Usage
//!
//! ```bash
//! tamarind-cli seed
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

use tamarind_api::models::{Product, ProductImage, ProductInput, User};
use tamarind_api::store::{PgStore, ProductStore, Store, StoreError, UserStore};
use tamarind_core::{Email, EmailError, Gender, Role, UserId};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The built-in admin email failed validation.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reset the database and load the sample admin user and catalog.
///
/// # Errors
///
/// Returns an error if the database URL is not configured or a store
/// operation fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;

    info!("Connecting to database");
    let store = PgStore::connect(&database_url, Duration::from_secs(5)).await?;

    info!("Clearing existing products and users");
    store.clear_products().await?;
    store.clear_users().await?;

    let admin = User::new(
        "Admin User".to_string(),
        Email::parse("admin@example.com")?,
        Role::Admin,
    );
    store.insert_user(&admin).await?;
    info!(email = %admin.email, "Created admin user");

    let products = sample_products(admin.id);
    let count = products.len();
    for product in &products {
        store.insert_product(product).await?;
    }
    info!(count, "Inserted sample products");

    store.close().await;
    info!("Data seeded successfully");
    Ok(())
}

fn database_url() -> Result<SecretString, SeedError> {
    std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| SeedError::MissingEnvVar("API_DATABASE_URL"))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().copied().map(str::to_string).collect()
}

fn image(url: &str, alt_text: &str) -> Vec<ProductImage> {
    vec![ProductImage {
        url: url.to_string(),
        alt_text: Some(alt_text.to_string()),
    }]
}

/// The sample catalog, attributed to the seeded admin user.
fn sample_products(created_by: UserId) -> Vec<Product> {
    let inputs = vec![
        ProductInput {
            name: "Classic Oxford Button-Down Shirt".to_string(),
            description: "A timeless oxford shirt in breathable cotton with a \
                          button-down collar. Works tucked in for the office or \
                          open over a tee on the weekend."
                .to_string(),
            price: Decimal::new(3999, 2),
            discount_price: Some(Decimal::new(3499, 2)),
            count_in_stock: 20,
            sku: "OX-SH-001".to_string(),
            category: "Top Wear".to_string(),
            brand: Some("Urban Threads".to_string()),
            sizes: strings(&["S", "M", "L", "XL"]),
            colors: strings(&["White", "Light Blue"]),
            collections: "Business Casual".to_string(),
            material: Some("Cotton".to_string()),
            gender: Some(Gender::Men),
            images: image(
                "https://picsum.photos/seed/ox-sh-001/800/800",
                "Classic Oxford Button-Down Shirt",
            ),
            is_featured: true,
            is_published: true,
            rating: 4.5,
            num_reviews: 12,
            tags: strings(&["shirt", "oxford", "casual"]),
        },
        ProductInput {
            name: "Slim-Fit Stretch Chinos".to_string(),
            description: "Tailored chinos with a touch of stretch for all-day \
                          comfort. A clean, modern silhouette that pairs with \
                          everything from tees to blazers."
                .to_string(),
            price: Decimal::new(4999, 2),
            discount_price: Some(Decimal::new(4499, 2)),
            count_in_stock: 35,
            sku: "CH-PT-002".to_string(),
            category: "Bottom Wear".to_string(),
            brand: Some("Urban Threads".to_string()),
            sizes: strings(&["S", "M", "L", "XL", "XXL"]),
            colors: strings(&["Khaki", "Navy"]),
            collections: "Smart Casual".to_string(),
            material: Some("Cotton Blend".to_string()),
            gender: Some(Gender::Men),
            images: image(
                "https://picsum.photos/seed/ch-pt-002/800/800",
                "Slim-Fit Stretch Chinos",
            ),
            is_featured: false,
            is_published: true,
            rating: 4.2,
            num_reviews: 8,
            tags: strings(&["chinos", "slim-fit"]),
        },
        ProductInput {
            name: "Everyday Cotton Crew Tee".to_string(),
            description: "A soft midweight crew-neck tee cut from combed cotton. \
                          The workhorse of any wardrobe."
                .to_string(),
            price: Decimal::new(1999, 2),
            discount_price: None,
            count_in_stock: 60,
            sku: "TE-CR-003".to_string(),
            category: "Top Wear".to_string(),
            brand: Some("Loom & Co".to_string()),
            sizes: strings(&["XS", "S", "M", "L", "XL"]),
            colors: strings(&["Black", "White", "Heather Grey"]),
            collections: "Basics".to_string(),
            material: Some("Cotton".to_string()),
            gender: Some(Gender::Unisex),
            images: image(
                "https://picsum.photos/seed/te-cr-003/800/800",
                "Everyday Cotton Crew Tee",
            ),
            is_featured: false,
            is_published: true,
            rating: 4.7,
            num_reviews: 31,
            tags: strings(&["tee", "basics"]),
        },
        ProductInput {
            name: "High-Waist Wide-Leg Trousers".to_string(),
            description: "Flowing wide-leg trousers with a flattering high \
                          waist and a drapey hand. Dress them up with heels or \
                          down with sneakers."
                .to_string(),
            price: Decimal::new(5499, 2),
            discount_price: Some(Decimal::new(4999, 2)),
            count_in_stock: 15,
            sku: "TR-WL-004".to_string(),
            category: "Bottom Wear".to_string(),
            brand: Some("Maison Vert".to_string()),
            sizes: strings(&["S", "M", "L"]),
            colors: strings(&["Black", "Cream"]),
            collections: "Formal Wear".to_string(),
            material: Some("Viscose Blend".to_string()),
            gender: Some(Gender::Women),
            images: image(
                "https://picsum.photos/seed/tr-wl-004/800/800",
                "High-Waist Wide-Leg Trousers",
            ),
            is_featured: true,
            is_published: true,
            rating: 4.4,
            num_reviews: 9,
            tags: strings(&["trousers", "wide-leg"]),
        },
        ProductInput {
            name: "Knitted Polo Shirt".to_string(),
            description: "A fine-gauge knitted polo with a retro collar and \
                          buttoned placket. Smarter than a tee, easier than a \
                          shirt."
                .to_string(),
            price: Decimal::new(4499, 2),
            discount_price: None,
            count_in_stock: 25,
            sku: "PO-KN-005".to_string(),
            category: "Top Wear".to_string(),
            brand: Some("Loom & Co".to_string()),
            sizes: strings(&["M", "L", "XL"]),
            colors: strings(&["Forest Green", "Navy"]),
            collections: "Smart Casual".to_string(),
            material: Some("Merino Blend".to_string()),
            gender: Some(Gender::Men),
            images: image(
                "https://picsum.photos/seed/po-kn-005/800/800",
                "Knitted Polo Shirt",
            ),
            is_featured: false,
            is_published: true,
            rating: 4.1,
            num_reviews: 5,
            tags: strings(&["polo", "knitwear"]),
        },
        ProductInput {
            name: "Ribbed Long-Sleeve Top".to_string(),
            description: "A fitted ribbed top with a flattering scoop neck, \
                          soft enough to live in. Layers cleanly under jackets \
                          and cardigans."
                .to_string(),
            price: Decimal::new(2999, 2),
            discount_price: Some(Decimal::new(2499, 2)),
            count_in_stock: 40,
            sku: "LS-RB-006".to_string(),
            category: "Top Wear".to_string(),
            brand: Some("Maison Vert".to_string()),
            sizes: strings(&["XS", "S", "M", "L"]),
            colors: strings(&["Rust", "Ivory", "Black"]),
            collections: "Basics".to_string(),
            material: Some("Cotton Blend".to_string()),
            gender: Some(Gender::Women),
            images: image(
                "https://picsum.photos/seed/ls-rb-006/800/800",
                "Ribbed Long-Sleeve Top",
            ),
            is_featured: false,
            is_published: true,
            rating: 4.6,
            num_reviews: 14,
            tags: strings(&["top", "ribbed", "basics"]),
        },
    ];

    inputs
        .into_iter()
        .map(|input| Product::new(input, created_by))
        .collect()
}
