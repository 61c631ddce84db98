//! Seed the catalog with demo products and variants.
//!
//! Intended for local development and demos. The command is a no-op when
//! the catalog already has products, so it is safe to run repeatedly.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use velostore_storefront::db;

use super::migrate::database_url;

struct SeedProduct {
    name: &'static str,
    price: Decimal,
    product_type: &'static str,
    brand: &'static str,
    short_description: &'static str,
    variants: Vec<SeedVariant>,
}

struct SeedVariant {
    name: &'static str,
    stock: i32,
    extra_price: Decimal,
}

fn variant(name: &'static str, stock: i32, extra_cents: i64) -> SeedVariant {
    SeedVariant {
        name,
        stock,
        extra_price: Decimal::new(extra_cents, 2),
    }
}

fn catalog() -> Vec<SeedProduct> {
    vec![
        SeedProduct {
            name: "Gravel bike Apex",
            price: Decimal::new(129_900, 2),
            product_type: "bicycle",
            brand: "Velostore",
            short_description: "All-road gravel bike with carbon fork",
            variants: vec![
                variant("Size S", 3, 0),
                variant("Size M", 5, 0),
                variant("Size L", 2, 2_000),
            ],
        },
        SeedProduct {
            name: "City bike Loop",
            price: Decimal::new(64_900, 2),
            product_type: "bicycle",
            brand: "Velostore",
            short_description: "Step-through commuter with rack and lights",
            variants: vec![variant("One size", 8, 0)],
        },
        SeedProduct {
            name: "Floor pump PSI-160",
            price: Decimal::new(3_490, 2),
            product_type: "equipment",
            brand: "AirWorks",
            short_description: "Steel floor pump with pressure gauge",
            variants: vec![variant("Standard", 25, 0)],
        },
        SeedProduct {
            name: "Helmet Vento",
            price: Decimal::new(8_900, 2),
            product_type: "equipment",
            brand: "Vento",
            short_description: "In-mold road helmet, 240 g",
            variants: vec![variant("M (54-58)", 12, 0), variant("L (58-62)", 7, 500)],
        },
        SeedProduct {
            name: "Merino jersey",
            price: Decimal::new(7_400, 2),
            product_type: "clothing",
            brand: "Woolpeak",
            short_description: "Long-sleeve merino cycling jersey",
            variants: vec![
                variant("S", 6, 0),
                variant("M", 9, 0),
                variant("XL", 4, 300),
            ],
        },
    ]
}

/// Seed the catalog.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;
    if existing > 0 {
        info!(existing, "Catalog already seeded, nothing to do");
        return Ok(());
    }

    let mut products = 0usize;
    let mut variants = 0usize;

    for product in catalog() {
        let product_id = insert_product(&pool, &product).await?;
        products += 1;

        for v in &product.variants {
            insert_variant(&pool, product_id, v).await?;
            variants += 1;
        }
    }

    info!(products, variants, "Seeding complete");
    Ok(())
}

async fn insert_product(pool: &PgPool, product: &SeedProduct) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO products (name, price, product_type, brand, short_description) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(product.name)
    .bind(product.price)
    .bind(product.product_type)
    .bind(product.brand)
    .bind(product.short_description)
    .fetch_one(pool)
    .await
}

async fn insert_variant(
    pool: &PgPool,
    product_id: Uuid,
    variant: &SeedVariant,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO product_variants (product_id, variant_name, stock_quantity, extra_price) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(product_id)
    .bind(variant.name)
    .bind(variant.stock)
    .bind(variant.extra_price)
    .execute(pool)
    .await?;

    Ok(())
}
