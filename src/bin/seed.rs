use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_marketplace_api::{config::AppConfig, db::create_pool};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin12345", "admin").await?;
    let seller_id =
        ensure_user(&pool, "seller", "seller@example.com", "seller12345", "seller").await?;
    let buyer_id = ensure_user(&pool, "buyer", "buyer@example.com", "buyer12345", "buyer").await?;

    let shop_id = ensure_shop(&pool, seller_id).await?;
    let category_id = ensure_category(&pool, "Accessories").await?;
    seed_products(&pool, shop_id, category_id).await?;
    seed_coupons(&pool).await?;

    println!("Seed completed. Admin: {admin_id}, Seller: {seller_id}, Buyer: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_shop(pool: &sqlx::PgPool, seller_id: Uuid) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO shops (id, user_id, activity_status, payment_status, shop_info)
        VALUES ($1, $2, 'active', 'paid', '{"name": "Demo Shop"}')
        ON CONFLICT (user_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(seller_id)
    .fetch_optional(pool)
    .await?;

    let shop_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM shops WHERE user_id = $1")
                .bind(seller_id)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured shop for seller");
    Ok(shop_id)
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    let slug = name.to_lowercase();
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&slug)
    .fetch_optional(pool)
    .await?;

    let category_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM categories WHERE slug = $1")
                .bind(&slug)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured category {name}");
    Ok(category_id)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    shop_id: Uuid,
    category_id: Uuid,
) -> anyhow::Result<()> {
    let products = vec![
        ("Wireless Mouse", "wireless-mouse", "A smooth wireless mouse", 2500, 50),
        ("Mechanical Keyboard", "mechanical-keyboard", "Clacky and reliable", 8900, 25),
        ("USB-C Hub", "usb-c-hub", "Seven ports in one", 4200, 100),
        ("Laptop Stand", "laptop-stand", "Aluminum, adjustable", 3100, 75),
    ];

    for (title, slug, desc, price_cents, quantity) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, shop_id, category_id, title, slug, description, price, quantity, brand)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'Acme')
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(shop_id)
        .bind(category_id)
        .bind(title)
        .bind(slug)
        .bind(desc)
        .bind(Decimal::new(price_cents, 2))
        .bind(quantity)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_coupons(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO coupons (id, name, discount, expiration_date)
        VALUES ($1, 'WELCOME10', 10, now() + interval '30 days')
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .execute(pool)
    .await?;

    println!("Seeded coupons");
    Ok(())
}
