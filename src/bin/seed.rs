use marketplace_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    services::account_service::{hash_password, new_referral_code},
};
use uuid::Uuid;

struct SeedAccount<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    role: &'a str,
}

const ACCOUNTS: [SeedAccount<'static>; 3] = [
    SeedAccount {
        username: "superadmin",
        email: "superadmin@example.com",
        password: "superadmin123",
        role: "superadmin",
    },
    SeedAccount {
        username: "shopowner",
        email: "admin@example.com",
        password: "admin123",
        role: "admin",
    },
    SeedAccount {
        username: "customer",
        email: "user@example.com",
        password: "user123",
        role: "user",
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let pool = create_pool(&database_url).await?;
    run_migrations(&create_orm_conn(&pool)).await?;

    let mut ids = Vec::with_capacity(ACCOUNTS.len());
    for account in &ACCOUNTS {
        ids.push(ensure_account(&pool, account).await?);
    }
    // The admin account owns every seeded shop.
    seed_listings(&pool, ids[1]).await?;

    println!(
        "Seed completed. Superadmin ID: {}, Admin ID: {}, User ID: {}",
        ids[0], ids[1], ids[2]
    );
    Ok(())
}

async fn ensure_account(pool: &sqlx::PgPool, account: &SeedAccount<'_>) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(account.password)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO accounts (
            id, username, email, password_hash, role,
            first_name, last_name, phone_number, referral_code
        )
        VALUES ($1, $2, $3, $4, $5, $6, 'Seed', '0000000000', $7)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, active = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(account.username)
    .bind(account.email)
    .bind(password_hash)
    .bind(account.role)
    .bind(account.username)
    .bind(new_referral_code())
    .fetch_one(pool)
    .await?;

    println!("Ensured account {} (role={})", account.email, account.role);
    Ok(id)
}

async fn seed_listings(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<()> {
    let listings = [
        ("Ferris Coffee Bar", "coffee", "espresso latte beans", 25000, "12 Harbor St"),
        ("Crab Claw Barbers", "barbers", "haircut shave beard", 80000, "4 Mill Lane"),
        ("Borrowed Beauty Salon", "salon", "hair color nails", 150000, "88 Market Sq"),
        ("Lifetime Spa", "spa", "massage sauna facial", 300000, "1 Lake Rd"),
    ];

    for (name, category, keywords, price, address) in listings {
        sqlx::query(
            r#"
            INSERT INTO listings (
                id, name, category, keywords, price, address,
                contact_email, contact_number, owner_id, approved, available
            )
            SELECT $1, $2, $3, $4, $5, $6, email, phone_number, id, TRUE, TRUE
            FROM accounts WHERE id = $7
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(category)
        .bind(keywords)
        .bind(price as i64)
        .bind(address)
        .bind(owner_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded shops");
    Ok(())
}
