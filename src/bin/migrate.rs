use marketplace_api::db::{create_orm_conn, create_pool, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Only the database is needed here, so skip the full AppConfig.
    let database_url = std::env::var("DATABASE_URL")?;
    let pool = create_pool(&database_url).await?;
    run_migrations(&create_orm_conn(&pool)).await?;
    println!("Migrations applied");
    Ok(())
}
