//! Seed script for development. Bootstraps the first super admin and loads
//! sample centers, courses, stock and students into a fresh database.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` and `JWT_SECRET` (reads .env). The super admin
//! credentials come from `SEED_ADMIN_EMAIL` and `SEED_ADMIN_PASSWORD`.

use anyhow::Context;
use campusdesk::config::AppConfig;
use campusdesk::models::center::CreateCenter;
use campusdesk::models::principal::Profile;
use campusdesk::models::role::AppRole;
use campusdesk::services::identity::IdentityProvider;
use campusdesk::{db, AppState};
use sqlx::PgPool;

const DEFAULT_ADMIN_EMAIL: &str = "admin@campusdesk.local";
const DEFAULT_ADMIN_PASSWORD: &str = "ChangeMe123!";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("DATABASE_URL and JWT_SECRET must be set")?;
    let pool = db::create_pool(&config.database_url, 5).await?;
    db::migrate(&pool).await?;
    let state = AppState::with_postgres(config, pool.clone());

    println!("=== campusdesk seed ===");

    let admin_email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
    let admin_password = std::env::var("SEED_ADMIN_PASSWORD")
        .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());

    seed_super_admin(&state, &pool, &admin_email, &admin_password).await?;
    seed_centers(&state, &pool).await?;
    seed_courses(&pool).await?;
    seed_stock_items(&pool).await?;
    seed_students(&pool).await?;

    println!("\n=== Seed complete! ===");
    println!("Super admin login: {admin_email}");

    Ok(())
}

async fn seed_super_admin(
    state: &AppState,
    pool: &PgPool,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let existing: Option<uuid::Uuid> =
        sqlx::query_scalar("SELECT user_id FROM credentials WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    if let Some(user_id) = existing {
        state.identity.set_password(user_id, password).await?;
        state.directory.assign_role(user_id, AppRole::SuperAdmin).await?;
        println!("[done] Reset super admin password");
        return Ok(());
    }

    let identity = state.identity.sign_up(email, password).await?;
    state
        .directory
        .upsert_profile(&Profile {
            user_id: identity.user_id,
            email: identity.email.clone(),
            full_name: Some("Franchise Administrator".to_string()),
            center_id: None,
        })
        .await?;
    state
        .directory
        .assign_role(identity.user_id, AppRole::SuperAdmin)
        .await?;

    println!("[done] Created super admin {email}");
    Ok(())
}

async fn seed_centers(state: &AppState, pool: &PgPool) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM centers")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        println!("[skip] Centers already exist ({count})");
        return Ok(());
    }

    let centers = [
        ("Kothrud Learning Center", "PUN-01", "Pune", "Maharashtra"),
        ("Andheri Learning Center", "MUM-01", "Mumbai", "Maharashtra"),
        ("Indiranagar Learning Center", "BLR-01", "Bengaluru", "Karnataka"),
    ];
    for (name, code, city, region) in centers {
        state
            .records
            .insert_center(&CreateCenter {
                name: name.to_string(),
                code: code.to_string(),
                email: None,
                phone: None,
                address: None,
                city: Some(city.to_string()),
                state: Some(region.to_string()),
            })
            .await?;
    }

    println!("[done] Created {} sample centers", centers.len());
    Ok(())
}

async fn seed_courses(pool: &PgPool) -> anyhow::Result<()> {
    let courses = [
        ("Abacus Level 1", "ABA-1", 6, "4500.00"),
        ("Abacus Level 2", "ABA-2", 6, "4800.00"),
        ("Vedic Maths", "VED-1", 4, "3900.00"),
        ("Handwriting", "HW-1", 3, "2500.00"),
    ];
    for (name, code, months, fee) in courses {
        sqlx::query(
            "INSERT INTO courses (name, code, duration_months, fee)
             VALUES ($1, $2, $3, $4::numeric)
             ON CONFLICT (code) DO NOTHING",
        )
        .bind(name)
        .bind(code)
        .bind(months)
        .bind(fee)
        .execute(pool)
        .await?;
    }
    println!("[done] Ensured {} courses", courses.len());
    Ok(())
}

async fn seed_stock_items(pool: &PgPool) -> anyhow::Result<()> {
    let items = [
        ("Abacus tool", "STK-ABACUS", "350.00", 120),
        ("Level 1 workbook", "STK-WB-1", "180.00", 8),
        ("Level 2 workbook", "STK-WB-2", "190.00", 40),
        ("Certificate pack", "STK-CERT", "25.00", 0),
    ];
    for (name, sku, price, quantity) in items {
        sqlx::query(
            "INSERT INTO stock_items (name, sku, unit_price, quantity)
             VALUES ($1, $2, $3::numeric, $4)
             ON CONFLICT (sku) DO NOTHING",
        )
        .bind(name)
        .bind(sku)
        .bind(price)
        .bind(quantity)
        .execute(pool)
        .await?;
    }
    println!("[done] Ensured {} stock items", items.len());
    Ok(())
}

async fn seed_students(pool: &PgPool) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        println!("[skip] Students already exist ({count})");
        return Ok(());
    }

    let inserted = sqlx::query(
        "INSERT INTO students (center_id, course_id, full_name)
         SELECT c.id, co.id, c.code || ' student ' || n
         FROM centers c
         CROSS JOIN generate_series(1, 5) AS n
         LEFT JOIN LATERAL (SELECT id FROM courses ORDER BY code LIMIT 1) co ON TRUE",
    )
    .execute(pool)
    .await?
    .rows_affected();

    println!("[done] Created {inserted} sample students");
    Ok(())
}
