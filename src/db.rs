use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

use crate::{auth::password::hash_password, config::Config, model::leave_balance::LeaveBalance};

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Creates the first admin from `ADMIN_EMAIL`/`ADMIN_PASSWORD` on an empty install.
pub async fn seed_admin(pool: &MySqlPool, config: &Config) -> Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let email = email.trim().to_lowercase();
    let hashed = hash_password(password).map_err(|e| anyhow::anyhow!(e))?;
    let defaults = LeaveBalance::default_allocation(0);

    let mut tx = pool.begin().await?;

    let employee_id = sqlx::query(
        r#"
        INSERT INTO employees (full_name, email, role, department)
        VALUES ('Administrator', ?, 'admin', 'Administration')
        "#,
    )
    .bind(&email)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    sqlx::query("INSERT INTO users (email, password, employee_id) VALUES (?, ?, ?)")
        .bind(&email)
        .bind(&hashed)
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO leave_balances
            (employee_id, casual_leaves, sick_leaves, earned_leaves, compensatory_leaves)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(defaults.casual_leaves)
    .bind(defaults.sick_leaves)
    .bind(defaults.earned_leaves)
    .bind(defaults.compensatory_leaves)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(employee_id, %email, "Seeded initial admin");
    Ok(())
}
