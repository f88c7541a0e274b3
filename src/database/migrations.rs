use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_users_table(pool).await?;
    create_sites_table(pool).await?;
    create_schedule_config_table(pool).await?;
    create_attendance_records_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            discord_id TEXT UNIQUE NOT NULL,
            username TEXT NOT NULL,
            name TEXT,
            last_name TEXT,
            email TEXT,
            role TEXT NOT NULL DEFAULT 'employee' CHECK (role IN ('employee', 'admin')),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sites_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sites (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            radius_meters REAL NOT NULL CHECK (radius_meters > 0),
            schedule_config TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_schedule_config_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedule_config (
            id TEXT PRIMARY KEY,
            work_days TEXT NOT NULL,
            entry_time TEXT NOT NULL,
            exit_time TEXT NOT NULL,
            tolerance_minutes INTEGER NOT NULL CHECK (tolerance_minutes >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attendance_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_records (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            record_type TEXT NOT NULL CHECK (record_type IN ('entrada', 'salida')),
            timestamp DATETIME NOT NULL,
            date DATE NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            accuracy REAL,
            nearest_site_id INTEGER NOT NULL,
            nearest_site_name TEXT NOT NULL,
            distance_to_site_meters INTEGER NOT NULL,
            note TEXT,
            justification TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (user_id) REFERENCES users (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_attendance_user_date
         ON attendance_records (user_id, date, timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
