use crate::database::models::{
    AttendanceRecord, NewAttendanceRecord, NewSite, RecordLocation, RecordType, ScheduleConfig,
    Site, User, UserRole,
};
use crate::utils::time::parse_time_string;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const SCHEDULE_CONFIG_ID: &str = "default";

fn decode_error(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

// User queries
pub async fn create_or_get_user(
    pool: &SqlitePool,
    discord_id: &str,
    username: &str,
) -> sqlx::Result<User> {
    // Try to get existing user first
    if let Some(user) = get_user_by_discord_id(pool, discord_id).await? {
        return Ok(user);
    }

    // Create new user if not exists
    let result = sqlx::query(
        "INSERT INTO users (discord_id, username) VALUES (?, ?)"
    )
    .bind(discord_id)
    .bind(username)
    .execute(pool)
    .await?;

    let user_id = result.last_insert_rowid();
    get_user_by_id(pool, user_id).await
}

fn user_from_row(row: &SqliteRow) -> sqlx::Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        discord_id: row.try_get("discord_id")?,
        username: row.try_get("username")?,
        name: row.try_get("name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        role: role.parse::<UserRole>().map_err(|e| decode_error(e.to_string()))?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn get_user_by_discord_id(pool: &SqlitePool, discord_id: &str) -> sqlx::Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, discord_id, username, name, last_name, email, role, created_at
         FROM users WHERE discord_id = ?"
    )
    .bind(discord_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> sqlx::Result<User> {
    let row = sqlx::query(
        "SELECT id, discord_id, username, name, last_name, email, role, created_at
         FROM users WHERE id = ?"
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    user_from_row(&row)
}

pub async fn update_user_profile(
    pool: &SqlitePool,
    user_id: i64,
    name: &str,
    last_name: &str,
    email: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET name = ?, last_name = ?, email = ? WHERE id = ?")
        .bind(name)
        .bind(last_name)
        .bind(email)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_user_role(pool: &SqlitePool, user_id: i64, role: UserRole) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role.as_str())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

// Site queries
fn site_from_row(row: &SqliteRow) -> sqlx::Result<Site> {
    let schedule_json: Option<String> = row.try_get("schedule_config")?;
    let schedule_config = match schedule_json {
        Some(json) => Some(
            serde_json::from_str::<ScheduleConfig>(&json)
                .map_err(|e| decode_error(format!("invalid site schedule: {}", e)))?,
        ),
        None => None,
    };

    Ok(Site {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        radius_meters: row.try_get("radius_meters")?,
        schedule_config,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// All sites in registry order (ascending id).
pub async fn list_sites(pool: &SqlitePool) -> sqlx::Result<Vec<Site>> {
    let rows = sqlx::query(
        "SELECT id, name, latitude, longitude, radius_meters, schedule_config, created_at, updated_at
         FROM sites ORDER BY id ASC"
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(site_from_row).collect()
}

pub async fn get_site_by_id(pool: &SqlitePool, site_id: i64) -> sqlx::Result<Option<Site>> {
    let row = sqlx::query(
        "SELECT id, name, latitude, longitude, radius_meters, schedule_config, created_at, updated_at
         FROM sites WHERE id = ?"
    )
    .bind(site_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(site_from_row).transpose()
}

pub async fn create_site(pool: &SqlitePool, site: &NewSite) -> sqlx::Result<Site> {
    let result = sqlx::query(
        "INSERT INTO sites (name, latitude, longitude, radius_meters) VALUES (?, ?, ?, ?)"
    )
    .bind(&site.name)
    .bind(site.latitude)
    .bind(site.longitude)
    .bind(site.radius_meters)
    .execute(pool)
    .await?;

    let site_id = result.last_insert_rowid();
    get_site_by_id(pool, site_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_site(pool: &SqlitePool, site_id: i64, site: &NewSite) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE sites
         SET name = ?, latitude = ?, longitude = ?, radius_meters = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?"
    )
    .bind(&site.name)
    .bind(site.latitude)
    .bind(site.longitude)
    .bind(site.radius_meters)
    .bind(site_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_site(pool: &SqlitePool, site_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM sites WHERE id = ?")
        .bind(site_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Sets or clears (`None`) the per-site schedule override.
pub async fn update_site_schedule(
    pool: &SqlitePool,
    site_id: i64,
    schedule: Option<&ScheduleConfig>,
) -> sqlx::Result<bool> {
    let json = schedule
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| sqlx::Error::Encode(e.into()))?;

    let result = sqlx::query(
        "UPDATE sites SET schedule_config = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?"
    )
    .bind(json)
    .bind(site_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Schedule config queries
fn schedule_from_row(row: &SqliteRow) -> sqlx::Result<ScheduleConfig> {
    let work_days: String = row.try_get("work_days")?;
    let entry_time: String = row.try_get("entry_time")?;
    let exit_time: String = row.try_get("exit_time")?;
    let tolerance_minutes: i64 = row.try_get("tolerance_minutes")?;

    Ok(ScheduleConfig {
        work_days: ScheduleConfig::parse_work_days(&work_days)
            .map_err(|e| decode_error(e.to_string()))?,
        entry_time: parse_time_string(&entry_time).map_err(|e| decode_error(e.to_string()))?,
        exit_time: parse_time_string(&exit_time).map_err(|e| decode_error(e.to_string()))?,
        tolerance_minutes: u32::try_from(tolerance_minutes)
            .map_err(|_| decode_error(format!("invalid tolerance: {}", tolerance_minutes)))?,
    })
}

pub async fn get_schedule_config(pool: &SqlitePool) -> sqlx::Result<Option<ScheduleConfig>> {
    let row = sqlx::query(
        "SELECT work_days, entry_time, exit_time, tolerance_minutes FROM schedule_config WHERE id = ?"
    )
    .bind(SCHEDULE_CONFIG_ID)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(schedule_from_row).transpose()
}

/// Reads the global schedule, inserting the default first if none exists yet.
pub async fn load_or_create_schedule_config(pool: &SqlitePool) -> sqlx::Result<ScheduleConfig> {
    let defaults = ScheduleConfig::default();
    let result = sqlx::query(
        "INSERT OR IGNORE INTO schedule_config (id, work_days, entry_time, exit_time, tolerance_minutes)
         VALUES (?, ?, ?, ?, ?)"
    )
    .bind(SCHEDULE_CONFIG_ID)
    .bind(defaults.work_days_to_string())
    .bind(defaults.entry_time.format("%H:%M").to_string())
    .bind(defaults.exit_time.format("%H:%M").to_string())
    .bind(defaults.tolerance_minutes as i64)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::info!("Created default schedule configuration");
    }

    get_schedule_config(pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn save_schedule_config(pool: &SqlitePool, config: &ScheduleConfig) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO schedule_config (id, work_days, entry_time, exit_time, tolerance_minutes)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            work_days = excluded.work_days,
            entry_time = excluded.entry_time,
            exit_time = excluded.exit_time,
            tolerance_minutes = excluded.tolerance_minutes"
    )
    .bind(SCHEDULE_CONFIG_ID)
    .bind(config.work_days_to_string())
    .bind(config.entry_time.format("%H:%M").to_string())
    .bind(config.exit_time.format("%H:%M").to_string())
    .bind(config.tolerance_minutes as i64)
    .execute(pool)
    .await?;

    Ok(())
}

// Attendance record queries
const RECORD_COLUMNS: &str = "id, user_id, record_type, timestamp, date, latitude, longitude, accuracy,
    nearest_site_id, nearest_site_name, distance_to_site_meters, note, justification,
    created_at, updated_at";

fn record_from_row(row: &SqliteRow) -> sqlx::Result<AttendanceRecord> {
    let record_type: String = row.try_get("record_type")?;
    Ok(AttendanceRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        record_type: record_type
            .parse::<RecordType>()
            .map_err(|e| decode_error(e.to_string()))?,
        timestamp: row.try_get("timestamp")?,
        date: row.try_get("date")?,
        location: RecordLocation {
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            accuracy: row.try_get("accuracy")?,
            nearest_site_id: row.try_get("nearest_site_id")?,
            nearest_site_name: row.try_get("nearest_site_name")?,
            distance_to_site_meters: row.try_get("distance_to_site_meters")?,
        },
        note: row.try_get("note")?,
        justification: row.try_get("justification")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Inserts the record only if the user's open-shift count for that date still
/// permits this record type. Returns `None` when the condition failed.
pub async fn insert_attendance_record_if_sequence_allows(
    pool: &SqlitePool,
    record: &NewAttendanceRecord,
) -> sqlx::Result<Option<AttendanceRecord>> {
    // open = entradas - salidas for (user_id, date)
    let condition = match record.record_type {
        RecordType::Entrada => "<= 0",
        RecordType::Salida => "> 0",
    };

    let sql = format!(
        "INSERT INTO attendance_records
            (user_id, record_type, timestamp, date, latitude, longitude, accuracy,
             nearest_site_id, nearest_site_name, distance_to_site_meters, note)
         SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
         WHERE (
            SELECT COALESCE(SUM(CASE record_type WHEN 'entrada' THEN 1 ELSE -1 END), 0)
            FROM attendance_records
            WHERE user_id = ? AND date = ?
         ) {}",
        condition
    );

    let result = sqlx::query(&sql)
        .bind(record.user_id)
        .bind(record.record_type.as_str())
        .bind(record.timestamp)
        .bind(record.date)
        .bind(record.location.latitude)
        .bind(record.location.longitude)
        .bind(record.location.accuracy)
        .bind(record.location.nearest_site_id)
        .bind(&record.location.nearest_site_name)
        .bind(record.location.distance_to_site_meters)
        .bind(record.note.as_deref())
        .bind(record.user_id)
        .bind(record.date)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_attendance_record_by_id(pool, result.last_insert_rowid())
        .await
        .map(Some)
}

pub async fn get_attendance_record_by_id(pool: &SqlitePool, record_id: i64) -> sqlx::Result<AttendanceRecord> {
    let sql = format!("SELECT {} FROM attendance_records WHERE id = ?", RECORD_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(record_id)
        .fetch_one(pool)
        .await?;

    record_from_row(&row)
}

pub async fn get_user_records_by_date(
    pool: &SqlitePool,
    user_id: i64,
    date: NaiveDate,
) -> sqlx::Result<Vec<AttendanceRecord>> {
    let sql = format!(
        "SELECT {} FROM attendance_records
         WHERE user_id = ? AND date = ?
         ORDER BY timestamp ASC, id ASC",
        RECORD_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(date)
        .fetch_all(pool)
        .await?;

    rows.iter().map(record_from_row).collect()
}

pub async fn get_records_by_date(pool: &SqlitePool, date: NaiveDate) -> sqlx::Result<Vec<AttendanceRecord>> {
    let sql = format!(
        "SELECT {} FROM attendance_records
         WHERE date = ?
         ORDER BY timestamp ASC, id ASC",
        RECORD_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(date)
        .fetch_all(pool)
        .await?;

    rows.iter().map(record_from_row).collect()
}

/// Owner-scoped note patch. Returns false when no record matched.
pub async fn update_record_note(
    pool: &SqlitePool,
    record_id: i64,
    user_id: i64,
    note: Option<&str>,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE attendance_records SET note = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ? AND user_id = ?"
    )
    .bind(note)
    .bind(record_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_record_justification(
    pool: &SqlitePool,
    record_id: i64,
    justification: Option<&str>,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE attendance_records SET justification = ?, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?"
    )
    .bind(justification)
    .bind(record_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
