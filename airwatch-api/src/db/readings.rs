//! Ingested AQI readings

use super::{decode_time, encode_time};
use airwatch_engine::subscription::location_key;
use airwatch_engine::{AqiReading, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

fn row_to_reading(row: &SqliteRow) -> std::result::Result<AqiReading, sqlx::Error> {
    let value: i64 = row.try_get("value")?;
    let observed_at: String = row.try_get("observed_at")?;
    Ok(AqiReading {
        value: u32::try_from(value).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        location: row.try_get("location")?,
        timestamp: decode_time(&observed_at)?,
    })
}

fn collect(rows: Vec<SqliteRow>) -> Result<Vec<AqiReading>> {
    rows.iter()
        .map(|row| row_to_reading(row).map_err(Into::into))
        .collect()
}

/// Store one reading
pub async fn insert_reading(pool: &SqlitePool, reading: &AqiReading) -> Result<()> {
    sqlx::query(
        "INSERT INTO readings (location, location_key, value, observed_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&reading.location)
    .bind(location_key(&reading.location))
    .bind(reading.value as i64)
    .bind(encode_time(reading.timestamp))
    .execute(pool)
    .await?;
    Ok(())
}

/// Most recent reading for a location (case-insensitive), if any
pub async fn latest_for_location(pool: &SqlitePool, location: &str) -> Result<Option<AqiReading>> {
    let row = sqlx::query(
        r#"
        SELECT location, value, observed_at FROM readings
        WHERE location_key = ?
        ORDER BY observed_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(location_key(location))
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(row_to_reading).transpose()?)
}

/// Up to `limit` most recent readings for a location, newest first
pub async fn recent_for_location(
    pool: &SqlitePool,
    location: &str,
    limit: i64,
) -> Result<Vec<AqiReading>> {
    let rows = sqlx::query(
        r#"
        SELECT location, value, observed_at FROM readings
        WHERE location_key = ?
        ORDER BY observed_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(location_key(location))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    collect(rows)
}

/// Every reading for a location (case-insensitive), oldest first
pub async fn history_for_location(pool: &SqlitePool, location: &str) -> Result<Vec<AqiReading>> {
    let rows = sqlx::query(
        r#"
        SELECT location, value, observed_at FROM readings
        WHERE location_key = ?
        ORDER BY observed_at ASC, id ASC
        "#,
    )
    .bind(location_key(location))
    .fetch_all(pool)
    .await?;
    collect(rows)
}

/// Latest reading for every location seen so far
pub async fn latest_per_location(pool: &SqlitePool) -> Result<Vec<AqiReading>> {
    let rows = sqlx::query(
        r#"
        SELECT location, value, observed_at FROM (
            SELECT location, location_key, value, observed_at,
                   ROW_NUMBER() OVER (
                       PARTITION BY location_key ORDER BY observed_at DESC, id DESC
                   ) AS rn
            FROM readings
        )
        WHERE rn = 1
        ORDER BY location_key
        "#,
    )
    .fetch_all(pool)
    .await?;
    collect(rows)
}
