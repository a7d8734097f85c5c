//! Synthetic training rows (`pollution_data` table)
//!
//! Writes use replace-table semantics: the table is dropped, recreated and
//! filled inside one transaction, so readers see either the previous data set
//! or the new one.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::pollutants::Pollutant;
use crate::Result;

pub const TRAINING_TABLE: &str = "pollution_data";

/// One hourly synthetic observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub timestamp: NaiveDateTime,
    pub city: String,
    /// Concentrations indexed by [`Pollutant::index`]
    pub concentrations: [f64; 6],
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    pub weather_condition: String,
    pub season: String,
    pub hour: u32,
    pub day_of_week: u32,
    pub is_weekend: bool,
}

impl TrainingRow {
    pub fn concentration(&self, pollutant: Pollutant) -> f64 {
        self.concentrations[pollutant.index()]
    }
}

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE pollution_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        city TEXT NOT NULL,
        pm25 REAL NOT NULL,
        pm10 REAL NOT NULL,
        no2 REAL NOT NULL,
        so2 REAL NOT NULL,
        co REAL NOT NULL,
        o3 REAL NOT NULL,
        temperature REAL NOT NULL,
        humidity REAL NOT NULL,
        wind_speed REAL NOT NULL,
        pressure REAL NOT NULL,
        weather_condition TEXT NOT NULL,
        season TEXT NOT NULL,
        hour INTEGER NOT NULL,
        day_of_week INTEGER NOT NULL,
        is_weekend INTEGER NOT NULL
    )
"#;

/// Replace the training table contents with `rows`
pub async fn replace_training_rows(pool: &SqlitePool, rows: &[TrainingRow]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DROP TABLE IF EXISTS pollution_data")
        .execute(&mut *tx)
        .await?;
    sqlx::query(CREATE_TABLE_SQL).execute(&mut *tx).await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO pollution_data (
                timestamp, city, pm25, pm10, no2, so2, co, o3,
                temperature, humidity, wind_speed, pressure,
                weather_condition, season, hour, day_of_week, is_weekend
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(row.timestamp)
        .bind(&row.city)
        .bind(row.concentrations[0])
        .bind(row.concentrations[1])
        .bind(row.concentrations[2])
        .bind(row.concentrations[3])
        .bind(row.concentrations[4])
        .bind(row.concentrations[5])
        .bind(row.temperature)
        .bind(row.humidity)
        .bind(row.wind_speed)
        .bind(row.pressure)
        .bind(&row.weather_condition)
        .bind(&row.season)
        .bind(row.hour as i64)
        .bind(row.day_of_week as i64)
        .bind(row.is_weekend as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(rows = rows.len(), table = TRAINING_TABLE, "Saved training rows");
    Ok(())
}

/// Load every training row in insertion order
///
/// Returns an empty vector when the table has never been written.
pub async fn load_training_rows(pool: &SqlitePool) -> Result<Vec<TrainingRow>> {
    if !training_table_exists(pool).await? {
        debug!("Training table not present");
        return Ok(Vec::new());
    }

    let rows = sqlx::query(
        r#"
        SELECT timestamp, city, pm25, pm10, no2, so2, co, o3,
               temperature, humidity, wind_speed, pressure,
               weather_condition, season, hour, day_of_week, is_weekend
        FROM pollution_data
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(TrainingRow {
            timestamp: row.try_get("timestamp")?,
            city: row.try_get("city")?,
            concentrations: [
                row.try_get("pm25")?,
                row.try_get("pm10")?,
                row.try_get("no2")?,
                row.try_get("so2")?,
                row.try_get("co")?,
                row.try_get("o3")?,
            ],
            temperature: row.try_get("temperature")?,
            humidity: row.try_get("humidity")?,
            wind_speed: row.try_get("wind_speed")?,
            pressure: row.try_get("pressure")?,
            weather_condition: row.try_get("weather_condition")?,
            season: row.try_get("season")?,
            hour: row.try_get::<i64, _>("hour")? as u32,
            day_of_week: row.try_get::<i64, _>("day_of_week")? as u32,
            is_weekend: row.try_get::<i64, _>("is_weekend")? != 0,
        });
    }

    Ok(out)
}

/// Number of stored training rows (0 when the table does not exist)
pub async fn count_training_rows(pool: &SqlitePool) -> Result<i64> {
    if !training_table_exists(pool).await? {
        return Ok(0);
    }
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pollution_data")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn training_table_exists(pool: &SqlitePool) -> Result<bool> {
    let exists: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(TRAINING_TABLE)
            .fetch_optional(pool)
            .await?;
    Ok(exists.is_some())
}
