//! Database schema bootstrap for `leafcloud`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the database schema if missing (idempotent).
///
/// Tables:
/// - `experiments`: one row per bucket/device context
/// - `daily_readings`: sensor readings, optionally tagged with a lab sample label
/// - `lab_results`: ground-truth NPK keyed by sample label
/// - `npk_predictions`: oracle output per daily reading
///
/// Safe to call on every startup; no-op if objects already exist.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS experiments (
            id           BIGSERIAL PRIMARY KEY,
            bucket_label TEXT        NOT NULL UNIQUE,
            start_date   DATE        NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_readings (
            id                  BIGSERIAL PRIMARY KEY,
            bucket_id           BIGINT           NOT NULL REFERENCES experiments (id),
            timestamp           TIMESTAMPTZ      NOT NULL DEFAULT now(),
            image_path          TEXT,
            ph                  DOUBLE PRECISION NOT NULL,
            ec                  DOUBLE PRECISION NOT NULL,
            water_temp          DOUBLE PRECISION NOT NULL,
            sample_bottle_label TEXT,
            UNIQUE (bucket_id, timestamp)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Lab results are immutable once recorded
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lab_results (
            sample_bottle_label TEXT PRIMARY KEY,
            n_val               DOUBLE PRECISION NOT NULL,
            p_val               DOUBLE PRECISION NOT NULL,
            k_val               DOUBLE PRECISION NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS npk_predictions (
            id               BIGSERIAL PRIMARY KEY,
            daily_reading_id BIGINT           NOT NULL REFERENCES daily_readings (id),
            predicted_n      DOUBLE PRECISION NOT NULL,
            predicted_p      DOUBLE PRECISION NOT NULL,
            predicted_k      DOUBLE PRECISION NOT NULL,
            prediction_date  TIMESTAMPTZ      NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_daily_readings_timestamp
            ON daily_readings (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_npk_predictions_date
            ON npk_predictions (prediction_date);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
