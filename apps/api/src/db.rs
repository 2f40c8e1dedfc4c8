use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS candidates (
        id                      UUID PRIMARY KEY,
        name                    TEXT,
        email                   TEXT,
        original_filename       TEXT,
        resume_s3_key           TEXT,
        overall_score           DOUBLE PRECISION NOT NULL,
        is_qualified            BOOLEAN NOT NULL,
        resume                  JSONB NOT NULL,
        scoring                 JSONB NOT NULL,
        required_skills         TEXT[] NOT NULL DEFAULT '{}',
        min_experience_required INTEGER NOT NULL DEFAULT 0,
        created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS candidates_overall_score_idx ON candidates (overall_score DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS policies (
        name        TEXT NOT NULL,
        version     TEXT NOT NULL,
        category    TEXT NOT NULL,
        source      TEXT NOT NULL,
        content     TEXT NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (name, version)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS onboarding_plans (
        id                UUID PRIMARY KEY,
        employee_name     TEXT NOT NULL,
        role              TEXT NOT NULL,
        department        TEXT NOT NULL,
        start_date        DATE NOT NULL,
        generation_method TEXT NOT NULL,
        plan              JSONB NOT NULL,
        created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Creates the tables this service writes to when they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema verified");
    Ok(())
}
