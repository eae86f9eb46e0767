use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Calculation, CalculationRow};

const COLUMNS: &str = "id, user_id, type, inputs, result, created_at, updated_at";

fn into_domain(row: CalculationRow) -> anyhow::Result<Calculation> {
    let id = row.id;
    Calculation::try_from(row).with_context(|| format!("decode calculation {}", id))
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: Option<i64>,
    offset: i64,
) -> anyhow::Result<Vec<Calculation>> {
    // LIMIT NULL means no limit in Postgres
    let rows = sqlx::query_as::<_, CalculationRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM calculations
        WHERE user_id = $1
        ORDER BY created_at DESC, id
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list calculations")?;
    rows.into_iter().map(into_domain).collect()
}

pub async fn get_by_id(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<Option<Calculation>> {
    let row = sqlx::query_as::<_, CalculationRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM calculations
        WHERE id = $1 AND user_id = $2
        "#
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get calculation")?;
    row.map(into_domain).transpose()
}

pub async fn insert(db: &PgPool, calc: &Calculation) -> anyhow::Result<Calculation> {
    let row = sqlx::query_as::<_, CalculationRow>(&format!(
        r#"
        INSERT INTO calculations (id, user_id, type, inputs, result, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(calc.id)
    .bind(calc.user_id)
    .bind(calc.kind.as_str())
    .bind(&calc.inputs)
    .bind(calc.result)
    .bind(calc.created_at)
    .bind(calc.updated_at)
    .fetch_one(db)
    .await
    .context("insert calculation")?;
    into_domain(row)
}

pub async fn update(db: &PgPool, calc: &Calculation) -> anyhow::Result<Option<Calculation>> {
    let row = sqlx::query_as::<_, CalculationRow>(&format!(
        r#"
        UPDATE calculations
        SET type = $3, inputs = $4, result = $5, updated_at = $6
        WHERE id = $1 AND user_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(calc.id)
    .bind(calc.user_id)
    .bind(calc.kind.as_str())
    .bind(&calc.inputs)
    .bind(calc.result)
    .bind(calc.updated_at)
    .fetch_optional(db)
    .await
    .context("update calculation")?;
    row.map(into_domain).transpose()
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM calculations WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete calculation")?;
    Ok(res.rows_affected() > 0)
}
