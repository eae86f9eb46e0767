use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::services::{CalcError, CalculationType};

/// Row as stored in the `calculations` table.
#[derive(Debug, Clone, FromRow)]
pub struct CalculationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub inputs: Vec<f64>,
    pub result: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Calculation {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: CalculationType,
    pub inputs: Vec<f64>,
    pub result: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<CalculationRow> for Calculation {
    type Error = CalcError;

    fn try_from(r: CalculationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            kind: r.kind.parse()?,
            inputs: r.inputs,
            result: r.result,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
