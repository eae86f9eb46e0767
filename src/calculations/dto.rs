use serde::{Deserialize, Serialize};

use super::repo_types::Calculation;
use super::services::{
    expression, format_number, parse_inputs, validate_inputs, CalcError, CalculationType,
    InputStatus,
};

/// Inputs as sent by API clients (a number array) or by the HTML form
/// (the raw comma separated text).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawInputs {
    List(Vec<f64>),
    Text(String),
}

impl RawInputs {
    pub fn into_values(self) -> Result<Vec<f64>, CalcError> {
        match self {
            RawInputs::List(values) => {
                validate_inputs(&values)?;
                Ok(values)
            }
            RawInputs::Text(text) => parse_inputs(&text),
        }
    }
}

impl Default for RawInputs {
    fn default() -> Self {
        RawInputs::Text(String::new())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCalculationRequest {
    #[serde(rename = "type")]
    pub kind: CalculationType,
    #[serde(default)]
    pub inputs: RawInputs,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCalculationRequest {
    /// Keeps the stored type when absent.
    #[serde(rename = "type", default)]
    pub kind: Option<CalculationType>,
    #[serde(default)]
    pub inputs: RawInputs,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(rename = "type")]
    pub kind: CalculationType,
    #[serde(default)]
    pub inputs: RawInputs,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PreviewResponse {
    pub status: InputStatus,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Stored calculation plus its display strings.
#[derive(Debug, Serialize)]
pub struct CalculationResponse {
    #[serde(flatten)]
    pub calculation: Calculation,
    pub display: String,
    pub expression: String,
}

impl From<Calculation> for CalculationResponse {
    fn from(calculation: Calculation) -> Self {
        Self {
            display: format_number(calculation.result),
            expression: expression(calculation.kind, &calculation.inputs),
            calculation,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 100 }
