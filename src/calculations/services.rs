use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{PreviewResponse, RawInputs};
use super::repo_types::Calculation;

/// Arithmetic operation applied left-to-right over the inputs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl CalculationType {
    pub const ALL: [CalculationType; 4] = [
        CalculationType::Addition,
        CalculationType::Subtraction,
        CalculationType::Multiplication,
        CalculationType::Division,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CalculationType::Addition => "addition",
            CalculationType::Subtraction => "subtraction",
            CalculationType::Multiplication => "multiplication",
            CalculationType::Division => "division",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CalculationType::Addition => "Addition",
            CalculationType::Subtraction => "Subtraction",
            CalculationType::Multiplication => "Multiplication",
            CalculationType::Division => "Division",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CalculationType::Addition => "+",
            CalculationType::Subtraction => "-",
            CalculationType::Multiplication => "×",
            CalculationType::Division => "÷",
        }
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalculationType {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "addition" => Ok(CalculationType::Addition),
            "subtraction" => Ok(CalculationType::Subtraction),
            "multiplication" => Ok(CalculationType::Multiplication),
            "division" => Ok(CalculationType::Division),
            other => Err(CalcError::UnknownType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("At least two numbers are required")]
    TooFewInputs,
    #[error("Invalid number: '{0}'")]
    InvalidNumber(String),
    #[error("Cannot divide by zero")]
    DivisionByZero,
    #[error("Result is out of range")]
    OutOfRange,
    #[error("Unknown calculation type: '{0}'")]
    UnknownType(String),
}

/// Live state of the inputs field while the user types.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputStatus {
    Empty,
    Warning,
    Invalid,
    Valid,
}

pub const MIN_INPUTS: usize = 2;

fn tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

fn parse_token(token: &str) -> Result<f64, CalcError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CalcError::InvalidNumber(token.to_string()))
}

/// Parses a comma separated list such as `"5, 10, 15"`.
pub fn parse_inputs(raw: &str) -> Result<Vec<f64>, CalcError> {
    let values = tokens(raw).map(parse_token).collect::<Result<Vec<_>, _>>()?;
    validate_inputs(&values)?;
    Ok(values)
}

pub fn validate_inputs(values: &[f64]) -> Result<(), CalcError> {
    if values.len() < MIN_INPUTS {
        return Err(CalcError::TooFewInputs);
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(CalcError::InvalidNumber(bad.to_string()));
    }
    Ok(())
}

pub fn classify_inputs(raw: &str) -> (InputStatus, usize) {
    let mut count = 0;
    for token in tokens(raw) {
        if parse_token(token).is_err() {
            return (InputStatus::Invalid, count);
        }
        count += 1;
    }
    let status = match count {
        0 => InputStatus::Empty,
        1 => InputStatus::Warning,
        _ => InputStatus::Valid,
    };
    (status, count)
}

pub fn compute(kind: CalculationType, values: &[f64]) -> Result<f64, CalcError> {
    validate_inputs(values)?;
    let (first, rest) = values.split_first().ok_or(CalcError::TooFewInputs)?;
    let mut acc = *first;
    for &v in rest {
        acc = match kind {
            CalculationType::Addition => acc + v,
            CalculationType::Subtraction => acc - v,
            CalculationType::Multiplication => acc * v,
            CalculationType::Division => {
                if v == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                acc / v
            }
        };
    }
    if !acc.is_finite() {
        return Err(CalcError::OutOfRange);
    }
    Ok(acc)
}

/// Rounds away float noise and drops a trailing `.0`.
pub fn format_number(value: f64) -> String {
    let rounded = (value * 1e10).round() / 1e10;
    let rounded = if rounded.is_finite() { rounded } else { value };
    if rounded == 0.0 {
        // tiny non-zero results keep their exact digits; "-0" prints as "0"
        return if value == 0.0 { "0".to_string() } else { format!("{}", value) };
    }
    format!("{}", rounded)
}

pub fn format_inputs(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_number(*v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `5 + 10 + 15` style rendering of an operation.
pub fn expression(kind: CalculationType, values: &[f64]) -> String {
    values
        .iter()
        .map(|v| {
            let s = format_number(*v);
            if *v < 0.0 { format!("({s})") } else { s }
        })
        .collect::<Vec<_>>()
        .join(&format!(" {} ", kind.symbol()))
}

/// New calculation owned by `user_id`, with its result computed.
pub fn new_calculation(
    user_id: Uuid,
    kind: CalculationType,
    inputs: Vec<f64>,
) -> Result<Calculation, CalcError> {
    let result = compute(kind, &inputs)?;
    let now = OffsetDateTime::now_utc();
    Ok(Calculation {
        id: Uuid::new_v4(),
        user_id,
        kind,
        inputs,
        result,
        created_at: now,
        updated_at: now,
    })
}

/// Applies new type/inputs to a stored calculation and recomputes the result.
pub fn revise_calculation(
    existing: Calculation,
    kind: CalculationType,
    inputs: Vec<f64>,
) -> Result<Calculation, CalcError> {
    let result = compute(kind, &inputs)?;
    Ok(Calculation {
        kind,
        inputs,
        result,
        updated_at: OffsetDateTime::now_utc(),
        ..existing
    })
}

pub fn preview(kind: CalculationType, inputs: RawInputs) -> PreviewResponse {
    let (status, count) = match &inputs {
        RawInputs::Text(text) => classify_inputs(text),
        RawInputs::List(values) => match values.len() {
            0 => (InputStatus::Empty, 0),
            1 => (InputStatus::Warning, 1),
            n => (InputStatus::Valid, n),
        },
    };
    match inputs.into_values().and_then(|v| compute(kind, &v)) {
        Ok(result) => PreviewResponse {
            status,
            count,
            result: Some(result),
            display: Some(format_number(result)),
            error: None,
        },
        Err(e) => PreviewResponse {
            status,
            count,
            result: None,
            display: None,
            error: Some(e.to_string()),
        },
    }
}
