use serde::Serialize;

/// Failure raised by the commission pipeline or amortization engine.
///
/// Only validation and unknown-bank failures ever reach a caller; unknown provinces and
/// exchange-rate outages are absorbed by defaults further down.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    /// Body that could not be decoded into a request at all (missing field, wrong type).
    #[error("malformed request: {message}")]
    MalformedRequest { message: String },
    #[error("no mortgage rate on record for bank '{bank}' and no interestRate supplied")]
    UnknownBankRate { bank: String },
}

impl CalculationError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CalculationError::Validation { .. } | CalculationError::MalformedRequest { .. } => {
                "validation"
            }
            CalculationError::UnknownBankRate { .. } => "unknown_bank_rate",
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            CalculationError::Validation { field, .. } => Some(field),
            CalculationError::MalformedRequest { .. } => None,
            CalculationError::UnknownBankRate { .. } => Some("bankName"),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            field: self.field(),
            error: self.to_string(),
        }
    }
}

/// Wire shape of a rejected calculation.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    pub error: String,
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, CalculationError> {
    if !value.is_finite() {
        return Err(CalculationError::validation(field, "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(CalculationError::validation(field, "must be greater than zero"));
    }
    Ok(value)
}

pub(crate) fn require_percentage(field: &'static str, value: f64) -> Result<f64, CalculationError> {
    if !value.is_finite() {
        return Err(CalculationError::validation(field, "must be a finite number"));
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(CalculationError::validation(
            field,
            "must be a percentage between 0 and 100",
        ));
    }
    Ok(value)
}
