//! Fixed-installment (French/annuity) amortization for UVA mortgage simulation.
//!
//! Schedules are produced in the loan's own unit of account. Currency conversion and index
//! restatement happen outside this module and never feed back into the table.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{require_percentage, require_positive, CalculationError};
use super::registry::{BankRate, RateRegistry};

pub const MAX_TERM_YEARS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageRequest {
    pub loan_amount: f64,
    /// Annual nominal rate (TNA) in whole percent.
    #[serde(default)]
    pub interest_rate: Option<f64>,
    pub term_years: u32,
    #[serde(default)]
    pub bank_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationEntry {
    pub month: u32,
    pub payment: f64,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub remaining_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageResult {
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub term_years: u32,
    pub installments: u32,
    pub monthly_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub amortization_table: Vec<AmortizationEntry>,
}

/// Fixed installment for `principal` over `installments` periods at `monthly_rate`.
///
/// Evaluated as `P·i / (1 − (1+i)^−n)`, which stays finite both for rates so small that
/// `1 + i` rounds to one and for rates whose growth factor would overflow.
pub fn annuity_payment(principal: f64, monthly_rate: f64, installments: u32) -> f64 {
    let n = f64::from(installments);
    let discounted = discount_factor(monthly_rate, n);
    if discounted == 0.0 {
        return principal / n;
    }
    principal * monthly_rate / discounted
}

/// `1 − (1+i)^−periods`, computed through `ln_1p`/`exp_m1` so it keeps full precision near zero.
fn discount_factor(monthly_rate: f64, periods: f64) -> f64 {
    -(-periods * monthly_rate.ln_1p()).exp_m1()
}

/// Full schedule for a loan.
///
/// Each row's remaining balance comes from the closed form `P · a(n−k) / a(n)` rather than by
/// subtracting principal month after month, so rounding never compounds across a long term.
/// The final balance is exactly zero and the final row repays whatever the previous one left.
pub fn amortization_schedule(
    principal: f64,
    monthly_rate: f64,
    installments: u32,
) -> Vec<AmortizationEntry> {
    let n = f64::from(installments);
    let full_term = discount_factor(monthly_rate, n);
    let outstanding = |remaining: u32| {
        let periods = f64::from(remaining);
        if full_term == 0.0 {
            principal * (periods / n)
        } else {
            principal * (discount_factor(monthly_rate, periods) / full_term)
        }
    };

    let mut balance = principal;
    let mut table = Vec::with_capacity(installments as usize);

    for month in 1..=installments {
        let interest_portion = balance * monthly_rate;
        let remaining_balance = if month == installments {
            0.0
        } else {
            outstanding(installments - month)
        };
        let principal_portion = balance - remaining_balance;
        balance = remaining_balance;

        table.push(AmortizationEntry {
            month,
            payment: principal_portion + interest_portion,
            principal_portion,
            interest_portion,
            remaining_balance,
        });
    }

    table
}

impl AmortizationEntry {
    pub fn is_finite(&self) -> bool {
        self.payment.is_finite()
            && self.principal_portion.is_finite()
            && self.interest_portion.is_finite()
            && self.remaining_balance.is_finite()
    }
}

/// Stateless engine resolving the effective rate and producing the schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmortizationEngine;

impl AmortizationEngine {
    pub fn simulate(
        &self,
        registry: &RateRegistry,
        request: &MortgageRequest,
    ) -> Result<MortgageResult, CalculationError> {
        let loan_amount = require_positive("loanAmount", request.loan_amount)?;
        let term_years = validate_term(request.term_years)?;

        let bank = request
            .bank_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| (name, registry.bank_rate_by_name(name)));

        let interest_rate = match (request.interest_rate, bank) {
            (Some(rate), _) => validate_rate(rate)?,
            (None, Some((_, Some(bank_rate)))) => bank_rate.rate,
            (None, Some((name, None))) => {
                return Err(CalculationError::UnknownBankRate {
                    bank: name.to_string(),
                })
            }
            (None, None) => {
                return Err(CalculationError::validation(
                    "interestRate",
                    "is required when no bankName is supplied",
                ))
            }
        };

        let known_bank = bank.and_then(|(_, rate)| rate);
        if let Some(BankRate {
            bank: lender,
            max_term_years: Some(max_term),
            ..
        }) = known_bank
        {
            if term_years > *max_term {
                return Err(CalculationError::validation(
                    "termYears",
                    format!("{lender} lends for at most {max_term} years"),
                ));
            }
        }

        let installments = term_years * 12;
        let monthly_rate = interest_rate / 100.0 / 12.0;
        let monthly_payment = annuity_payment(loan_amount, monthly_rate, installments);
        let amortization_table = amortization_schedule(loan_amount, monthly_rate, installments);

        let total_payment: f64 = amortization_table.iter().map(|row| row.payment).sum();
        let total_interest = total_payment - loan_amount;

        let representable = monthly_payment.is_finite()
            && total_payment.is_finite()
            && amortization_table.iter().all(AmortizationEntry::is_finite);
        if !representable {
            return Err(CalculationError::validation(
                "loanAmount",
                "produces a schedule too large to represent",
            ));
        }

        debug!(
            loan_amount,
            interest_rate,
            installments,
            monthly_payment,
            "amortization schedule generated"
        );

        Ok(MortgageResult {
            loan_amount,
            interest_rate,
            term_years,
            installments,
            monthly_rate,
            bank_name: known_bank.map(|rate| rate.bank.clone()),
            monthly_payment,
            total_payment,
            total_interest,
            amortization_table,
        })
    }
}

fn validate_term(term_years: u32) -> Result<u32, CalculationError> {
    if term_years == 0 {
        return Err(CalculationError::validation(
            "termYears",
            "must be a positive number of years",
        ));
    }
    if term_years > MAX_TERM_YEARS {
        return Err(CalculationError::validation(
            "termYears",
            format!("must be at most {MAX_TERM_YEARS} years"),
        ));
    }
    Ok(term_years)
}

fn validate_rate(rate: f64) -> Result<f64, CalculationError> {
    require_percentage("interestRate", rate)
}
