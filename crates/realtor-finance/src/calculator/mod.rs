//! Financial calculation engine behind the commission, stamp-duty and mortgage tools.
//!
//! Data flows one way: the [`RateRegistry`] and [`ExchangeRateProvider`] feed the
//! [`CommissionPipeline`] and [`AmortizationEngine`], whose results become response payloads.
//! Neither calculator holds state between calls.

pub mod commission;
pub mod error;
pub mod exchange;
pub mod format;
pub mod mortgage;
pub mod registry;
pub mod router;

#[cfg(test)]
mod tests;

pub use commission::{
    CommissionPipeline, CommissionRequest, CommissionResult, OperationType, StampDutyRequest,
    StampDutyResult, TaxBase, TaxBreakdown, TaxDefaults, TaxKind, TaxLine, TaxRateOverrides,
    TaxRateSet,
};
pub use error::{CalculationError, ErrorBody};
pub use exchange::{
    CurrencyDisplay, ExchangeQuote, ExchangeRateError, ExchangeRateProvider, ExchangeRateSource,
    LiveExchangeRateSource, QuoteOrigin, StaticExchangeRateSource,
};
pub use format::{format_money, format_percent, round_cents, Currency};
pub use mortgage::{
    amortization_schedule, annuity_payment, AmortizationEngine, AmortizationEntry,
    MortgageRequest, MortgageResult, MAX_TERM_YEARS,
};
pub use registry::{BankRate, Province, RateRegistry, RegistryError};
pub use router::{calculator_router, CalculatorJson, CalculatorState, MortgageResponse};
