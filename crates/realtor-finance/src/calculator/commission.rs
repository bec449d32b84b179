//! Commission and tax pipeline.
//!
//! Turns a sale into a gross commission and an itemized list of the taxes an agent pays on it.
//! Every charge is levied on the gross commission except stamp duty, which is a transfer tax
//! on the sale amount itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{require_percentage, require_positive, CalculationError};
use super::registry::{Province, RateRegistry};

/// Registered (`A`) or unregistered (`B`) operation. Unregistered operations carry no tax base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    #[default]
    #[serde(rename = "A", alias = "a")]
    Registered,
    #[serde(rename = "B", alias = "b")]
    Unregistered,
}

impl OperationType {
    pub fn code(&self) -> &'static str {
        match self {
            OperationType::Registered => "A",
            OperationType::Unregistered => "B",
        }
    }
}

/// Global fallbacks applied when neither the request nor the registry supplies a rate.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxDefaults {
    pub iva_rate: f64,
    pub independent_income_tax_rate: f64,
    pub iibb_rate: f64,
    pub stamp_rate: f64,
    pub other_rate: f64,
}

impl Default for TaxDefaults {
    fn default() -> Self {
        Self {
            iva_rate: 21.0,
            independent_income_tax_rate: 35.0,
            iibb_rate: 0.0,
            stamp_rate: 1.0,
            other_rate: 0.0,
        }
    }
}

/// Per-request rate overrides. Absent fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateOverrides {
    #[serde(default)]
    pub iva_rate: Option<f64>,
    #[serde(default)]
    pub income_tax_rate: Option<f64>,
    #[serde(default)]
    pub iibb_rate: Option<f64>,
    #[serde(default)]
    pub stamp_rate: Option<f64>,
    #[serde(default)]
    pub other_rate: Option<f64>,
}

/// Effective rates, in whole percent, applied to one calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateSet {
    pub iva_rate: f64,
    pub income_tax_rate: f64,
    pub iibb_rate: f64,
    pub stamp_rate: f64,
    pub other_rate: f64,
}

impl TaxRateSet {
    pub fn rate(&self, kind: TaxKind) -> f64 {
        match kind {
            TaxKind::Iva => self.iva_rate,
            TaxKind::IncomeTax => self.income_tax_rate,
            TaxKind::Iibb => self.iibb_rate,
            TaxKind::Stamps => self.stamp_rate,
            TaxKind::Other => self.other_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRequest {
    pub sale_amount: f64,
    pub commission_rate: f64,
    #[serde(default)]
    pub operation_type: OperationType,
    #[serde(default)]
    pub is_independent: bool,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(flatten)]
    pub rates: TaxRateOverrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaxKind {
    Iva,
    IncomeTax,
    Iibb,
    Stamps,
    Other,
}

impl TaxKind {
    pub const ALL: [TaxKind; 5] = [
        TaxKind::Iva,
        TaxKind::IncomeTax,
        TaxKind::Iibb,
        TaxKind::Stamps,
        TaxKind::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaxKind::Iva => "IVA",
            TaxKind::IncomeTax => "Ganancias",
            TaxKind::Iibb => "Ingresos Brutos",
            TaxKind::Stamps => "Sellos",
            TaxKind::Other => "Otros",
        }
    }

    pub fn base(&self) -> TaxBase {
        match self {
            TaxKind::Stamps => TaxBase::SaleAmount,
            _ => TaxBase::GrossCommission,
        }
    }
}

/// Amount a tax rate is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaxBase {
    SaleAmount,
    GrossCommission,
}

/// One amount per tax kind; inapplicable kinds report zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub iva: f64,
    pub income_tax: f64,
    pub iibb: f64,
    pub stamps: f64,
    pub other: f64,
    pub total: f64,
}

impl TaxBreakdown {
    fn set(&mut self, kind: TaxKind, amount: f64) {
        match kind {
            TaxKind::Iva => self.iva = amount,
            TaxKind::IncomeTax => self.income_tax = amount,
            TaxKind::Iibb => self.iibb = amount,
            TaxKind::Stamps => self.stamps = amount,
            TaxKind::Other => self.other = amount,
        }
    }

    pub fn amount(&self, kind: TaxKind) -> f64 {
        match kind {
            TaxKind::Iva => self.iva,
            TaxKind::IncomeTax => self.income_tax,
            TaxKind::Iibb => self.iibb,
            TaxKind::Stamps => self.stamps,
            TaxKind::Other => self.other,
        }
    }
}

/// An applicable charge, listed only when its rate resolved above zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxLine {
    pub kind: TaxKind,
    pub label: String,
    pub rate: f64,
    pub base: TaxBase,
    pub base_amount: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvinceRef {
    pub key: String,
    pub name: String,
}

impl From<&Province> for ProvinceRef {
    fn from(province: &Province) -> Self {
        Self {
            key: province.key.clone(),
            name: province.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionResult {
    pub sale_amount: f64,
    pub commission_rate: f64,
    pub operation_type: OperationType,
    pub gross_commission: f64,
    pub taxes: TaxBreakdown,
    pub net_commission: f64,
    pub rates: TaxRateSet,
    pub province: Option<ProvinceRef>,
    pub breakdown: Vec<TaxLine>,
}

/// Input of the standalone stamp-duty tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampDutyRequest {
    pub amount: f64,
    #[serde(default)]
    pub tax_type: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub stamp_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampDutyResult {
    pub amount: f64,
    pub province: Option<String>,
    pub stamp_rate: f64,
    pub stamps: f64,
    pub total: f64,
}

/// Stateless calculator; the registry is handed in on every call.
#[derive(Debug, Clone, Default)]
pub struct CommissionPipeline {
    defaults: TaxDefaults,
}

impl CommissionPipeline {
    pub fn new(defaults: TaxDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &TaxDefaults {
        &self.defaults
    }

    pub fn calculate(
        &self,
        registry: &RateRegistry,
        request: &CommissionRequest,
    ) -> Result<CommissionResult, CalculationError> {
        let sale_amount = require_positive("saleAmount", request.sale_amount)?;
        let commission_rate = require_percentage("commissionRate", request.commission_rate)?;
        validate_overrides(&request.rates)?;

        let province = request
            .province
            .as_deref()
            .and_then(|key| registry.province_by_key(key));

        let gross_commission = sale_amount * commission_rate / 100.0;
        if !gross_commission.is_finite() {
            return Err(too_large("saleAmount"));
        }
        let rates = self.resolve_rates(request, province);

        let mut taxes = TaxBreakdown::default();
        let mut breakdown = Vec::new();
        for kind in TaxKind::ALL {
            let rate = rates.rate(kind);
            if rate == 0.0 {
                continue;
            }
            let base_amount = match kind.base() {
                TaxBase::SaleAmount => sale_amount,
                TaxBase::GrossCommission => gross_commission,
            };
            let amount = base_amount * rate / 100.0;
            taxes.set(kind, amount);
            breakdown.push(TaxLine {
                kind,
                label: kind.label().to_string(),
                rate,
                base: kind.base(),
                base_amount,
                amount,
            });
        }
        taxes.total = taxes.iva + taxes.income_tax + taxes.iibb + taxes.stamps + taxes.other;
        let net_commission = gross_commission - taxes.total;
        if !taxes.total.is_finite() || !net_commission.is_finite() {
            return Err(too_large("saleAmount"));
        }

        debug!(
            sale_amount,
            commission_rate,
            operation = request.operation_type.code(),
            province = province.map(|p| p.key.as_str()),
            gross_commission,
            taxes_total = taxes.total,
            "commission calculated"
        );

        Ok(CommissionResult {
            sale_amount,
            commission_rate,
            operation_type: request.operation_type,
            gross_commission,
            taxes,
            net_commission,
            rates,
            province: province.map(ProvinceRef::from),
            breakdown,
        })
    }

    /// Stamp duty on its own: the same rule the pipeline applies to the sale amount.
    pub fn stamp_duty(
        &self,
        registry: &RateRegistry,
        request: &StampDutyRequest,
    ) -> Result<StampDutyResult, CalculationError> {
        if let Some(tax_type) = request.tax_type.as_deref() {
            if !tax_type.trim().eq_ignore_ascii_case("STAMPS") {
                return Err(CalculationError::validation(
                    "taxType",
                    format!("unsupported tax type '{tax_type}', expected STAMPS"),
                ));
            }
        }
        let amount = require_positive("amount", request.amount)?;
        if let Some(rate) = request.stamp_rate {
            require_percentage("stampRate", rate)?;
        }

        let province = request
            .province
            .as_deref()
            .and_then(|key| registry.province_by_key(key));
        let stamp_rate = self.resolve_stamp_rate(request.stamp_rate, province);
        let stamps = amount * stamp_rate / 100.0;
        if !stamps.is_finite() {
            return Err(too_large("amount"));
        }

        Ok(StampDutyResult {
            amount,
            province: province
                .map(|p| p.key.clone())
                .or_else(|| request.province.clone()),
            stamp_rate,
            stamps,
            total: stamps,
        })
    }

    fn resolve_rates(&self, request: &CommissionRequest, province: Option<&Province>) -> TaxRateSet {
        if request.operation_type == OperationType::Unregistered {
            return TaxRateSet::default();
        }

        let overrides = &request.rates;
        let income_tax_rate = if request.is_independent {
            overrides
                .income_tax_rate
                .unwrap_or(self.defaults.independent_income_tax_rate)
        } else {
            0.0
        };

        TaxRateSet {
            iva_rate: overrides.iva_rate.unwrap_or(self.defaults.iva_rate),
            income_tax_rate,
            iibb_rate: overrides.iibb_rate.unwrap_or(self.defaults.iibb_rate),
            stamp_rate: self.resolve_stamp_rate(overrides.stamp_rate, province),
            other_rate: overrides.other_rate.unwrap_or(self.defaults.other_rate),
        }
    }

    fn resolve_stamp_rate(&self, requested: Option<f64>, province: Option<&Province>) -> f64 {
        requested
            .or_else(|| province.map(|p| p.default_stamp_rate))
            .unwrap_or(self.defaults.stamp_rate)
    }
}

fn too_large(field: &'static str) -> CalculationError {
    CalculationError::validation(field, "is too large to compute")
}

fn validate_overrides(rates: &TaxRateOverrides) -> Result<(), CalculationError> {
    let fields = [
        ("ivaRate", rates.iva_rate),
        ("incomeTaxRate", rates.income_tax_rate),
        ("iibbRate", rates.iibb_rate),
        ("stampRate", rates.stamp_rate),
        ("otherRate", rates.other_rate),
    ];
    for (field, value) in fields {
        if let Some(rate) = value {
            require_percentage(field, rate)?;
        }
    }
    Ok(())
}
