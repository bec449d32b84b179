use crate::infra::parse_operation_type;
use clap::Args;
use realtor_finance::calculator::{
    format_money, format_percent, AmortizationEngine, CommissionPipeline, CommissionRequest,
    CommissionResult, Currency, CurrencyDisplay, ExchangeQuote, ExchangeRateProvider,
    MortgageRequest, MortgageResult, OperationType, QuoteOrigin, RateRegistry, StampDutyRequest,
    StampDutyResult, StaticExchangeRateSource, TaxRateOverrides,
};
use realtor_finance::config::AppConfig;
use realtor_finance::error::AppError;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CommissionArgs {
    /// Sale price of the property
    #[arg(long)]
    pub(crate) sale_amount: f64,
    /// Commission percentage charged on the sale
    #[arg(long)]
    pub(crate) commission_rate: f64,
    /// A for registered operations, B for unregistered (tax exempt)
    #[arg(long, default_value = "A", value_parser = parse_operation_type)]
    pub(crate) operation_type: OperationType,
    /// The agent invoices as an independent contractor
    #[arg(long)]
    pub(crate) independent: bool,
    /// Province key used for the default stamp-duty rate
    #[arg(long)]
    pub(crate) province: Option<String>,
    #[arg(long)]
    pub(crate) iva_rate: Option<f64>,
    #[arg(long)]
    pub(crate) income_tax_rate: Option<f64>,
    #[arg(long)]
    pub(crate) iibb_rate: Option<f64>,
    #[arg(long)]
    pub(crate) stamp_rate: Option<f64>,
    #[arg(long)]
    pub(crate) other_rate: Option<f64>,
}

#[derive(Args, Debug)]
pub(crate) struct StampDutyArgs {
    /// Amount the stamp duty is levied on
    #[arg(long)]
    pub(crate) amount: f64,
    /// Province key (e.g. caba, buenosaires)
    #[arg(long)]
    pub(crate) province: Option<String>,
    /// Explicit stamp rate; defaults to the province rate
    #[arg(long)]
    pub(crate) stamp_rate: Option<f64>,
}

#[derive(Args, Debug)]
pub(crate) struct MortgageArgs {
    /// Principal in the loan's unit of account (USD-equivalent UVA)
    #[arg(long)]
    pub(crate) loan_amount: f64,
    /// Term in whole years
    #[arg(long)]
    pub(crate) term_years: u32,
    /// Annual nominal rate (TNA); defaults to the bank's rate on record
    #[arg(long)]
    pub(crate) interest_rate: Option<f64>,
    /// Bank whose published rate should be used
    #[arg(long)]
    pub(crate) bank: Option<String>,
    /// Fixed ARS per USD rate instead of querying the upstream quote
    #[arg(long)]
    pub(crate) exchange_rate: Option<f64>,
    /// Print every installment of the schedule
    #[arg(long)]
    pub(crate) list_rows: bool,
}

fn load_registry() -> Result<RateRegistry, AppError> {
    let config = AppConfig::load()?;
    Ok(RateRegistry::from_config(&config.registry)?)
}

pub(crate) fn run_commission(args: CommissionArgs) -> Result<(), AppError> {
    let registry = load_registry()?;
    let request = CommissionRequest {
        sale_amount: args.sale_amount,
        commission_rate: args.commission_rate,
        operation_type: args.operation_type,
        is_independent: args.independent,
        province: args.province,
        rates: TaxRateOverrides {
            iva_rate: args.iva_rate,
            income_tax_rate: args.income_tax_rate,
            iibb_rate: args.iibb_rate,
            stamp_rate: args.stamp_rate,
            other_rate: args.other_rate,
        },
    };

    let result = CommissionPipeline::default().calculate(&registry, &request)?;
    print!("{}", render_commission(&result));
    Ok(())
}

pub(crate) fn run_stamp_duty(args: StampDutyArgs) -> Result<(), AppError> {
    let registry = load_registry()?;
    let request = StampDutyRequest {
        amount: args.amount,
        tax_type: None,
        province: args.province,
        stamp_rate: args.stamp_rate,
    };

    let result = CommissionPipeline::default().stamp_duty(&registry, &request)?;
    print!("{}", render_stamp_duty(&result));
    Ok(())
}

pub(crate) async fn run_mortgage(args: MortgageArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let registry = RateRegistry::from_config(&config.registry)?;
    let request = MortgageRequest {
        loan_amount: args.loan_amount,
        interest_rate: args.interest_rate,
        term_years: args.term_years,
        bank_name: args.bank,
    };

    let result = AmortizationEngine.simulate(&registry, &request)?;

    let provider = match args.exchange_rate {
        Some(rate) => ExchangeRateProvider::new(
            Arc::new(StaticExchangeRateSource::new(rate)),
            config.exchange.timeout,
            config.exchange.fallback_rate,
        ),
        None => ExchangeRateProvider::from_config(&config.exchange),
    };
    let quote = provider.current_rate().await;

    print!("{}", render_mortgage(&result, &quote, args.list_rows));
    Ok(())
}

pub(crate) fn run_provinces() -> Result<(), AppError> {
    let registry = load_registry()?;
    println!("Provinces and default stamp-duty rates");
    for province in registry.provinces() {
        println!(
            "- {:<20} {} ({})",
            province.key,
            province.name,
            format_percent(province.default_stamp_rate)
        );
    }
    Ok(())
}

pub(crate) fn run_rates() -> Result<(), AppError> {
    let registry = load_registry()?;
    println!("Bank mortgage rates (TNA)");
    for rate in registry.bank_rates() {
        let term = match rate.max_term_years {
            Some(years) => format!("up to {years} years"),
            None => "no term limit".to_string(),
        };
        println!("- {}: {} ({term})", rate.bank, format_percent(rate.rate));
    }
    Ok(())
}

fn render_commission(result: &CommissionResult) -> String {
    let mut out = String::new();
    out.push_str("Commission calculation\n");
    out.push_str(&format!(
        "Sale amount: {} | commission {} | operation {}\n",
        format_money(result.sale_amount, Currency::Ars),
        format_percent(result.commission_rate),
        result.operation_type.code()
    ));
    if let Some(province) = &result.province {
        out.push_str(&format!("Province: {}\n", province.name));
    }
    out.push_str(&format!(
        "Gross commission: {}\n",
        format_money(result.gross_commission, Currency::Ars)
    ));

    if result.breakdown.is_empty() {
        out.push_str("\nTaxes: none\n");
    } else {
        out.push_str("\nTaxes\n");
        for line in &result.breakdown {
            out.push_str(&format!(
                "- {} {} on {}: {}\n",
                line.label,
                format_percent(line.rate),
                format_money(line.base_amount, Currency::Ars),
                format_money(line.amount, Currency::Ars)
            ));
        }
    }

    out.push_str(&format!(
        "\nTotal taxes: {}\nNet commission: {}\n",
        format_money(result.taxes.total, Currency::Ars),
        format_money(result.net_commission, Currency::Ars)
    ));
    out
}

fn render_stamp_duty(result: &StampDutyResult) -> String {
    format!(
        "Stamp duty\nAmount: {}\nProvince: {}\nRate: {}\nStamp duty owed: {}\n",
        format_money(result.amount, Currency::Ars),
        result.province.as_deref().unwrap_or("not specified"),
        format_percent(result.stamp_rate),
        format_money(result.total, Currency::Ars)
    )
}

fn render_mortgage(result: &MortgageResult, quote: &ExchangeQuote, list_rows: bool) -> String {
    let display = CurrencyDisplay::for_mortgage(result, quote);
    let origin = match quote.origin {
        QuoteOrigin::Live => "live quote",
        QuoteOrigin::Cached => "cached quote",
        QuoteOrigin::Default => "default rate, upstream unavailable",
    };

    let mut out = String::new();
    out.push_str("Mortgage simulation (French system)\n");
    if let Some(bank) = &result.bank_name {
        out.push_str(&format!("Bank: {bank}\n"));
    }
    out.push_str(&format!(
        "Loan: {} at {} TNA over {} years ({} installments)\n",
        format_money(result.loan_amount, Currency::Usd),
        format_percent(result.interest_rate),
        result.term_years,
        result.installments
    ));
    out.push_str(&format!(
        "Monthly payment: {} (~{})\n",
        format_money(result.monthly_payment, Currency::Usd),
        format_money(display.monthly_payment, Currency::Ars)
    ));
    out.push_str(&format!(
        "Total payment: {} (~{})\n",
        format_money(result.total_payment, Currency::Usd),
        format_money(display.total_payment, Currency::Ars)
    ));
    out.push_str(&format!(
        "Total interest: {} (~{})\n",
        format_money(result.total_interest, Currency::Usd),
        format_money(display.total_interest, Currency::Ars)
    ));
    out.push_str(&format!(
        "Exchange rate: {} per US$ ({origin}); the first installment in pesos is an estimate\n",
        format_money(quote.rate, Currency::Ars)
    ));

    if list_rows {
        out.push_str("\nMonth | payment | principal | interest | balance\n");
        for row in &result.amortization_table {
            out.push_str(&format!(
                "{:>5} | {} | {} | {} | {}\n",
                row.month,
                format_money(row.payment, Currency::Usd),
                format_money(row.principal_portion, Currency::Usd),
                format_money(row.interest_portion, Currency::Usd),
                format_money(row.remaining_balance, Currency::Usd)
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commission_report_lists_applicable_taxes() {
        let request = CommissionRequest {
            sale_amount: 1_000_000.0,
            commission_rate: 3.0,
            operation_type: OperationType::Registered,
            is_independent: false,
            province: Some("caba".to_string()),
            rates: TaxRateOverrides::default(),
        };
        let result = CommissionPipeline::default()
            .calculate(&RateRegistry::builtin(), &request)
            .expect("valid request");

        let report = render_commission(&result);
        assert!(report.contains("Gross commission: $ 30.000,00"));
        assert!(report.contains("- Sellos 2,7% on $ 1.000.000,00: $ 27.000,00"));
        assert!(!report.contains("Ganancias"));
    }

    #[test]
    fn mortgage_report_flags_default_exchange_rate() {
        let request = MortgageRequest {
            loan_amount: 80_000.0,
            interest_rate: Some(6.0),
            term_years: 20,
            bank_name: None,
        };
        let result = AmortizationEngine
            .simulate(&RateRegistry::builtin(), &request)
            .expect("valid request");
        let quote = ExchangeQuote {
            rate: 1000.0,
            origin: QuoteOrigin::Default,
            fetched_at: None,
        };

        let report = render_mortgage(&result, &quote, true);
        assert!(report.contains("Monthly payment: US$ 573.14 (~$ 573.144,85)"));
        assert!(report.contains("upstream unavailable"));
        assert!(report.contains("  240 | "));
    }
}
