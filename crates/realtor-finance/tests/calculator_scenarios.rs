//! End-to-end scenarios driven through the public calculator facade.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use realtor_finance::calculator::{
    AmortizationEngine, CalculationError, CommissionPipeline, CommissionRequest, CurrencyDisplay,
    ExchangeRateProvider, MortgageRequest, OperationType, QuoteOrigin, RateRegistry,
    StaticExchangeRateSource, TaxDefaults, TaxKind, TaxRateOverrides,
};

fn sale_request(operation_type: OperationType) -> CommissionRequest {
    CommissionRequest {
        sale_amount: 1_000_000.0,
        commission_rate: 3.0,
        operation_type,
        is_independent: true,
        province: Some("caba".to_string()),
        rates: TaxRateOverrides {
            iva_rate: Some(21.0),
            income_tax_rate: None,
            iibb_rate: Some(1.5),
            stamp_rate: Some(1.5),
            other_rate: Some(1.0),
        },
    }
}

#[test]
fn registered_sale_matches_worked_example() {
    let registry = RateRegistry::builtin();
    let pipeline = CommissionPipeline::new(TaxDefaults::default());

    let result = pipeline
        .calculate(&registry, &sale_request(OperationType::Registered))
        .expect("valid request");

    assert_eq!(result.gross_commission, 30_000.0);
    assert_eq!(result.taxes.stamps, 15_000.0);
    // 6_300 IVA + 10_500 income tax + 450 IIBB + 15_000 stamps + 300 other
    assert_eq!(result.taxes.total, 32_550.0);
    assert_eq!(result.net_commission, -2_550.0);

    let labels: Vec<_> = result.breakdown.iter().map(|line| line.kind).collect();
    assert_eq!(
        labels,
        vec![
            TaxKind::Iva,
            TaxKind::IncomeTax,
            TaxKind::Iibb,
            TaxKind::Stamps,
            TaxKind::Other
        ]
    );
}

#[test]
fn unregistered_sale_keeps_full_commission() {
    let registry = RateRegistry::builtin();
    let result = CommissionPipeline::default()
        .calculate(&registry, &sale_request(OperationType::Unregistered))
        .expect("valid request");

    assert_eq!(result.taxes.total, 0.0);
    assert_eq!(result.net_commission, 30_000.0);
    assert_eq!(result.rates.stamp_rate, 0.0);
}

#[test]
fn csv_bank_table_feeds_mortgage_defaults() {
    let csv = "Bank,Rate,Max Term Years\nBanco Cooperativo,5.0,25\n";
    let registry = RateRegistry::builtin()
        .with_bank_rates_csv(Cursor::new(csv))
        .expect("csv parses");

    let result = AmortizationEngine
        .simulate(
            &registry,
            &MortgageRequest {
                loan_amount: 60_000.0,
                interest_rate: None,
                term_years: 25,
                bank_name: Some("BANCO COOPERATIVO".to_string()),
            },
        )
        .expect("bank rate on record");

    assert_eq!(result.interest_rate, 5.0);
    assert_eq!(result.amortization_table.len(), 300);

    let err = AmortizationEngine
        .simulate(
            &registry,
            &MortgageRequest {
                loan_amount: 60_000.0,
                interest_rate: None,
                term_years: 25,
                bank_name: Some("Banco Nación".to_string()),
            },
        )
        .expect_err("replaced table no longer knows the builtin banks");
    assert!(matches!(err, CalculationError::UnknownBankRate { .. }));
}

#[tokio::test]
async fn peso_display_never_touches_the_schedule() {
    let registry = RateRegistry::builtin();
    let request = MortgageRequest {
        loan_amount: 80_000.0,
        interest_rate: Some(6.0),
        term_years: 20,
        bank_name: None,
    };
    let result = AmortizationEngine
        .simulate(&registry, &request)
        .expect("valid request");

    let provider = ExchangeRateProvider::new(
        Arc::new(StaticExchangeRateSource::new(1_100.0)),
        Duration::from_millis(100),
        1_000.0,
    );
    let quote = provider.current_rate().await;
    let display = CurrencyDisplay::for_mortgage(&result, &quote);

    assert_eq!(quote.origin, QuoteOrigin::Live);
    assert_eq!(display.monthly_payment, result.monthly_payment * 1_100.0);
    assert_eq!(display.total_interest, result.total_interest * 1_100.0);

    let again = AmortizationEngine
        .simulate(&registry, &request)
        .expect("valid request");
    assert_eq!(again, result);
}
