use bridge_finance_core::bridge::breakdown;
use bridge_finance_core::bridge::financing::{self, DealParameters};
use bridge_finance_core::{BridgeFinanceError, BridgeFinanceResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual}"
    );
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

fn scenario_a() -> DealParameters {
    DealParameters {
        invoice_amount: dec!(10_000),
        annual_interest_rate_pct: dec!(18),
        days_outstanding: 60,
        margin_pct: dec!(25),
        advance_rate_pct: dec!(80),
        arrangement_fee_pct: dec!(1),
        fixed_fee: Decimal::ZERO,
    }
}

#[test]
fn test_scenario_a_reference_values() {
    let r = financing::calculate_bridge_financing(&scenario_a()).unwrap();

    assert_eq!(r.principal_borrowed, dec!(8000));
    assert_eq!(r.gross_margin_value, dec!(2500));
    assert_close(r.interest_cost, dec!(236.7123287671), dec!(0.0000000001));
    assert_eq!(r.total_fees, dec!(100));
    assert_close(r.total_financing_cost, dec!(336.71), dec!(0.005));
    assert_close(r.net_margin_after_financing, dec!(2163.29), dec!(0.005));
    assert_close(r.margin_eaten_pct_of_margin, dec!(13.47), dec!(0.005));
    assert_close(r.financing_cost_pct_of_invoice, dec!(3.3671), dec!(0.00005));
    assert_close(r.effective_annualized_cost_pct, dec!(20.4833), dec!(0.00005));
}

#[test]
fn test_scenario_b_zero_invoice_is_rejected_at_the_boundary() {
    let mut params = scenario_a();
    params.invoice_amount = Decimal::ZERO;

    match financing::validate_deal(&params) {
        Err(BridgeFinanceError::InvalidInput { field, reason }) => {
            assert_eq!(field, "invoice_amount");
            assert!(reason.contains("positive invoice amount"));
        }
        other => panic!("expected InvalidInput, got {other:?}"),
    }

    // Bypassing the guard surfaces an error instead of a panic
    assert!(matches!(
        financing::calculate_bridge_financing(&params),
        Err(BridgeFinanceError::DivisionByZero { .. })
    ));
}

#[test]
fn test_scenario_c_zero_margin() {
    for fixed_fee in [Decimal::ZERO, dec!(50), dec!(1_000_000)] {
        let params = DealParameters::new(dec!(5000), dec!(18), 60, Decimal::ZERO).with_fixed_fee(fixed_fee);
        let r = financing::calculate_bridge_financing(&params).unwrap();
        assert_eq!(r.gross_margin_value, Decimal::ZERO);
        assert_eq!(r.margin_eaten_pct_of_margin, Decimal::ZERO);
    }
}

// ===========================================================================
// Properties
// ===========================================================================

fn deal_grid() -> Vec<DealParameters> {
    let mut deals = Vec::new();
    for invoice in [dec!(1), dec!(2_500.55), dec!(10_000), dec!(7_333_333.33)] {
        for rate in [Decimal::ZERO, dec!(4.25), dec!(18), dec!(65)] {
            for days in [-5, 0, 1, 45, 365, 1000] {
                for margin in [Decimal::ZERO, dec!(12.5), dec!(40)] {
                    deals.push(
                        DealParameters::new(invoice, rate, days, margin)
                            .with_advance_rate_pct(dec!(90))
                            .with_arrangement_fee_pct(dec!(0.75))
                            .with_fixed_fee(dec!(125)),
                    );
                }
            }
        }
    }
    deals
}

#[test]
fn test_cost_and_margin_identities_hold() {
    for params in deal_grid() {
        let r = financing::calculate_bridge_financing(&params).unwrap();
        assert_eq!(r.total_financing_cost, r.interest_cost + r.total_fees, "{params:?}");
        assert_eq!(
            r.net_margin_after_financing,
            r.gross_margin_value - r.total_financing_cost,
            "{params:?}"
        );
        assert_eq!(r.margin_eaten_value, r.total_financing_cost, "{params:?}");
    }
}

#[test]
fn test_non_positive_horizon_has_no_interest() {
    for params in deal_grid().into_iter().filter(|p| p.days_outstanding <= 0) {
        let r = financing::calculate_bridge_financing(&params).unwrap();
        assert_eq!(r.interest_cost, Decimal::ZERO);
        assert_eq!(r.effective_annualized_cost_pct, Decimal::ZERO);
    }
}

#[test]
fn test_longer_horizon_costs_more() {
    let mut previous: Option<financing::FinancingResult> = None;
    for days in [1, 7, 30, 60, 90, 180, 365, 720] {
        let mut params = scenario_a();
        params.days_outstanding = days;
        let r = financing::calculate_bridge_financing(&params).unwrap();
        if let Some(prev) = &previous {
            assert!(r.interest_cost > prev.interest_cost, "days={days}");
            assert!(r.total_financing_cost > prev.total_financing_cost, "days={days}");
            assert!(
                r.net_margin_after_financing < prev.net_margin_after_financing,
                "days={days}"
            );
        }
        previous = Some(r);
    }
}

#[test]
fn test_same_inputs_give_identical_results() {
    for params in deal_grid() {
        let first = financing::calculate_bridge_financing(&params).unwrap();
        let second = financing::calculate_bridge_financing(&params).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

// ===========================================================================
// Serialised shape
// ===========================================================================

#[test]
fn test_result_serialises_to_seventeen_named_fields() {
    let r = financing::calculate_bridge_financing(&scenario_a()).unwrap();
    let value = serde_json::to_value(&r).unwrap();
    let map = value.as_object().unwrap();

    let mut keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    let mut expected = vec![
        "invoice_amount",
        "annual_interest_rate_pct",
        "days_outstanding",
        "margin_pct",
        "advance_rate_pct",
        "arrangement_fee_pct",
        "fixed_fee",
        "principal_borrowed",
        "gross_margin_value",
        "interest_cost",
        "total_fees",
        "total_financing_cost",
        "net_margin_after_financing",
        "margin_eaten_value",
        "margin_eaten_pct_of_margin",
        "financing_cost_pct_of_invoice",
        "effective_annualized_cost_pct",
    ];
    expected.sort_unstable();
    assert_eq!(keys, expected);
    assert_eq!(map["days_outstanding"], 60);
}

#[test]
fn test_parameters_parse_from_minimal_json() {
    let params: DealParameters = serde_json::from_str(
        r#"{"invoice_amount":"10000","annual_interest_rate_pct":"18","days_outstanding":60,"margin_pct":"25","arrangement_fee_pct":"1"}"#,
    )
    .unwrap();
    assert_eq!(params, scenario_a());
}

#[test]
fn test_breakdown_envelope_for_scenario_a() {
    let out = breakdown::analyze_bridge_breakdown(&scenario_a()).unwrap();
    let b = &out.result;
    assert_eq!(b.lines[0].display, "10,000.00");
    assert_eq!(b.lines[10].display, "20.48 %");
    assert_eq!(b.margin_comparison.gross_margin_before, dec!(2500));
    assert!(out.warnings.is_empty());
}

fn net_margin(params: &DealParameters) -> BridgeFinanceResult<Decimal> {
    Ok(financing::calculate_bridge_financing(params)?.net_margin_after_financing)
}

#[test]
fn test_result_alias_propagates_core_errors() {
    assert_close(net_margin(&scenario_a()).unwrap(), dec!(2163.29), dec!(0.01));

    let empty = DealParameters::new(Decimal::ZERO, dec!(18), 60, dec!(25));
    assert!(matches!(net_margin(&empty), Err(BridgeFinanceError::DivisionByZero { .. })));

    // 1e23 at 100% for i32::MAX days leaves the decimal range
    let extreme = DealParameters::new(dec!(100_000_000_000_000_000_000_000), dec!(100), i32::MAX, dec!(10));
    assert!(matches!(net_margin(&extreme), Err(BridgeFinanceError::InvalidInput { .. })));
}
