use loan_plan_core::schedule::french::{self, ScheduleInput};
use loan_plan_core::LoanTerms;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn consumer_terms() -> LoanTerms {
    LoanTerms {
        principal: dec!(5000000),
        annual_rate: dec!(0.85),
        fixed_fee: dec!(15000),
        tax_rate: dec!(0.21),
    }
}

// ===========================================================================
// Amortisation invariants
// ===========================================================================

#[test]
fn test_amortization_sums_to_principal() {
    let terms = consumer_terms();
    for n in [1u32, 2, 7, 12, 36, 120] {
        let sched = french::build_schedule(&terms, n).unwrap();
        let amortized: Decimal = sched.rows.iter().map(|r| r.amortization).sum();
        let drift = (amortized - terms.principal).abs() / terms.principal;
        assert!(
            drift < dec!(0.000001),
            "{n} installments amortised {amortized}, expected {}",
            terms.principal
        );
    }
}

#[test]
fn test_final_balance_is_exactly_zero() {
    let terms = consumer_terms();
    for n in [1u32, 13, 48, 120] {
        let sched = french::build_schedule(&terms, n).unwrap();
        let last = sched.rows.last().unwrap();
        assert_eq!(last.period, n);
        assert_eq!(last.closing_balance, Decimal::ZERO);
    }
}

#[test]
fn test_periods_are_sequential() {
    let sched = french::build_schedule(&consumer_terms(), 24).unwrap();
    let periods: Vec<u32> = sched.rows.iter().map(|r| r.period).collect();
    assert_eq!(periods, (1..=24).collect::<Vec<u32>>());
    for pair in sched.rows.windows(2) {
        assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
    }
}

#[test]
fn test_pure_installment_is_level() {
    let sched = french::build_schedule(&consumer_terms(), 36).unwrap();
    let first = sched.rows[0].pure_installment;
    assert!(sched.rows.iter().all(|r| r.pure_installment == first));
    assert_eq!(sched.summary.pure_installment, first);
}

#[test]
fn test_interest_share_declines() {
    let sched = french::build_schedule(&consumer_terms(), 36).unwrap();
    for pair in sched.rows.windows(2) {
        assert!(pair[1].interest < pair[0].interest);
    }
}

// ===========================================================================
// Boundaries
// ===========================================================================

#[test]
fn test_single_installment() {
    let terms = consumer_terms();
    let sched = french::build_schedule(&terms, 1).unwrap();
    assert_eq!(sched.rows.len(), 1);
    let row = &sched.rows[0];
    assert_eq!(row.amortization, terms.principal);
    assert_eq!(row.interest, terms.principal * (terms.annual_rate / dec!(12)));
    assert_eq!(row.closing_balance, Decimal::ZERO);
}

#[test]
fn test_zero_rate_divides_evenly() {
    let terms = LoanTerms {
        principal: dec!(1000),
        annual_rate: Decimal::ZERO,
        fixed_fee: Decimal::ZERO,
        tax_rate: dec!(0.21),
    };
    let sched = french::build_schedule(&terms, 3).unwrap();
    for row in &sched.rows {
        assert_eq!(row.pure_installment, dec!(1000) / dec!(3));
        assert_eq!(row.interest, Decimal::ZERO);
        assert_eq!(row.tax, Decimal::ZERO);
    }
    assert_eq!(sched.rows[2].closing_balance, Decimal::ZERO);
    // Nothing beyond the principal is repaid: zero cost
    assert!(sched.summary.cost_rate_converged);
    assert!(sched.summary.annual_cost_rate_pct.abs() < dec!(0.0000001));
}

#[test]
fn test_fee_only_loan_has_positive_cost() {
    let terms = LoanTerms {
        principal: dec!(1000),
        annual_rate: Decimal::ZERO,
        fixed_fee: dec!(10),
        tax_rate: Decimal::ZERO,
    };
    let sched = french::build_schedule(&terms, 10).unwrap();
    assert_eq!(sched.summary.total_interest, Decimal::ZERO);
    assert_eq!(sched.summary.total_fees, dec!(100));
    assert!(sched.summary.annual_cost_rate_pct > Decimal::ZERO);
}

#[test]
fn test_zero_periods_is_invalid() {
    let input = ScheduleInput {
        terms: consumer_terms(),
        period_count: 0,
    };
    assert!(french::generate_schedule(&input).is_err());
}

// ===========================================================================
// Summary behaviour
// ===========================================================================

#[test]
fn test_mean_payment_falls_with_more_installments() {
    let terms = LoanTerms {
        principal: dec!(100000),
        annual_rate: dec!(0.30),
        fixed_fee: dec!(500),
        tax_rate: Decimal::ZERO,
    };
    let means: Vec<Decimal> = (1..=60)
        .map(|n| {
            french::build_schedule(&terms, n)
                .unwrap()
                .summary
                .mean_total_payment
        })
        .collect();
    for pair in means.windows(2) {
        assert!(pair[1] < pair[0]);
    }
}

#[test]
fn test_generation_is_deterministic() {
    let input = ScheduleInput {
        terms: consumer_terms(),
        period_count: 30,
    };
    let first = french::generate_schedule(&input).unwrap();
    let second = french::generate_schedule(&input).unwrap();
    assert_eq!(first.result, second.result);
}

#[test]
fn test_consumer_loan_cost_rate() {
    let sched = french::build_schedule(&consumer_terms(), 12).unwrap();
    let s = &sched.summary;
    // Reference: mean ≈ 695,743.46, CFT ≈ 184.31%
    assert!((s.mean_total_payment - dec!(695743.46)).abs() < dec!(0.01));
    assert!((s.annual_cost_rate_pct - dec!(184.3086)).abs() < dec!(0.001));
    assert!(s.cost_rate_converged);
}

#[test]
fn test_envelope_echoes_assumptions() {
    let input = ScheduleInput {
        terms: consumer_terms(),
        period_count: 12,
    };
    let out = french::generate_schedule(&input).unwrap();
    assert_eq!(out.assumptions["period_count"], 12);
    assert_eq!(out.assumptions["principal"], "5000000");
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_input_parses_from_flat_json() {
    let json = r#"{
        "principal": "5000000",
        "annual_rate": "0.85",
        "fixed_fee": "15000",
        "tax_rate": "0.21",
        "period_count": 12
    }"#;
    let input: ScheduleInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.terms, consumer_terms());
    assert_eq!(input.period_count, 12);
}
