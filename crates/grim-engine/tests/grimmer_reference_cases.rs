use grim_core::{ReportedStatistic, VarianceDenominator};
use grim_engine::{check_consistency, AuditOpts, ConsistencyVerdict, VerdictRecord};

fn audit(stat: &ReportedStatistic) -> VerdictRecord {
    check_consistency(stat, &AuditOpts::default()).expect("audit")
}

#[test]
fn parity_rules_out_reported_sd() {
    // Mean reproduces as 62 / 18, but every implied sum of squares is odd.
    let record = audit(&ReportedStatistic::new(18, "3.44").with_sd("2.47"));
    assert_eq!(record.verdict, ConsistencyVerdict::GrimmerInconsistent);
    assert!(record.candidates.is_empty());
    assert!(record.reasons.iter().any(|r| r.contains("must be even")));
    assert!(record.reasons.iter().any(|r| r.contains("denominator n-1")));
    assert!(record.reasons.iter().any(|r| r.contains("denominator n:")));
}

#[test]
fn likert_bounds_cap_the_reachable_spread() {
    // On a 1..5 scale 62 / 18 reaches a sum of squares of at most 282.
    let record = audit(
        &ReportedStatistic::new(18, "3.44")
            .with_sd("2.47")
            .with_scale(1, 5),
    );
    assert_eq!(record.verdict, ConsistencyVerdict::GrimmerInconsistent);
    assert!(record.reasons.iter().all(|r| r.contains("reachable envelope [218, 282]")));
}

#[test]
fn attainable_sd_comes_with_a_witness() {
    let record = audit(
        &ReportedStatistic::new(10, "3.40")
            .with_sd("2.07")
            .with_scale(1, 7),
    );
    assert_eq!(record.verdict, ConsistencyVerdict::Consistent);
    let evidence = record
        .candidates
        .iter()
        .find(|c| c.branch.denominator == Some(VarianceDenominator::Sample))
        .expect("sample evidence");
    assert_eq!(evidence.sum, 34);
    assert_eq!(evidence.sum_of_squares, Some(154));
    assert!(evidence.exact);
    let witness = evidence.witness.as_ref().expect("witness");
    assert_eq!(witness.len(), 10);
    assert_eq!(witness.sum(), 34);
    assert_eq!(witness.sum_of_squares, 154);
    assert!(witness.entries.iter().all(|e| (1..=7).contains(&e.value)));
}

#[test]
fn population_reading_alone_can_fail() {
    let record = audit(
        &ReportedStatistic::new(10, "3.40")
            .with_sd("2.07")
            .with_denominator(VarianceDenominator::Population),
    );
    assert_eq!(record.verdict, ConsistencyVerdict::GrimmerInconsistent);
    assert!(record.reasons[0].contains("contains no integer"));
}

#[test]
fn small_likert_sample_is_consistent() {
    let record = audit(&ReportedStatistic::new(10, "3.20").with_sd("1.48"));
    assert_eq!(record.verdict, ConsistencyVerdict::Consistent);
    assert!(record
        .candidates
        .iter()
        .any(|c| c.sum == 32 && c.sum_of_squares == Some(122)));
}

#[test]
fn mean_only_report_on_closed_scale() {
    let record = audit(&ReportedStatistic::new(10, "3.50").with_scale(1, 5));
    assert_eq!(record.verdict, ConsistencyVerdict::Consistent);
    assert_eq!(record.candidates.len(), 1);
    assert_eq!(record.candidates[0].sum, 35);
    assert_eq!(record.candidates[0].mean, "3.500000");
}

#[test]
fn sd_beyond_the_scale_envelope_is_inconsistent() {
    let record = audit(
        &ReportedStatistic::new(5, "3.00")
            .with_sd("5.00")
            .with_scale(1, 5),
    );
    assert_eq!(record.verdict, ConsistencyVerdict::GrimmerInconsistent);
    assert!(record.reasons.iter().any(|r| r.contains("reachable envelope")));
}

#[test]
fn single_observation_uses_population_convention() {
    let zero = audit(&ReportedStatistic::new(1, "4.00").with_sd("0.00"));
    assert_eq!(zero.verdict, ConsistencyVerdict::Consistent);
    assert!(zero
        .branches
        .iter()
        .all(|b| b.label.denominator == Some(VarianceDenominator::Population)));

    let spread = audit(&ReportedStatistic::new(1, "4.00").with_sd("1.00"));
    assert_eq!(spread.verdict, ConsistencyVerdict::GrimmerInconsistent);
}

#[test]
fn explicit_sample_sd_of_one_observation_is_rejected() {
    let stat = ReportedStatistic::new(1, "4.00")
        .with_sd("0.00")
        .with_denominator(VarianceDenominator::Sample);
    let err = check_consistency(&stat, &AuditOpts::default()).unwrap_err();
    assert_eq!(err.info().code, "sample-sd-undefined");
}

#[test]
fn samples_above_threshold_are_accepted_on_bounds() {
    let opts = AuditOpts {
        exact_threshold: 5,
        ..AuditOpts::default()
    };
    let record = check_consistency(&ReportedStatistic::new(10, "3.20").with_sd("1.48"), &opts)
        .expect("audit");
    assert_eq!(record.verdict, ConsistencyVerdict::Consistent);
    assert!(record.candidates.iter().all(|c| !c.exact && c.witness.is_none()));
    assert!(record
        .reasons
        .iter()
        .any(|r| r.contains("exceeds the exact-search threshold")));
}

#[test]
fn sd_precision_can_differ_from_mean_precision() {
    let record = audit(
        &ReportedStatistic::new(10, "3.40")
            .with_sd("2.1")
            .with_sd_decimals(1),
    );
    assert_eq!(record.verdict, ConsistencyVerdict::Consistent);
}

#[test]
fn exhausted_search_budget_accepts_on_bounds() {
    let opts = AuditOpts {
        search_budget: 1,
        ..AuditOpts::default()
    };
    let stat = ReportedStatistic::new(40, "4.00")
        .with_sd("1.50")
        .with_scale(1, 7);
    let record = check_consistency(&stat, &opts).expect("audit");
    assert_eq!(record.verdict, ConsistencyVerdict::Consistent);
    assert!(!record.candidates.is_empty());
    assert!(record
        .candidates
        .iter()
        .all(|c| c.sum == 160 && !c.exact && c.witness.is_none()));
    assert!(record
        .reasons
        .iter()
        .any(|r| r.contains("search budget exhausted")));
}
