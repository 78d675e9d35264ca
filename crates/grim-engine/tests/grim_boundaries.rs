use grim_engine::{
    build_brackets, check_consistency, grim_check, grim_is_informative, AuditOpts,
    ConsistencyVerdict, GrimOutcome, RoundingConvention,
};
use grim_core::{ReportedStatistic, ScaleBounds};

fn verdict(stat: &ReportedStatistic) -> ConsistencyVerdict {
    check_consistency(stat, &AuditOpts::default())
        .expect("audit")
        .verdict
}

#[test]
fn mean_not_reachable_by_ten_integers_fails_grim() {
    let stat = ReportedStatistic::new(10, "3.45").with_decimals(2);
    assert_eq!(verdict(&stat), ConsistencyVerdict::GrimInconsistent);
}

#[test]
fn exact_tie_is_reachable_under_one_convention_only() {
    // 139 / 40 = 3.475 sits on the boundary between 3.47 and 3.48.
    let pair = build_brackets("3.48", 2).unwrap();
    let scale = ScaleBounds::default();
    assert!(matches!(
        grim_check(40, &pair.half_up, &scale).unwrap(),
        GrimOutcome::Consistent(c) if c.first == 139 && c.last == 139
    ));
    assert!(matches!(
        grim_check(40, &pair.half_down, &scale).unwrap(),
        GrimOutcome::Inconsistent { .. }
    ));

    for display in ["3.47", "3.48"] {
        let record =
            check_consistency(&ReportedStatistic::new(40, display), &AuditOpts::default()).unwrap();
        assert_eq!(record.verdict, ConsistencyVerdict::Consistent, "{display}");
        assert_eq!(record.branches.len(), 2, "{display}");
        assert!(record.candidates.iter().all(|c| c.sum == 139));
    }
}

#[test]
fn half_up_branch_accepts_the_tie_for_the_upper_display() {
    let record =
        check_consistency(&ReportedStatistic::new(40, "3.48"), &AuditOpts::default()).unwrap();
    let accepted: Vec<_> = record
        .branches
        .iter()
        .filter(|b| b.verdict == ConsistencyVerdict::Consistent)
        .map(|b| b.label.mean_rounding)
        .collect();
    assert_eq!(accepted, vec![Some(RoundingConvention::HalfUp)]);
}

#[test]
fn large_sample_is_consistent_and_flagged_uninformative() {
    let record =
        check_consistency(&ReportedStatistic::new(200, "3.45"), &AuditOpts::default()).unwrap();
    assert_eq!(record.verdict, ConsistencyVerdict::Consistent);
    assert!(record.reasons.iter().any(|r| r.contains("uninformative")));
    assert!(!grim_is_informative(200, 2));
    assert!(grim_is_informative(40, 2));
}

#[test]
fn zero_decimals_use_half_unit_brackets() {
    let pair = build_brackets("3", 0).unwrap();
    assert_eq!(pair.half_up.to_string(), "[2.5, 3.5)");
    let stat = ReportedStatistic::new(2, "3").with_decimals(0);
    let record = check_consistency(&stat, &AuditOpts::default()).unwrap();
    assert_eq!(record.verdict, ConsistencyVerdict::Consistent);
    let half_up: Vec<i128> = record
        .candidates
        .iter()
        .filter(|c| c.branch.mean_rounding == Some(RoundingConvention::HalfUp))
        .map(|c| c.sum)
        .collect();
    assert_eq!(half_up, vec![5, 6]);
}

#[test]
fn single_observation_must_be_an_integer() {
    assert_eq!(
        verdict(&ReportedStatistic::new(1, "4.00")),
        ConsistencyVerdict::Consistent
    );
    assert_eq!(
        verdict(&ReportedStatistic::new(1, "4.50")),
        ConsistencyVerdict::GrimInconsistent
    );
}

#[test]
fn multi_item_scales_widen_the_granularity() {
    // 3.45 is unreachable by 10 integers but reachable as 69 / 20.
    let stat = ReportedStatistic::new(10, "3.45").with_items(2);
    assert_eq!(verdict(&stat), ConsistencyVerdict::Consistent);
}

#[test]
fn unknown_precision_is_ambiguous() {
    let record =
        check_consistency(&ReportedStatistic::new(10, "3"), &AuditOpts::default()).unwrap();
    assert_eq!(record.verdict, ConsistencyVerdict::Ambiguous);
    assert!(record.branches.is_empty());
}

#[test]
fn precision_above_cap_is_rejected() {
    let stat = ReportedStatistic::new(10, "3.123456789");
    let err = check_consistency(&stat, &AuditOpts::default()).unwrap_err();
    assert!(err.is_invalid_input());
    assert_eq!(err.info().code, "precision-too-high");
}

#[test]
fn grim_failure_takes_precedence_over_sd() {
    let stat = ReportedStatistic::new(10, "3.45").with_sd("1.50");
    let record = check_consistency(&stat, &AuditOpts::default()).unwrap();
    assert_eq!(record.verdict, ConsistencyVerdict::GrimInconsistent);
    assert!(record.branches.iter().all(|b| b.label.denominator.is_none()));
}

#[test]
fn thousand_subjects_pass_both_checks() {
    let stat = ReportedStatistic::new(1000, "3.44").with_sd("2.47");
    let record = check_consistency(&stat, &AuditOpts::default()).unwrap();
    assert_eq!(record.verdict, ConsistencyVerdict::Consistent);
    assert!(record.reasons.iter().any(|r| r.contains("uninformative")));
    assert!(record.candidates.iter().all(|c| !c.exact));
}
