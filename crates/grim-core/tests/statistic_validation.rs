use grim_core::{ReportedStatistic, ScaleBounds, VarianceDenominator};

fn code_of(stat: &ReportedStatistic) -> String {
    stat.validate().unwrap_err().info().code.clone()
}

#[test]
fn accepts_typical_likert_report() {
    let stat = ReportedStatistic::new(18, "3.44")
        .with_decimals(2)
        .with_sd("2.47")
        .with_scale(1, 7);
    assert!(stat.validate().is_ok());
}

#[test]
fn rejects_zero_n() {
    assert_eq!(code_of(&ReportedStatistic::new(0, "3.00")), "non-positive-n");
}

#[test]
fn rejects_negative_sd() {
    let stat = ReportedStatistic::new(10, "3.00").with_sd("-0.50");
    assert_eq!(code_of(&stat), "negative-sd");
}

#[test]
fn rejects_mean_outside_closed_scale() {
    let above = ReportedStatistic::new(10, "5.10").with_scale(1, 5);
    assert_eq!(code_of(&above), "mean-outside-scale");
    let below = ReportedStatistic::new(10, "0.90").with_scale(1, 5);
    assert_eq!(code_of(&below), "mean-outside-scale");
    let edge = ReportedStatistic::new(10, "5.00").with_scale(1, 5);
    assert!(edge.validate().is_ok());
}

#[test]
fn rejects_inverted_scale_and_zero_items() {
    let inverted = ReportedStatistic::new(10, "3.00").with_scale(5, 1);
    assert_eq!(code_of(&inverted), "inverted-scale");
    let no_items = ReportedStatistic::new(10, "3.00").with_items(0);
    assert_eq!(code_of(&no_items), "zero-items");
}

#[test]
fn rejects_sample_sd_for_single_observation() {
    let stat = ReportedStatistic::new(1, "3.00")
        .with_sd("0.00")
        .with_denominator(VarianceDenominator::Sample);
    assert_eq!(code_of(&stat), "sample-sd-undefined");
}

#[test]
fn precision_resolution() {
    let inferred = ReportedStatistic::new(10, "3.4").with_sd("1.23");
    assert_eq!(inferred.mean_precision(), Some(1));
    assert_eq!(inferred.sd_precision(), Some(2));

    let stated = ReportedStatistic::new(10, "3.4").with_decimals(2).with_sd("1.2");
    assert_eq!(stated.sd_precision(), Some(2));

    let unknown = ReportedStatistic::new(10, "3");
    assert_eq!(unknown.mean_precision(), None);
}

#[test]
fn denominator_conventions() {
    assert_eq!(
        VarianceDenominator::Unspecified.conventions(10),
        vec![VarianceDenominator::Population, VarianceDenominator::Sample]
    );
    assert_eq!(
        VarianceDenominator::Unspecified.conventions(1),
        vec![VarianceDenominator::Population]
    );
    assert_eq!(VarianceDenominator::Sample.divisor(10), Some(9));
    assert_eq!(VarianceDenominator::Sample.divisor(1), None);
    assert_eq!("n-1".parse::<VarianceDenominator>().unwrap(), VarianceDenominator::Sample);
    assert!("median".parse::<VarianceDenominator>().is_err());
}

#[test]
fn scale_defaults_to_non_negative() {
    let scale = ScaleBounds::default();
    assert_eq!(scale.min, Some(0));
    assert_eq!(scale.max, None);
    assert!(!scale.is_closed());
}
