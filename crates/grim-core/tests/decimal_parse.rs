use grim_core::{DecimalDisplay, GrimError, Ratio};

fn code(err: GrimError) -> String {
    err.info().code.clone()
}

#[test]
fn parses_at_shown_precision() {
    let value = DecimalDisplay::parse("3.44", None).unwrap();
    assert_eq!(value.units(), 344);
    assert_eq!(value.scale(), 2);
    assert_eq!(value.to_ratio().unwrap(), Ratio::new(86, 25).unwrap());
}

#[test]
fn pads_to_stated_precision() {
    let value = DecimalDisplay::parse("3.5", Some(2)).unwrap();
    assert_eq!(value.units(), 350);
    assert_eq!(value.to_string(), "3.50");
    let whole = DecimalDisplay::parse("4", Some(1)).unwrap();
    assert_eq!(whole.units(), 40);
}

#[test]
fn accepts_leading_point_and_whitespace() {
    let value = DecimalDisplay::parse(" .75 ", None).unwrap();
    assert_eq!((value.units(), value.scale()), (75, 2));
}

#[test]
fn rejects_excess_precision() {
    let err = DecimalDisplay::parse("3.445", Some(2)).unwrap_err();
    assert_eq!(code(err), "excess-precision");
}

#[test]
fn rejects_negative_and_malformed_values() {
    assert_eq!(code(DecimalDisplay::parse("-1.2", None).unwrap_err()), "negative-display");
    assert_eq!(code(DecimalDisplay::parse("", None).unwrap_err()), "empty-display");
    for text in ["1.2.3", "1e3", "abc", "+2", ".", "3,5"] {
        assert_eq!(
            code(DecimalDisplay::parse(text, None).unwrap_err()),
            "malformed-display",
            "{text}"
        );
    }
}

#[test]
fn overflow_is_reported_not_panicked() {
    let huge = "9".repeat(60);
    let err = DecimalDisplay::parse(&huge, None).unwrap_err();
    assert_eq!(code(err), "magnitude-overflow");
}

#[test]
fn shown_decimals_counts_fraction_digits() {
    assert_eq!(DecimalDisplay::shown_decimals("3.440"), 3);
    assert_eq!(DecimalDisplay::shown_decimals("12"), 0);
}
