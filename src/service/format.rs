//! Magnitude-suffixed number formatting
//!
//! Mirrors the `fmtNumber` helper in `static/app.js`; export files use this
//! so the Display column matches what the browser shows.

/// Format a financial value with a K/M/B/T suffix and two decimal places.
/// Absent values render the literal token "N/A".
pub fn fmt_number(value: Option<f64>) -> String {
    let Some(v) = value else {
        return "N/A".to_string();
    };
    if !v.is_finite() {
        return "N/A".to_string();
    }

    let abs = v.abs();
    if abs >= 1e12 {
        format!("{:.2}T", v / 1e12)
    } else if abs >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", v / 1e3)
    } else if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_thresholds() {
        assert_eq!(fmt_number(Some(1_500.0)), "1.50K");
        assert_eq!(fmt_number(Some(2_300_000.0)), "2.30M");
        assert_eq!(fmt_number(Some(3_000_000_000.0)), "3.00B");
        assert_eq!(fmt_number(Some(3_000_000_000_000.0)), "3.00T");
    }

    #[test]
    fn test_below_one_thousand_has_no_suffix() {
        assert_eq!(fmt_number(Some(999.0)), "999");
        assert_eq!(fmt_number(Some(0.0)), "0");
        assert_eq!(fmt_number(Some(28.5)), "28.50");
    }

    #[test]
    fn test_absent_renders_na() {
        assert_eq!(fmt_number(None), "N/A");
        assert_eq!(fmt_number(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_negative_values() {
        assert_eq!(fmt_number(Some(-1_500_000.0)), "-1.50M");
        assert_eq!(fmt_number(Some(-42.0)), "-42");
    }

    #[test]
    fn test_exact_thresholds() {
        assert_eq!(fmt_number(Some(1_000.0)), "1.00K");
        assert_eq!(fmt_number(Some(1_000_000.0)), "1.00M");
    }
}
