//! Decimal precision helpers shared by catalog building and fee math.

/// Count of significant decimal places in a venue step string.
///
/// Venue filters express tick and lot sizes as strings such as `"0.00100000"`
/// (precision 3) or `"1.00000000"` (precision 0). Scientific notation like
/// `"1E-4"` is accepted as well.
pub fn precision_from_string(step: &str) -> u32 {
    let trimmed = step.trim();

    if let Some((mantissa, exponent)) = split_scientific(trimmed) {
        let mantissa_places = decimal_places(mantissa);
        let shifted = mantissa_places as i64 - exponent;
        return shifted.max(0) as u32;
    }

    decimal_places(trimmed)
}

fn decimal_places(value: &str) -> u32 {
    match value.split_once('.') {
        Some((_, fraction)) => fraction.trim_end_matches('0').len() as u32,
        None => 0,
    }
}

fn split_scientific(value: &str) -> Option<(&str, i64)> {
    let (mantissa, exponent) = value
        .split_once(['e', 'E'])
        .filter(|(mantissa, _)| !mantissa.is_empty())?;
    exponent.parse::<i64>().ok().map(|exp| (mantissa, exp))
}

/// Round half-away-from-zero to `precision` decimal places.
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let factor = 10_f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Truncate toward zero to `precision` decimal places.
pub fn truncate_to_precision(value: f64, precision: u32) -> f64 {
    let factor = 10_f64.powi(precision as i32);
    (value * factor).trunc() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_precision_from_step_strings() {
        assert_eq!(precision_from_string("0.001"), 3);
        assert_eq!(precision_from_string("0.00100000"), 3);
        assert_eq!(precision_from_string("1.00000000"), 0);
        assert_eq!(precision_from_string("1"), 0);
        assert_eq!(precision_from_string("0.00000001"), 8);
    }

    #[test]
    fn derives_precision_from_scientific_steps() {
        assert_eq!(precision_from_string("1E-4"), 4);
        assert_eq!(precision_from_string("1e-8"), 8);
        assert_eq!(precision_from_string("2.5e-3"), 4);
    }

    #[test]
    fn rounds_and_truncates() {
        assert_eq!(round_to_precision(0.123_45, 3), 0.123);
        assert_eq!(round_to_precision(0.123_55, 3), 0.124);
        assert_eq!(truncate_to_precision(0.123_99, 3), 0.123);
        assert_eq!(truncate_to_precision(12.0, 0), 12.0);
    }
}
