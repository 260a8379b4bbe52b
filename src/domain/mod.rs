pub mod models;

/// Round to one decimal place, the precision used for score averages.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places, the precision used for rates and percentages.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_precision() {
        assert_eq!(round1(66.666), 66.7);
        assert_eq!(round2(33.3333), 33.33);
        assert_eq!(round2(2.0 / 3.0 * 100.0), 66.67);
    }
}
