//! Classification metrics.

/// Harmonic mean of precision and recall.
///
/// Returns 0.0 when `precision + recall == 0`, where F1 is otherwise undefined.
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    let denom = precision + recall;
    if denom == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / denom
}

/// True when F1 had to fall back to the zero-denominator policy.
pub fn is_degenerate(precision: f64, recall: f64) -> bool {
    precision + recall == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f1_perfect() {
        assert_eq!(f1_score(1.0, 1.0), 1.0);
    }

    #[test]
    fn test_f1_zero_denominator() {
        let f1 = f1_score(0.0, 0.0);
        assert_eq!(f1, 0.0);
        assert!(!f1.is_nan());
        assert!(is_degenerate(0.0, 0.0));
    }

    #[test]
    fn test_f1_harmonic_mean() {
        let f1 = f1_score(0.5, 1.0);
        assert!((f1 - 2.0 / 3.0).abs() < 1e-12);
        assert!(!is_degenerate(0.5, 1.0));
    }
}
