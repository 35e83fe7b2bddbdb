pub(crate) fn f64_partial_cmp_equal(a: &f64, b: &f64) -> bool {
    match a.partial_cmp(b) {
        Some(std::cmp::Ordering::Equal) => true,
        Some(std::cmp::Ordering::Less) => false,
        Some(std::cmp::Ordering::Greater) => false,
        None => false,
    }
}

/// Quantize a branch length / time value to 10 decimal digits so that
/// floating-point jitter does not defeat the matrix-exponential cache
/// (spec.md S4.7: "cache the matrix exponential by quantized time").
pub(crate) fn quantize_time(t: f64) -> u64 {
    (t * 1e10).round() as u64
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_f64_partial_cmp_equal() {
        assert!(f64_partial_cmp_equal(&1.0, &1.0));
        assert!(!f64_partial_cmp_equal(&1.0, &1.1));
        assert!(!f64_partial_cmp_equal(&f64::NAN, &1.0));
    }

    #[test]
    fn test_quantize_time_collapses_jitter() {
        let a = quantize_time(1.000_000_000_01);
        let b = quantize_time(1.000_000_000_02);
        assert_eq!(a, b);
        assert_ne!(quantize_time(1.0), quantize_time(2.0));
    }
}
