/// Forward return per bar: `close[i + horizon] / close[i] − 1`.
///
/// `closes` must be one ticker's series in ascending time order. The last
/// `horizon` entries have no value, nor does any bar whose ratio is not
/// finite (zero or NaN closes).
pub fn forward_returns(closes: &[f64], horizon: usize) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            let later = *closes.get(i.checked_add(horizon)?)?;
            let base = closes[i];
            if base == 0.0 {
                return None;
            }
            let ret = later / base - 1.0;
            ret.is_finite().then_some(ret)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bar_horizon() {
        let r = forward_returns(&[10.0, 11.0, 9.0, 12.0], 1);
        assert_eq!(r.len(), 4);
        assert!((r[0].unwrap() - 0.10).abs() < 1e-12);
        assert!((r[1].unwrap() - (9.0 / 11.0 - 1.0)).abs() < 1e-12);
        assert!((r[2].unwrap() - (12.0 / 9.0 - 1.0)).abs() < 1e-12);
        assert!(r[3].is_none());
    }

    #[test]
    fn tail_is_horizon_long() {
        let r = forward_returns(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(r.iter().filter(|v| v.is_none()).count(), 3);
        assert_eq!(r[0], Some(3.0));
        assert_eq!(r[1], Some(1.5));
    }

    #[test]
    fn horizon_longer_than_series() {
        assert!(forward_returns(&[1.0, 2.0], 5).iter().all(Option::is_none));
        assert!(forward_returns(&[], 1).is_empty());
    }

    #[test]
    fn zero_and_nan_bases_have_no_return() {
        let r = forward_returns(&[0.0, 1.0, f64::NAN, 2.0], 1);
        assert_eq!(r[0], None);
        assert_eq!(r[1], None);
        assert_eq!(r[2], None);
    }
}
