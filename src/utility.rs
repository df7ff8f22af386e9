//! Small numeric helpers shared by the extractors and the renderer.

use optional::{none, some, Optioned};

/// Evenly spaced values from `start` to `stop` inclusive, `step` apart.
///
/// Computing each value from its index keeps floating point drift from dropping or duplicating
/// the last level, so `stepped_range(-3.6, 3.6, 0.2)` has exactly 37 values.
pub fn stepped_range(start: f64, stop: f64, step: f64) -> Vec<f64> {
    debug_assert!(step > 0.0);

    let n = ((stop - start) / step + 1.0e-9).floor() as usize;
    (0..=n)
        .map(|i| start + i as f64 * step)
        // Snap values like 2.9999999999 to 3.0 so tick labels print cleanly
        .map(|v| (v * 1.0e9).round() / 1.0e9)
        .collect()
}

/// Arithmetic mean of the values that are present. `none` if nothing is present.
pub fn mean_present<'a, I>(vals: I) -> Optioned<f64>
where
    I: IntoIterator<Item = &'a Optioned<f64>>,
{
    let (sum, count) = vals
        .into_iter()
        .filter_map(|v| v.into_option())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count > 0 {
        some(sum / count as f64)
    } else {
        none()
    }
}

/// Arithmetic mean that is only defined if every value is present.
pub fn mean_all<'a, I>(vals: I) -> Optioned<f64>
where
    I: IntoIterator<Item = &'a Optioned<f64>>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in vals {
        match v.into_option() {
            Some(v) => {
                sum += v;
                count += 1;
            }
            None => return none(),
        }
    }

    if count > 0 {
        some(sum / count as f64)
    } else {
        none()
    }
}

/// Convert a raw value into an `Optioned`, treating NaN and the dataset fill value as missing.
#[inline]
pub fn present_or_none(val: f64, fill_value: Option<f64>) -> Optioned<f64> {
    if val.is_nan() {
        return none();
    }

    match fill_value {
        Some(fill) if (val - fill).abs() <= fill.abs() * 1.0e-6 => none(),
        _ => some(val),
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::*;

    #[test]
    fn test_stepped_range() {
        let lvls = stepped_range(-3.6, 3.6, 0.2);
        assert_eq!(lvls.len(), 37);
        assert!(approx_equal(lvls[0], -3.6, 1.0e-12));
        assert!(approx_equal(lvls[36], 3.6, 1.0e-12));
        assert!(approx_equal(lvls[18], 0.0, 1.0e-12));

        let ticks = stepped_range(-3.0, 3.0, 0.6);
        assert_eq!(ticks.len(), 11);

        assert_eq!(stepped_range(1.0, 19.0, 3.0), vec![1.0, 4.0, 7.0, 10.0, 13.0, 16.0, 19.0]);
    }

    #[test]
    fn test_means() {
        let vals = [some(1.0), none(), some(3.0)];
        assert!(approx_equal(mean_present(&vals).unwrap(), 2.0, 1.0e-12));
        assert!(mean_all(&vals).is_none());

        let vals = [some(1.0), some(2.0), some(6.0)];
        assert!(approx_equal(mean_all(&vals).unwrap(), 3.0, 1.0e-12));

        let empty: [Optioned<f64>; 0] = [];
        assert!(mean_present(&empty).is_none());
        assert!(mean_all(&empty).is_none());
    }

    #[test]
    fn test_present_or_none() {
        assert!(present_or_none(f64::NAN, None).is_none());
        assert!(present_or_none(-1.0e20, Some(-1.0e20)).is_none());
        assert!(present_or_none(9.969209968386869e36, Some(9.969209968386869e36)).is_none());
        assert_eq!(present_or_none(1.5, Some(-1.0e20)).unwrap(), 1.5);
        assert_eq!(present_or_none(0.0, None).unwrap(), 0.0);
    }
}
