use crate::types::{Point, Value};

// Below this denominator the crossing is treated as degenerate.
const DEGENERATE_DENOMINATOR: Value = 1e-12;

/// Fraction used when both edge endpoints carry the same field value.
pub const DEGENERATE_FRACTION: Value = 0.5;

/// Returns the weight `t` of `first` for the zero crossing on the edge `first -> second`.
///
/// ```text
/// t = F(second) / (F(second) - F(first))
/// vertex = t * first + (1 - t) * second
/// ```
///
/// Equal (or non-finite) endpoint values fall back to [`DEGENERATE_FRACTION`];
/// otherwise the result is clamped to `[0, 1]`.
#[inline]
pub fn crossing_fraction(first: Value, second: Value) -> Value {
    let denom = second - first;
    if denom.abs() < DEGENERATE_DENOMINATOR {
        return DEGENERATE_FRACTION;
    }

    let t = second / denom;
    if !t.is_finite() {
        return DEGENERATE_FRACTION;
    }
    t.clamp(0., 1.)
}

// Linear interpolation
#[inline]
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

/// Returns `t * first + (1 - t) * second`.
#[inline]
pub fn interpolate_points(first: &Point, second: &Point, t: Value) -> Point {
    Point::new(
        lerp(second.x, first.x, t),
        lerp(second.y, first.y, t),
        lerp(second.z, first.z, t),
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn fraction_matches_linear_root() {
        // F goes from 3 at `first` to -1 at `second`: root a quarter of the way from second.
        let t = crossing_fraction(3., -1.);
        assert_relative_eq!(t, 0.25);

        let v = interpolate_points(&Point::new(1., 0., 0.), &Point::new(0., 0., 0.), t);
        assert_relative_eq!(v, Point::new(0.25, 0., 0.));
    }

    #[test]
    fn fraction_stays_on_segment() {
        let samples = [-4., -1., -0.25, 0., 0.25, 1., 4.];
        for &a in &samples {
            for &b in &samples {
                let t = crossing_fraction(a, b);
                assert!((0. ..=1.).contains(&t), "t = {t} for ({a}, {b})");
            }
        }
    }

    #[test]
    fn equal_values_use_degenerate_fraction() {
        assert_eq!(crossing_fraction(0., 0.), DEGENERATE_FRACTION);
        assert_eq!(crossing_fraction(2., 2.), DEGENERATE_FRACTION);
    }

    #[test]
    fn non_finite_values_use_degenerate_fraction() {
        assert_eq!(crossing_fraction(1., Value::INFINITY), DEGENERATE_FRACTION);
        assert_eq!(crossing_fraction(Value::NAN, 1.), DEGENERATE_FRACTION);
    }

    #[test]
    fn crossing_at_second_endpoint() {
        assert_eq!(crossing_fraction(1., 0.), 0.);
    }
}
