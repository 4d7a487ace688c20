//! Exact floating-point summation.
//!
//! Keeps a list of non-overlapping partial sums (Shewchuk) so the running
//! total is represented without error, then rounds once. The result is the
//! correctly rounded sum of the inputs and therefore does not depend on the
//! order in which rows are added.

/// Order-independent accumulator for `f64` values.
#[derive(Debug, Clone, Default)]
pub struct ExactSum {
    partials: Vec<f64>,
    non_finite: Option<f64>,
}

impl ExactSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        if !value.is_finite() {
            self.non_finite = Some(self.non_finite.unwrap_or(0.0) + value);
            return;
        }

        let mut x = value;
        let mut kept = 0;
        for j in 0..self.partials.len() {
            let mut y = self.partials[j];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let hi = x + y;
            if !hi.is_finite() {
                // Overflow: the total is past f64 range, partials are moot.
                self.partials.clear();
                self.non_finite = Some(self.non_finite.unwrap_or(0.0) + hi);
                return;
            }
            let lo = y - (hi - x);
            if lo != 0.0 {
                self.partials[kept] = lo;
                kept += 1;
            }
            x = hi;
        }
        self.partials.truncate(kept);
        self.partials.push(x);
    }

    /// Correctly rounded total.
    pub fn total(&self) -> f64 {
        if let Some(special) = self.non_finite {
            return special;
        }

        let p = &self.partials;
        let mut n = p.len();
        if n == 0 {
            return 0.0;
        }

        n -= 1;
        let mut hi = p[n];
        let mut lo = 0.0;
        while n > 0 {
            let x = hi;
            n -= 1;
            let y = p[n];
            hi = x + y;
            let yr = hi - x;
            lo = y - yr;
            if lo != 0.0 {
                break;
            }
        }

        // Half-way case: the remaining partials decide the rounding direction.
        if n > 0 && ((lo < 0.0 && p[n - 1] < 0.0) || (lo > 0.0 && p[n - 1] > 0.0)) {
            let y = lo * 2.0;
            let x = hi + y;
            let yr = x - hi;
            if y == yr {
                hi = x;
            }
        }
        hi
    }
}

impl Extend<f64> for ExactSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

impl FromIterator<f64> for ExactSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sum = Self::new();
        sum.extend(iter);
        sum
    }
}

/// Correctly rounded sum of `values`.
pub fn exact_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().collect::<ExactSum>().total()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(exact_sum(Vec::<f64>::new()), 0.0);
    }

    #[test]
    fn cancellation_is_exact() {
        assert_eq!(exact_sum([1e16, 1.0, -1e16]), 1.0);
        assert_eq!(exact_sum([1e100, 1.0, -1e100, 1e-100]), 1.0);
    }

    #[test]
    fn tenths_sum_to_one() {
        assert_eq!(exact_sum(std::iter::repeat(0.1).take(10)), 1.0);
    }

    #[test]
    fn order_does_not_matter() {
        let values = [0.1, 0.2, 0.3, 1e-17, 1e16, -1e16, 0.05, 3.3e-5, 7.0];
        let forward = exact_sum(values);
        let reversed = exact_sum(values.iter().rev().copied());

        let mut rotated = values;
        rotated.rotate_left(4);
        let rotated = exact_sum(rotated);

        let mut swapped = values;
        swapped.swap(0, 8);
        swapped.swap(2, 5);
        let swapped = exact_sum(swapped);

        assert_eq!(forward.to_bits(), reversed.to_bits());
        assert_eq!(forward.to_bits(), rotated.to_bits());
        assert_eq!(forward.to_bits(), swapped.to_bits());
    }

    #[test]
    fn infinity_propagates() {
        assert_eq!(exact_sum([1.0, f64::INFINITY]), f64::INFINITY);
        assert!(exact_sum([f64::INFINITY, f64::NEG_INFINITY]).is_nan());
    }

    #[test]
    fn overflow_gives_infinity() {
        assert_eq!(exact_sum([f64::MAX, f64::MAX]), f64::INFINITY);
        assert_eq!(exact_sum([-f64::MAX, -f64::MAX, 1.0]), f64::NEG_INFINITY);
    }
}
