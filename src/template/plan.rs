//! Template plan precomputation for ZNCC.

use crate::image::ImageView;
use crate::util::{StitchError, StitchResult};

/// Precomputed statistics and zero-mean buffer for one template strip.
///
/// `var_t` is the sum of squared deviations, so the ZNCC score at a placement
/// is `sum(t' * i) / sqrt(var_t * var_i)` with `var_i` defined the same way.
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f64,
    var_t: f64,
    t_prime: Vec<f64>,
}

impl TemplatePlan {
    /// Builds a plan from a single-channel template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> StitchResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(StitchError::InvalidDimensions { width, height })?;

        let mut sum = 0.0f64;
        for y in 0..height {
            let row = template_row(tpl, y)?;
            sum += row.iter().map(|&v| f64::from(v)).sum::<f64>();
        }
        let mean = sum / count as f64;

        let mut t_prime = Vec::with_capacity(count);
        let mut var_t = 0.0f64;
        for y in 0..height {
            for &value in template_row(tpl, y)? {
                let d = f64::from(value) - mean;
                var_t += d * d;
                t_prime.push(d);
            }
        }

        if var_t / count as f64 <= 1e-8 {
            return Err(StitchError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            mean,
            var_t,
            t_prime,
        })
    }

    /// Returns the template width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns the sum of squared deviations from the mean.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn t_prime(&self) -> &[f64] {
        &self.t_prime
    }
}

fn template_row<'a>(tpl: ImageView<'a, u8>, y: usize) -> StitchResult<&'a [u8]> {
    tpl.row(y).ok_or_else(|| {
        let needed = (y + 1)
            .checked_mul(tpl.stride())
            .and_then(|v| v.checked_add(tpl.width()))
            .unwrap_or(usize::MAX);
        StitchError::BufferTooSmall {
            needed,
            got: tpl.as_slice().len(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::TemplatePlan;
    use crate::util::StitchError;
    use crate::ImageView;

    #[test]
    fn plan_matches_known_stats() {
        let data = [0u8, 1, 2, 3];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        let plan = TemplatePlan::from_view(view).unwrap();

        assert_eq!((plan.width(), plan.height()), (2, 2));
        assert!((plan.mean() - 1.5).abs() < 1e-12);
        assert!((plan.var_t() - 5.0).abs() < 1e-12);
        let expected = [-1.5, -0.5, 0.5, 1.5];
        for (value, expected) in plan.t_prime().iter().zip(expected.iter()) {
            assert!((value - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn flat_strip_is_degenerate() {
        let data = [255u8; 12];
        let view = ImageView::from_slice(&data, 4, 3).unwrap();
        let err = TemplatePlan::from_view(view).err().unwrap();
        assert_eq!(
            err,
            StitchError::DegenerateTemplate {
                reason: "zero variance",
            }
        );
    }
}
