//! Scalar reference ZNCC kernel.

use crate::kernel::Peak;
use crate::template::TemplatePlan;
use crate::util::{StitchError, StitchResult};
use crate::ImageView;

fn check_geometry(window: ImageView<'_, u8>, tpl: &TemplatePlan) -> StitchResult<()> {
    if window.width() != tpl.width() {
        return Err(StitchError::ShapeMismatch {
            context: "template and window differ in width",
        });
    }
    if window.height() < tpl.height() {
        return Err(StitchError::RowsOutOfBounds {
            start: 0,
            count: tpl.height(),
            height: window.height(),
        });
    }
    Ok(())
}

fn dot_at(window: ImageView<'_, u8>, tpl: &TemplatePlan, y: usize) -> f64 {
    let width = tpl.width();
    let t_prime = tpl.t_prime();
    let mut dot = 0.0f64;
    for ty in 0..tpl.height() {
        let img_row = window.row(y + ty).expect("row within bounds for scan");
        let tpl_row = &t_prime[ty * width..(ty + 1) * width];
        dot += tpl_row
            .iter()
            .zip(img_row)
            .map(|(&t, &v)| t * f64::from(v))
            .sum::<f64>();
    }
    dot
}

/// Computes the ZNCC score with the template's first row at window row `y`.
///
/// `min_var_i` is a per-sample variance floor. Returns `f64::NEG_INFINITY`
/// for placements outside the window, mismatched widths, or flat windows.
pub fn score_at(window: ImageView<'_, u8>, tpl: &TemplatePlan, y: usize, min_var_i: f64) -> f64 {
    if check_geometry(window, tpl).is_err() || y > window.height() - tpl.height() {
        return f64::NEG_INFINITY;
    }

    let n = (tpl.width() * tpl.height()) as f64;
    let mut sum_i = 0.0f64;
    let mut sum_i2 = 0.0f64;
    for ty in 0..tpl.height() {
        let img_row = window.row(y + ty).expect("row within bounds for score");
        for &v in img_row {
            let v = f64::from(v);
            sum_i += v;
            sum_i2 += v * v;
        }
    }

    let var_i = sum_i2 - (sum_i * sum_i) / n;
    if var_i <= min_var_i * n {
        return f64::NEG_INFINITY;
    }
    let score = dot_at(window, tpl, y) / (tpl.var_t() * var_i).sqrt();
    if score.is_finite() {
        score
    } else {
        f64::NEG_INFINITY
    }
}

/// Scans every vertical placement and returns the best one.
///
/// Ties keep the smallest `y`. Returns `Ok(None)` when every placement is
/// rejected by `min_var_i`.
pub fn scan_vertical(
    window: ImageView<'_, u8>,
    tpl: &TemplatePlan,
    min_var_i: f64,
) -> StitchResult<Option<Peak>> {
    check_geometry(window, tpl)?;

    // Row prefix sums make each placement's window statistics O(1).
    let mut prefix_sum = Vec::with_capacity(window.height() + 1);
    let mut prefix_sq = Vec::with_capacity(window.height() + 1);
    prefix_sum.push(0.0f64);
    prefix_sq.push(0.0f64);
    for y in 0..window.height() {
        let row = window.row(y).expect("row within bounds for scan");
        let (s, s2) = row.iter().fold((0.0f64, 0.0f64), |(s, s2), &v| {
            let v = f64::from(v);
            (s + v, s2 + v * v)
        });
        prefix_sum.push(prefix_sum[y] + s);
        prefix_sq.push(prefix_sq[y] + s2);
    }

    let tpl_height = tpl.height();
    let n = (tpl.width() * tpl_height) as f64;
    let var_t = tpl.var_t();
    let mut best: Option<Peak> = None;
    for y in 0..=(window.height() - tpl_height) {
        let sum_i = prefix_sum[y + tpl_height] - prefix_sum[y];
        let sum_i2 = prefix_sq[y + tpl_height] - prefix_sq[y];
        let var_i = sum_i2 - (sum_i * sum_i) / n;
        if var_i <= min_var_i * n {
            continue;
        }

        let score = dot_at(window, tpl, y) / (var_t * var_i).sqrt();
        if !score.is_finite() {
            continue;
        }
        if best.map_or(true, |peak| score > peak.score) {
            best = Some(Peak { y, score });
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::{scan_vertical, score_at};
    use crate::template::TemplatePlan;
    use crate::ImageView;

    fn make_window(width: usize, height: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(((x * 17 + y * 29 + x * y * 3) % 251) as u8);
            }
        }
        data
    }

    #[test]
    fn scan_matches_bruteforce() {
        let width = 7;
        let height = 12;
        let window = make_window(width, height);
        let view = ImageView::from_slice(&window, width, height).unwrap();

        let tpl_data: Vec<u8> = (0..width * 3).map(|i| ((i * 37) % 200) as u8).collect();
        let tpl_view = ImageView::from_slice(&tpl_data, width, 3).unwrap();
        let plan = TemplatePlan::from_view(tpl_view).unwrap();

        let best = scan_vertical(view, &plan, 1e-8).unwrap().unwrap();

        let mut best_y = 0;
        let mut best_score = f64::NEG_INFINITY;
        for y in 0..=(height - 3) {
            let score = score_at(view, &plan, y, 1e-8);
            if score > best_score {
                best_score = score;
                best_y = y;
            }
        }
        assert_eq!(best.y, best_y);
        assert!((best.score - best_score).abs() < 1e-9);
    }

    #[test]
    fn exact_copy_scores_one() {
        let width = 5;
        let height = 10;
        let window = make_window(width, height);
        let view = ImageView::from_slice(&window, width, height).unwrap();
        let strip = view.rows(4, 3).unwrap();
        let plan = TemplatePlan::from_view(strip).unwrap();

        let best = scan_vertical(view, &plan, 1e-8).unwrap().unwrap();
        assert_eq!(best.y, 4);
        assert!((best.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn taller_template_is_rejected() {
        let window = make_window(4, 3);
        let view = ImageView::from_slice(&window, 4, 3).unwrap();
        let tpl = make_window(4, 5);
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 4, 5).unwrap()).unwrap();
        assert!(scan_vertical(view, &plan, 1e-8).is_err());
        assert_eq!(score_at(view, &plan, 0, 1e-8), f64::NEG_INFINITY);
    }
}
