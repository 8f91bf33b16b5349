//! Peak location, sub-pixel refinement and ambiguity scoring on a
//! correlation surface.

use ndarray::Array2;

/// Normalize the surface to [0, 1] in place by subtracting the minimum and
/// dividing by the new maximum.
pub(crate) fn normalize_surface(surface: &mut Array2<f64>) {
    let min = surface.iter().copied().fold(f64::INFINITY, f64::min);
    surface.mapv_inplace(|v| v - min);
    let max = surface.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        surface.mapv_inplace(|v| v / max);
    }
}

/// Global maximum: (row, col, value).
pub(crate) fn find_peak(surface: &Array2<f64>) -> (usize, usize, f64) {
    let (h, w) = surface.dim();
    let mut best_row = 0;
    let mut best_col = 0;
    let mut best_val = f64::NEG_INFINITY;

    for row in 0..h {
        for col in 0..w {
            if surface[[row, col]] > best_val {
                best_val = surface[[row, col]];
                best_row = row;
                best_col = col;
            }
        }
    }

    (best_row, best_col, best_val)
}

/// Centre of mass of the (2*radius+1)^2 neighbourhood around the peak,
/// clipped at the surface edges. Gives sub-pixel peak coordinates.
pub(crate) fn center_of_mass(
    surface: &Array2<f64>,
    peak_row: usize,
    peak_col: usize,
    radius: usize,
) -> (f64, f64) {
    let (h, w) = surface.dim();
    let r0 = peak_row.saturating_sub(radius);
    let r1 = (peak_row + radius).min(h - 1);
    let c0 = peak_col.saturating_sub(radius);
    let c1 = (peak_col + radius).min(w - 1);

    let mut mass = 0.0;
    let mut my = 0.0;
    let mut mx = 0.0;
    for r in r0..=r1 {
        for c in c0..=c1 {
            let v = surface[[r, c]];
            mass += v;
            my += v * r as f64;
            mx += v * c as f64;
        }
    }

    if mass > 0.0 {
        (my / mass, mx / mass)
    } else {
        (peak_row as f64, peak_col as f64)
    }
}

/// Highest value outside a square exclusion window around the primary peak.
/// Close to the peak value itself this indicates an ambiguous surface.
pub(crate) fn second_peak_value(
    surface: &Array2<f64>,
    peak_row: usize,
    peak_col: usize,
    exclusion_radius: usize,
) -> f64 {
    let (h, w) = surface.dim();
    let mut best = 0.0f64;
    for r in 0..h {
        for c in 0..w {
            if r.abs_diff(peak_row) <= exclusion_radius && c.abs_diff(peak_col) <= exclusion_radius
            {
                continue;
            }
            if surface[[r, c]] > best {
                best = surface[[r, c]];
            }
        }
    }
    best
}
