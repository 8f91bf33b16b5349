use ndarray::Array2;

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Bilinear interpolation at (y, x): a horizontal lerp on each bracketing
/// row, then a vertical lerp between them. Samples outside the array take
/// `cval`.
pub fn bilinear_sample(data: &Array2<f32>, y: f64, x: f64, cval: f32) -> f32 {
    let (h, w) = data.dim();
    let r0 = y.floor() as i64;
    let c0 = x.floor() as i64;
    let ty = (y - r0 as f64) as f32;
    let tx = (x - c0 as f64) as f32;

    let at = |r: i64, c: i64| -> f32 {
        if r >= 0 && c >= 0 && r < h as i64 && c < w as i64 {
            data[[r as usize, c as usize]]
        } else {
            cval
        }
    };

    let upper = lerp(at(r0, c0), at(r0, c0 + 1), tx);
    let lower = lerp(at(r0 + 1, c0), at(r0 + 1, c0 + 1), tx);
    lerp(upper, lower, ty)
}

/// Catmull-Rom kernel (a = -0.5).
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

/// Bicubic (Catmull-Rom) interpolation at (y, x) with `cval` outside the
/// array.
pub fn cubic_sample(data: &Array2<f32>, y: f64, x: f64, cval: f32) -> f32 {
    let (h, w) = data.dim();

    let y0 = y.floor() as i64;
    let x0 = x.floor() as i64;

    let mut acc = 0.0f64;
    for dy in -1..=2i64 {
        let r = y0 + dy;
        let wy = cubic_weight(y - r as f64);
        if wy == 0.0 {
            continue;
        }
        for dx in -1..=2i64 {
            let c = x0 + dx;
            let wx = cubic_weight(x - c as f64);
            if wx == 0.0 {
                continue;
            }
            let v = if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
                data[[r as usize, c as usize]] as f64
            } else {
                cval as f64
            };
            acc += v * wy * wx;
        }
    }

    acc as f32
}

/// Nearest-neighbour sample at (y, x) with `cval` outside the array.
pub fn nearest_sample(data: &Array2<f32>, y: f64, x: f64, cval: f32) -> f32 {
    let (h, w) = data.dim();
    let r = y.round() as i64;
    let c = x.round() as i64;
    if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
        data[[r as usize, c as usize]]
    } else {
        cval
    }
}
