//! Easing curves for window transitions, including a CSS-like cubic
//! Bézier solver.

use serde::{Deserialize, Serialize};

/// Maps linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    /// Fast start, gentle landing.
    #[default]
    OutCubic,
    InOutCubic,
    /// CSS `ease`, i.e. `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Easing {
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::Ease => cubic_bezier(t, 0.25, 0.10, 0.25, 1.00),
            Easing::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(t, x1, y1, x2, y2),
        }
    }
}

/// Evaluate a CSS-like cubic-bezier easing at normalized time `u`.
///
/// Control points are (0,0), (x1,y1), (x2,y2), (1,1).
pub fn cubic_bezier(u: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Polynomial coefficients with the endpoints fixed at (0,0) and (1,1):
    // B(t) = ((a*t + b)*t + c)*t
    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample = |a: f64, b: f64, c: f64, t: f64| ((a * t + b) * t + c) * t;

    let u = u.clamp(0.0, 1.0);
    let t = solve_t_for_x(u, ax, bx, cx);
    sample(ay, by, cy, t)
}

/// Solve x(t) = u for t in [0,1]: Newton-Raphson, then bisection.
fn solve_t_for_x(u: f64, ax: f64, bx: f64, cx: f64) -> f64 {
    let mut t = u;
    for _ in 0..8 {
        let x = ((ax * t + bx) * t + cx) * t - u;
        if x.abs() < 1e-7 {
            return t;
        }
        let dx = (3.0 * ax * t + 2.0 * bx) * t + cx;
        if dx.abs() < 1e-7 {
            break;
        }
        t -= x / dx;
        if !(0.0..=1.0).contains(&t) {
            break;
        }
    }

    let mut lo = 0.0;
    let mut hi = 1.0;
    t = u;
    for _ in 0..40 {
        let x = ((ax * t + bx) * t + cx) * t;
        if (x - u).abs() < 1e-9 {
            return t;
        }
        if x < u {
            lo = t;
        } else {
            hi = t;
        }
        t = 0.5 * (lo + hi);
    }
    t
}
