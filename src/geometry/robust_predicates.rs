//! Robust geometric predicates for planar triangulation.
//!
//! Both predicates evaluate their determinants through the double-double
//! expansions in [`dd`](crate::geometry::dd), so the sign of the high
//! component is trustworthy even when the plain `f64` evaluation would
//! cancel to noise. The in-circle test additionally carries a small
//! positive bias toward "outside" so that chains of near-cocircular
//! points cannot drive the legalization pass into a flip cycle.

use crate::geometry::dd::{dd_add, dd_diff, dd_mul, dd_square, two_diff, Dd};

/// Tolerance subtracted from the in-circle determinant before the sign
/// test. Points within this band of the circumcircle are treated as
/// outside, which keeps legalization stable on grid-like input.
pub const IN_CIRCLE_BIAS: f64 = 1e-8;

/// Position of a point relative to a directed line through two others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The three points turn clockwise (determinant < 0).
    NEGATIVE,
    /// The three points are collinear (determinant = 0).
    DEGENERATE,
    /// The three points turn counter-clockwise (determinant > 0).
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Signed doubled area of triangle `(a, b, c)`:
/// `(bx - ax)(cy - ay) - (by - ay)(cx - ax)`, evaluated in double-double.
///
/// Positive when `c` lies to the left of the directed line `a -> b`,
/// i.e. when the triangle winds counter-clockwise. The sign of the
/// returned value is exact for finite inputs.
#[inline]
#[must_use]
pub fn orient2d_sign(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> f64 {
    let abx = two_diff(bx, ax);
    let aby = two_diff(by, ay);
    let acx = two_diff(cx, ax);
    let acy = two_diff(cy, ay);
    dd_diff(dd_mul(abx, acy), dd_mul(aby, acx)).hi
}

/// Classifies the turn direction of the point triple `(a, b, c)`.
#[inline]
#[must_use]
pub fn orient2d(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> Orientation {
    let det = orient2d_sign(ax, ay, bx, by, cx, cy);
    if det > 0.0 {
        Orientation::POSITIVE
    } else if det < 0.0 {
        Orientation::NEGATIVE
    } else {
        Orientation::DEGENERATE
    }
}

#[inline]
fn lift(px: f64, py: f64, qx: f64, qy: f64) -> (Dd, Dd, Dd) {
    let dx = two_diff(px, qx);
    let dy = two_diff(py, qy);
    let norm = dd_add(dd_square(dx), dd_square(dy));
    (dx, dy, norm)
}

/// Returns true iff `p` lies strictly inside the circumcircle of the
/// counter-clockwise triangle `(a, b, c)`.
///
/// Evaluated as the lifted 3×3 determinant with all rows translated so
/// `p` sits at the origin; the whole computation runs in double-double,
/// and [`IN_CIRCLE_BIAS`] shifts the boundary slightly toward "outside".
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn in_circle(
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
    cx: f64,
    cy: f64,
    px: f64,
    py: f64,
) -> bool {
    let (dx, dy, ap) = lift(ax, ay, px, py);
    let (ex, ey, bp) = lift(bx, by, px, py);
    let (fx, fy, cp) = lift(cx, cy, px, py);

    // det = dx (ey cp - bp fy) - dy (ex cp - bp fx) + ap (ex fy - ey fx)
    let m0 = dd_diff(dd_mul(ey, cp), dd_mul(bp, fy));
    let m1 = dd_diff(dd_mul(ex, cp), dd_mul(bp, fx));
    let m2 = dd_diff(dd_mul(ex, fy), dd_mul(ey, fx));

    let det = dd_add(dd_diff(dd_mul(dx, m0), dd_mul(dy, m1)), dd_mul(ap, m2));

    // Positive determinant means inside for a CCW triangle.
    det.hi > IN_CIRCLE_BIAS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orient2d_classifies_turns() {
        assert_eq!(
            orient2d(0.0, 0.0, 1.0, 0.0, 0.0, 1.0),
            Orientation::POSITIVE
        );
        assert_eq!(
            orient2d(0.0, 0.0, 0.0, 1.0, 1.0, 0.0),
            Orientation::NEGATIVE
        );
        assert_eq!(
            orient2d(0.0, 0.0, 1.0, 1.0, 2.0, 2.0),
            Orientation::DEGENERATE
        );
    }

    #[test]
    fn orient2d_sign_is_exact_on_adversarial_collinear_input() {
        // Points on the line y = x with coordinates chosen so the naive
        // determinant accumulates rounding error.
        let a = 0.1;
        let b = 0.1 + 3.0 * f64::EPSILON;
        let c = 0.1 + 6.0 * f64::EPSILON;
        assert_eq!(orient2d_sign(a, a, b, b, c, c), 0.0);
    }

    #[test]
    fn orient2d_sign_resolves_tiny_offsets() {
        // Nudge the third point off the diagonal by one ulp; the sign
        // must track the nudge direction.
        let a = 12.5;
        let b = 24.0;
        let c = 18.25;
        let up = c + c * f64::EPSILON;
        let down = c - c * f64::EPSILON;
        assert!(orient2d_sign(a, a, b, b, c, up) > 0.0);
        assert!(orient2d_sign(a, a, b, b, c, down) < 0.0);
    }

    #[test]
    fn in_circle_unit_circle() {
        // CCW triangle inscribed in the unit circle around the origin.
        let (ax, ay) = (1.0, 0.0);
        let (bx, by) = (-0.5, 0.75_f64.sqrt());
        let (cx, cy) = (-0.5, -(0.75_f64.sqrt()));

        assert!(in_circle(ax, ay, bx, by, cx, cy, 0.0, 0.0));
        assert!(in_circle(ax, ay, bx, by, cx, cy, 0.5, 0.5));
        assert!(!in_circle(ax, ay, bx, by, cx, cy, 2.0, 0.0));
        assert!(!in_circle(ax, ay, bx, by, cx, cy, 0.0, -1.5));
    }

    #[test]
    fn in_circle_bias_rejects_cocircular_points() {
        // Fourth corner of a unit square is exactly on the circumcircle
        // of the other three; the bias must classify it as outside.
        assert!(!in_circle(0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn orientation_display() {
        assert_eq!(Orientation::POSITIVE.to_string(), "POSITIVE");
        assert_eq!(Orientation::DEGENERATE.to_string(), "DEGENERATE");
        assert_eq!(Orientation::NEGATIVE.to_string(), "NEGATIVE");
    }
}
