//! Shared geometric helpers for the triangulator and Voronoi builder.
//!
//! These are deliberately plain `f64` routines: they feed heuristics
//! (seed selection, insertion order, the hull hash) where a rounded
//! result steers performance, never correctness. Every decision that
//! affects mesh topology goes through
//! [`robust_predicates`](crate::geometry::robust_predicates) instead.

/// Squared Euclidean distance between `(ax, ay)` and `(bx, by)`.
#[inline]
#[must_use]
pub fn dist_sq(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}

/// Offset from `(ax, ay)` to the circumcenter of triangle `(a, b, c)`.
///
/// Returns non-finite components when the triangle is degenerate
/// (collinear vertices); callers treat that as "no circumcircle".
#[inline]
#[must_use]
pub fn circumdelta(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> (f64, f64) {
    let dx = bx - ax;
    let dy = by - ay;
    let ex = cx - ax;
    let ey = cy - ay;

    let bl = dx * dx + dy * dy;
    let cl = ex * ex + ey * ey;
    let d = 0.5 / (dx * ey - dy * ex);

    ((ey * bl - dy * cl) * d, (dx * cl - ex * bl) * d)
}

/// Squared circumradius of triangle `(a, b, c)`; infinite or NaN when
/// the vertices are collinear.
#[inline]
#[must_use]
pub fn circumradius_sq(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> f64 {
    let (x, y) = circumdelta(ax, ay, bx, by, cx, cy);
    x * x + y * y
}

/// Circumcenter of triangle `(a, b, c)`.
#[inline]
#[must_use]
pub fn circumcenter(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> (f64, f64) {
    let (x, y) = circumdelta(ax, ay, bx, by, cx, cy);
    (ax + x, ay + y)
}

/// Monotonic substitute for `atan2(dy, dx)`: maps a direction to
/// `[0, 1)`, increasing clockwise starting from due west, without
/// trigonometry. Only the relative order matters; it keys the hull
/// hash buckets.
#[inline]
#[must_use]
pub fn pseudo_angle(dx: f64, dy: f64) -> f64 {
    let p = dx / (dx.abs() + dy.abs());
    if dy < 0.0 {
        (3.0 - p) / 4.0
    } else {
        (1.0 + p) / 4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn dist_sq_basic() {
        assert_relative_eq!(dist_sq(0.0, 0.0, 3.0, 4.0), 25.0);
        assert_relative_eq!(dist_sq(-1.0, -1.0, -1.0, -1.0), 0.0);
    }

    #[test]
    fn circumcenter_of_right_triangle_is_hypotenuse_midpoint() {
        let (x, y) = circumcenter(0.0, 0.0, 2.0, 0.0, 0.0, 2.0);
        assert_relative_eq!(x, 1.0);
        assert_relative_eq!(y, 1.0);
        assert_relative_eq!(circumradius_sq(0.0, 0.0, 2.0, 0.0, 0.0, 2.0), 2.0);
    }

    #[test]
    fn circumcenter_is_vertex_order_independent() {
        let a = circumcenter(1.0, 2.0, 4.0, -1.0, 3.0, 5.0);
        let b = circumcenter(3.0, 5.0, 1.0, 2.0, 4.0, -1.0);
        assert_relative_eq!(a.0, b.0, max_relative = 1e-12);
        assert_relative_eq!(a.1, b.1, max_relative = 1e-12);
    }

    #[test]
    fn degenerate_triangle_has_no_finite_circumradius() {
        let r = circumradius_sq(0.0, 0.0, 1.0, 1.0, 2.0, 2.0);
        assert!(!r.is_finite() || r.is_nan());
    }

    #[test]
    fn pseudo_angle_orders_directions_clockwise_from_west() {
        let west = pseudo_angle(-1.0, 0.0);
        let north = pseudo_angle(0.0, 1.0);
        let ne = pseudo_angle(1.0, 1.0);
        let east = pseudo_angle(1.0, 0.0);
        let south = pseudo_angle(0.0, -1.0);
        let sw = pseudo_angle(-1.0, -1.0);
        assert!(west < north && north < ne && ne < east && east < south && south < sw);
        for v in [west, north, ne, east, south, sw] {
            assert!((0.0..1.0).contains(&v));
        }
    }
}
