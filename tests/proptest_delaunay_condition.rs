//! Property-based tests for the core triangulation guarantees.
//!
//! - Empty circumcircle condition (no point strictly inside any triangle's
//!   circumcircle, modulo the documented bias)
//! - Half-edge symmetry (`halfedges[halfedges[e]] == e`)
//! - Euler triangle count (`2n - h - 2` for non-degenerate input)
//! - Hull convexity (consistent counter-clockwise turns)
//! - Collinear fallback (empty mesh, hull sorted along the line)
//! - Point location agrees with brute-force nearest search

use delaunay2d::core::delaunay::Delaunay;
use delaunay2d::core::triangulation::{Triangulation, EMPTY};
use delaunay2d::geometry::robust_predicates::{in_circle, orient2d, Orientation};
use delaunay2d::geometry::util::dist_sq;
use proptest::prelude::*;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

fn finite_coordinate() -> impl Strategy<Value = f64> {
    (-100.0..100.0).prop_filter("must be finite", |x: &f64| x.is_finite())
}

fn point_cloud(max: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((finite_coordinate(), finite_coordinate()), 3..max)
        .prop_map(dedup_points)
}

/// Drop points closer than a coarse spacing to an earlier point, so the
/// generated clouds stay clear of the triangulator's duplicate skip and of
/// near-degenerate slivers that would only test float noise.
fn dedup_points(points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let mut unique: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    'outer: for p in points {
        for u in &unique {
            if dist_sq(p.0, p.1, u.0, u.1) < 1e-12 {
                continue 'outer;
            }
        }
        unique.push(p);
    }
    unique
}

fn flatten(points: &[(f64, f64)]) -> Vec<f64> {
    points.iter().flat_map(|&(x, y)| [x, y]).collect()
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Property: no point lies strictly inside any triangle's circumcircle.
    ///
    /// This is the global Delaunay condition, checked with the same robust
    /// biased predicate the builder legalizes with.
    #[test]
    fn prop_empty_circumcircle(points in point_cloud(96)) {
        let flat = flatten(&points);
        let t = Triangulation::new(&flat).unwrap();

        for tri in t.triangles.chunks_exact(3) {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            for p in 0..points.len() {
                if p == a || p == b || p == c {
                    continue;
                }
                prop_assert!(
                    !in_circle(
                        flat[2 * a], flat[2 * a + 1],
                        flat[2 * b], flat[2 * b + 1],
                        flat[2 * c], flat[2 * c + 1],
                        flat[2 * p], flat[2 * p + 1],
                    ),
                    "point {p} is inside the circumcircle of ({a}, {b}, {c})"
                );
            }
        }
    }

    /// Property: every interior half-edge references a twin that references
    /// it back, and the twins live in different triangles.
    #[test]
    fn prop_halfedge_symmetry(points in point_cloud(128)) {
        let flat = flatten(&points);
        let t = Triangulation::new(&flat).unwrap();

        for e in 0..t.halfedges.len() {
            let twin = t.halfedges[e];
            if twin == EMPTY {
                continue;
            }
            prop_assert_eq!(t.halfedges[twin], e);
            prop_assert_ne!(e / 3, twin / 3);
        }
    }

    /// Property: for a non-degenerate cloud of `n` points with `h` hull
    /// points, the mesh holds exactly `2n - h - 2` triangles.
    #[test]
    fn prop_euler_triangle_count(points in point_cloud(128)) {
        let flat = flatten(&points);
        let t = Triangulation::new(&flat).unwrap();
        prop_assume!(!t.is_empty());

        let n = points.len();
        let h = t.hull.len();
        prop_assert_eq!(t.len(), 2 * n - h - 2);
    }

    /// Property: consecutive hull points never turn clockwise.
    #[test]
    fn prop_hull_is_convex_counter_clockwise(points in point_cloud(128)) {
        let flat = flatten(&points);
        let t = Triangulation::new(&flat).unwrap();
        prop_assume!(!t.is_empty());

        let h = t.hull.len();
        for k in 0..h {
            let a = t.hull[k];
            let b = t.hull[(k + 1) % h];
            let c = t.hull[(k + 2) % h];
            prop_assert_ne!(
                orient2d(
                    flat[2 * a], flat[2 * a + 1],
                    flat[2 * b], flat[2 * b + 1],
                    flat[2 * c], flat[2 * c + 1],
                ),
                Orientation::NEGATIVE,
                "hull turns clockwise at point {}", b
            );
        }
    }

    /// Property: the builder's own validation accepts every mesh it builds.
    #[test]
    fn prop_validation_accepts_built_meshes(points in point_cloud(128)) {
        let flat = flatten(&points);
        let t = Triangulation::new(&flat).unwrap();
        prop_assert!(t.validate(&flat).is_ok());
    }

    /// Property: exactly horizontal input yields no triangles and a hull
    /// sorted along the line.
    #[test]
    fn prop_collinear_fallback_sorts_along_the_line(
        xs in prop::collection::vec(finite_coordinate(), 3..20),
        y in finite_coordinate(),
    ) {
        let points: Vec<(f64, f64)> =
            dedup_points(xs.into_iter().map(|x| (x, y)).collect());
        prop_assume!(points.len() >= 3);
        let flat = flatten(&points);
        let t = Triangulation::new(&flat).unwrap();

        prop_assert!(t.triangles.is_empty());
        prop_assert!(t.halfedges.is_empty());

        let mut expected: Vec<usize> = (0..points.len()).collect();
        expected.sort_by(|&a, &b| points[a].0.total_cmp(&points[b].0));
        prop_assert_eq!(&t.hull, &expected);
    }

    /// Property: the greedy walk lands on the true nearest site, from any
    /// hint.
    #[test]
    fn prop_find_matches_brute_force_nearest(
        points in point_cloud(32),
        qx in -120.0..120.0f64,
        qy in -120.0..120.0f64,
        hint_seed in 0usize..1000,
    ) {
        let d = Delaunay::new(flatten(&points)).unwrap();
        prop_assume!(!d.triangulation().is_empty());
        // jittered collinear input would drift from the original coordinates
        prop_assume!(!d.is_collinear());

        let hint = hint_seed % points.len();
        let found = d.find(qx, qy, hint).unwrap();

        let best = (0..points.len())
            .map(|i| dist_sq(points[i].0, points[i].1, qx, qy))
            .fold(f64::INFINITY, f64::min);
        let found_dist = dist_sq(points[found].0, points[found].1, qx, qy);
        // allow exact ties for equidistant sites
        prop_assert!(
            found_dist <= best + 1e-9,
            "find returned site {found} at {found_dist}, nearest is {best}"
        );
    }
}
