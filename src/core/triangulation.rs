//! Sweep-hull Delaunay triangulator over a flat coordinate buffer.
//!
//! Points are consumed as `[x0, y0, x1, y1, ..]` and the mesh comes back as
//! three parallel index arrays:
//!
//! - `triangles`: vertex indices in runs of three, each triangle wound
//!   counter-clockwise;
//! - `halfedges`: for half-edge `e` (originating at `triangles[e]`, ending
//!   at `triangles[next_halfedge(e)]`), the id of its twin in the adjacent
//!   triangle, or [`EMPTY`] on the convex hull;
//! - `hull`: point indices of the convex hull, counter-clockwise.
//!
//! Construction inserts points in order of distance from the seed triangle's
//! circumcenter, growing a circular advancing hull and legalizing every new
//! edge with the robust in-circle predicate. Collinear and too-small inputs
//! degrade to a hull-only mesh; only malformed buffers are errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::robust_predicates::{in_circle, orient2d_sign};
use crate::geometry::util::{circumcenter, circumradius_sq, dist_sq, pseudo_angle};

/// Sentinel for "no half-edge": hull boundaries and unset slots.
pub const EMPTY: usize = usize::MAX;

/// Two points closer than this per coordinate are treated as one site.
pub const DUPLICATE_EPSILON: f64 = f64::EPSILON * 2.0;

/// Ranges at or below this length are insertion-sorted instead of
/// partitioned further.
const INSERTION_SORT_CUTOFF: usize = 20;

/// Errors for malformed input buffers. Geometric degeneracies (collinear,
/// duplicated, or too few points) are valid terminal states, not errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriangulationError {
    /// The coordinate buffer cannot be split into `(x, y)` pairs.
    #[error("coordinate buffer has odd length {len}, expected x,y pairs")]
    OddCoordinateCount {
        /// Length of the offending buffer.
        len: usize,
    },
    /// A coordinate is NaN or infinite.
    #[error("coordinate at index {index} is not finite ({value})")]
    NonFiniteCoordinate {
        /// Flat index into the coordinate buffer.
        index: usize,
        /// The offending value.
        value: f64,
    },
    /// A clipping rectangle with non-finite or inverted bounds.
    #[error("invalid clip rectangle [{x_min}, {x_max}] x [{y_min}, {y_max}]")]
    InvalidClipRect {
        /// Left edge.
        x_min: f64,
        /// Bottom edge.
        y_min: f64,
        /// Right edge.
        x_max: f64,
        /// Top edge.
        y_max: f64,
    },
}

/// Violations reported by [`Triangulation::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriangulationValidationError {
    /// `halfedges[halfedges[e]] != e` for an interior half-edge.
    #[error("half-edge {edge} and its twin {twin} do not reference each other")]
    AsymmetricHalfEdge {
        /// The half-edge whose twin link is broken.
        edge: usize,
        /// What `halfedges[edge]` currently points at.
        twin: usize,
    },
    /// A triangle is clockwise or degenerate.
    #[error("triangle {triangle} is not counter-clockwise")]
    NotCounterClockwise {
        /// Triangle index (`triangles[3 * triangle..]`).
        triangle: usize,
    },
    /// A vertex lies strictly inside a neighboring triangle's circumcircle.
    #[error("half-edge {edge} violates the Delaunay condition")]
    DelaunayViolation {
        /// The interior half-edge whose quadrilateral is illegal.
        edge: usize,
    },
}

/// Half-edge following `e` within its triangle.
#[inline]
#[must_use]
pub fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

/// Half-edge preceding `e` within its triangle.
#[inline]
#[must_use]
pub fn prev_halfedge(e: usize) -> usize {
    if e % 3 == 0 {
        e + 2
    } else {
        e - 1
    }
}

/// A planar Delaunay mesh in flat-array half-edge form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangulation {
    /// Triangle vertex indices, counter-clockwise triples.
    pub triangles: Vec<usize>,
    /// Twin half-edge ids ([`EMPTY`] on the hull).
    pub halfedges: Vec<usize>,
    /// Convex hull point indices, counter-clockwise.
    pub hull: Vec<usize>,
    /// For each point, one incoming half-edge (an exterior one where the
    /// point is on the hull), or [`EMPTY`] for points absent from the mesh.
    pub inedges: Vec<usize>,
}

impl Triangulation {
    /// Triangulates a flat `[x0, y0, x1, y1, ..]` buffer.
    ///
    /// # Errors
    ///
    /// Fails only on malformed buffers (odd length or non-finite values);
    /// geometrically degenerate inputs produce a hull-only mesh.
    pub fn new(points: &[f64]) -> Result<Self, TriangulationError> {
        validate_coordinates(points)?;
        let n = points.len() / 2;

        let Some((i0, i1, i2)) = find_seed_triangle(points) else {
            return Ok(Self::collinear_fallback(points));
        };
        let (cx, cy) = circumcenter(
            points[2 * i0],
            points[2 * i0 + 1],
            points[2 * i1],
            points[2 * i1 + 1],
            points[2 * i2],
            points[2 * i2 + 1],
        );

        let max_triangles = 2 * n - 5;
        let mut mesh = Self {
            triangles: Vec::with_capacity(max_triangles * 3),
            halfedges: Vec::with_capacity(max_triangles * 3),
            hull: Vec::new(),
            inedges: vec![EMPTY; n],
        };
        mesh.add_triangle(i0, i1, i2, EMPTY, EMPTY, EMPTY);

        // Insertion order: ascending distance from the seed circumcenter,
        // via a permutation array so `points` stays untouched.
        let dists: Vec<f64> = (0..n)
            .map(|i| dist_sq(points[2 * i], points[2 * i + 1], cx, cy))
            .collect();
        let mut ids: Vec<usize> = (0..n).collect();
        sort_by_distance(&mut ids, &dists);

        let mut hull = Hull::new(n, cx, cy, i0, i1, i2, points);
        let mut flip_stack: Vec<usize> = Vec::new();

        let mut xp = f64::NAN;
        let mut yp = f64::NAN;
        for (k, &i) in ids.iter().enumerate() {
            let x = points[2 * i];
            let y = points[2 * i + 1];

            // skip near-duplicates of the previously inserted point
            if k > 0 && (x - xp).abs() <= DUPLICATE_EPSILON && (y - yp).abs() <= DUPLICATE_EPSILON
            {
                continue;
            }
            xp = x;
            yp = y;

            if i == i0 || i == i1 || i == i2 {
                continue;
            }

            let (mut e, walk_back) = hull.find_visible_edge(x, y, points);
            if e == EMPTY {
                // point inside the hull or coincident with it; duplicates
                // land here when the hash walk finds nothing visible
                continue;
            }

            // first triangle over the initially visible edge
            let t = mesh.add_triangle(e, i, hull.next[e], EMPTY, EMPTY, hull.tri[e]);
            hull.tri[i] = mesh.legalize(t + 2, points, &mut hull, &mut flip_stack);
            hull.tri[e] = t;

            // walk forward, fanning over every further visible edge
            let mut w = hull.next[e];
            loop {
                let q = hull.next[w];
                if orient2d_sign(
                    x,
                    y,
                    points[2 * w],
                    points[2 * w + 1],
                    points[2 * q],
                    points[2 * q + 1],
                ) >= 0.0
                {
                    break;
                }
                let t = mesh.add_triangle(w, i, q, hull.tri[i], EMPTY, hull.tri[w]);
                hull.tri[i] = mesh.legalize(t + 2, points, &mut hull, &mut flip_stack);
                hull.next[w] = EMPTY; // w is no longer on the hull
                w = q;
            }

            // walk backward from the initial edge if it started mid-run
            if walk_back {
                loop {
                    let q = hull.prev[e];
                    if orient2d_sign(
                        x,
                        y,
                        points[2 * q],
                        points[2 * q + 1],
                        points[2 * e],
                        points[2 * e + 1],
                    ) >= 0.0
                    {
                        break;
                    }
                    let t = mesh.add_triangle(q, i, e, EMPTY, hull.tri[e], hull.tri[q]);
                    mesh.legalize(t + 2, points, &mut hull, &mut flip_stack);
                    hull.tri[q] = t;
                    hull.next[e] = EMPTY;
                    e = q;
                }
            }

            // splice the new point between e and w
            hull.prev[i] = e;
            hull.next[i] = w;
            hull.prev[w] = i;
            hull.next[e] = i;
            hull.start = e;

            hull.hash_edge(x, y, i);
            hull.hash_edge(points[2 * e], points[2 * e + 1], e);
        }

        // materialize the hull by walking the circular list once
        let mut e = hull.start;
        loop {
            mesh.hull.push(e);
            e = hull.next[e];
            if e == hull.start {
                break;
            }
        }

        mesh.triangles.shrink_to_fit();
        mesh.halfedges.shrink_to_fit();
        mesh.compute_inedges();
        Ok(mesh)
    }

    /// Number of triangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len() / 3
    }

    /// True when the mesh has no triangles (hull-only or empty input).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Checks half-edge symmetry, triangle winding, and the local Delaunay
    /// condition over every interior edge. Intended for tests and debugging;
    /// `points` must be the buffer the mesh was built from.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self, points: &[f64]) -> Result<(), TriangulationValidationError> {
        for e in 0..self.halfedges.len() {
            let t = self.halfedges[e];
            if t != EMPTY && self.halfedges[t] != e {
                return Err(TriangulationValidationError::AsymmetricHalfEdge { edge: e, twin: t });
            }
        }

        let p = |i: usize| (points[2 * i], points[2 * i + 1]);
        for t in 0..self.len() {
            let (ax, ay) = p(self.triangles[3 * t]);
            let (bx, by) = p(self.triangles[3 * t + 1]);
            let (cx, cy) = p(self.triangles[3 * t + 2]);
            if orient2d_sign(ax, ay, bx, by, cx, cy) <= 0.0 {
                return Err(TriangulationValidationError::NotCounterClockwise { triangle: t });
            }
        }

        for e in 0..self.halfedges.len() {
            let twin = self.halfedges[e];
            if twin == EMPTY {
                continue;
            }
            let (ax, ay) = p(self.triangles[e]);
            let (bx, by) = p(self.triangles[next_halfedge(e)]);
            let (cx, cy) = p(self.triangles[prev_halfedge(e)]);
            let (px, py) = p(self.triangles[prev_halfedge(twin)]);
            if in_circle(ax, ay, bx, by, cx, cy, px, py) {
                return Err(TriangulationValidationError::DelaunayViolation { edge: e });
            }
        }
        Ok(())
    }

    /// Hull-only result for collinear or too-small inputs: indices sorted
    /// along the dominant axis, near-duplicates dropped.
    fn collinear_fallback(points: &[f64]) -> Self {
        let n = points.len() / 2;
        let mut ids: Vec<usize> = (0..n).collect();
        ids.sort_unstable_by(|&a, &b| {
            (points[2 * a], points[2 * a + 1])
                .partial_cmp(&(points[2 * b], points[2 * b + 1]))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut hull = Vec::with_capacity(n);
        let mut xp = f64::NAN;
        let mut yp = f64::NAN;
        for &i in &ids {
            let x = points[2 * i];
            let y = points[2 * i + 1];
            // the NaN seed fails both comparisons, so the first point
            // always lands
            if (x - xp).abs() <= DUPLICATE_EPSILON && (y - yp).abs() <= DUPLICATE_EPSILON {
                continue;
            }
            hull.push(i);
            xp = x;
            yp = y;
        }

        Self {
            triangles: Vec::new(),
            halfedges: Vec::new(),
            hull,
            inedges: vec![EMPTY; n],
        }
    }

    fn add_triangle(&mut self, i0: usize, i1: usize, i2: usize, a: usize, b: usize, c: usize) -> usize {
        let t = self.triangles.len();

        self.triangles.extend([i0, i1, i2]);
        self.halfedges.extend([a, b, c]);

        if a != EMPTY {
            self.halfedges[a] = t;
        }
        if b != EMPTY {
            self.halfedges[b] = t + 1;
        }
        if c != EMPTY {
            self.halfedges[c] = t + 2;
        }
        t
    }

    fn link(&mut self, a: usize, b: usize) {
        if a != EMPTY {
            self.halfedges[a] = b;
        }
        if b != EMPTY {
            self.halfedges[b] = a;
        }
    }

    /// Restores the local Delaunay condition around half-edge `a` by edge
    /// flips, propagating through the mesh via an explicit growable stack
    /// (adversarial inputs would overflow the call stack, and a capped
    /// stack would silently leave illegal edges behind).
    ///
    /// Returns a half-edge originating at the newly inserted point that is
    /// still on the advancing hull, for use as its `hull.tri` entry.
    fn legalize(
        &mut self,
        a: usize,
        points: &[f64],
        hull: &mut Hull,
        stack: &mut Vec<usize>,
    ) -> usize {
        stack.clear();
        let mut a = a;
        let mut ar;

        loop {
            let b = self.halfedges[a];
            // ar must track the current edge even when `a` turns out to be
            // a hull edge: it is the return value the caller stores into
            // the advancing hull
            ar = prev_halfedge(a);
            if b == EMPTY {
                match stack.pop() {
                    Some(e) => {
                        a = e;
                        continue;
                    }
                    None => break,
                }
            }

            let al = next_halfedge(a);
            let bl = prev_halfedge(b);
            let br = next_halfedge(b);

            let p0 = self.triangles[ar];
            let pr = self.triangles[a];
            let pl = self.triangles[al];
            let p1 = self.triangles[bl];

            let illegal = in_circle(
                points[2 * p0],
                points[2 * p0 + 1],
                points[2 * pr],
                points[2 * pr + 1],
                points[2 * pl],
                points[2 * pl + 1],
                points[2 * p1],
                points[2 * p1 + 1],
            );
            if illegal {
                self.triangles[a] = p1;
                self.triangles[b] = p0;

                let hbl = self.halfedges[bl];
                // the flipped edge was on the advancing hull: repoint the
                // hull's triangle reference before relinking
                if hbl == EMPTY {
                    hull.fix_tri(bl, a);
                }

                let har = self.halfedges[ar];
                self.link(a, hbl);
                self.link(b, har);
                self.link(ar, bl);

                stack.push(br);
                // re-check `a` itself against its new neighbor
            } else {
                match stack.pop() {
                    Some(e) => {
                        a = e;
                        continue;
                    }
                    None => break,
                }
            }
        }
        ar
    }

    /// One incoming half-edge per point, preferring exterior edges so a
    /// rotation started there covers the full neighborhood of hull points.
    fn compute_inedges(&mut self) {
        for e in 0..self.halfedges.len() {
            let p = self.triangles[next_halfedge(e)];
            if self.halfedges[e] == EMPTY || self.inedges[p] == EMPTY {
                self.inedges[p] = e;
            }
        }
    }
}

fn validate_coordinates(points: &[f64]) -> Result<(), TriangulationError> {
    if points.len() % 2 != 0 {
        return Err(TriangulationError::OddCoordinateCount { len: points.len() });
    }
    for (index, &value) in points.iter().enumerate() {
        if !value.is_finite() {
            return Err(TriangulationError::NonFiniteCoordinate { index, value });
        }
    }
    Ok(())
}

/// Picks the seed triangle: the point nearest the bounding-box center, its
/// nearest neighbor, and the third point minimizing the circumradius,
/// reordered counter-clockwise. `None` when every choice is collinear or
/// there are fewer than three distinct points.
fn find_seed_triangle(points: &[f64]) -> Option<(usize, usize, usize)> {
    let n = points.len() / 2;
    if n < 3 {
        return None;
    }

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for i in 0..n {
        min_x = min_x.min(points[2 * i]);
        max_x = max_x.max(points[2 * i]);
        min_y = min_y.min(points[2 * i + 1]);
        max_y = max_y.max(points[2 * i + 1]);
    }
    let bx = (min_x + max_x) / 2.0;
    let by = (min_y + max_y) / 2.0;

    // seed: closest to the bounding-box center
    let mut i0 = 0;
    let mut min_dist = f64::INFINITY;
    for i in 0..n {
        let d = dist_sq(points[2 * i], points[2 * i + 1], bx, by);
        if d < min_dist {
            i0 = i;
            min_dist = d;
        }
    }
    let (x0, y0) = (points[2 * i0], points[2 * i0 + 1]);

    // closest distinct point to the seed
    let mut i1 = 0;
    min_dist = f64::INFINITY;
    for i in 0..n {
        if i == i0 {
            continue;
        }
        let d = dist_sq(points[2 * i], points[2 * i + 1], x0, y0);
        if d > 0.0 && d < min_dist {
            i1 = i;
            min_dist = d;
        }
    }
    if min_dist == f64::INFINITY {
        return None;
    }
    let (x1, y1) = (points[2 * i1], points[2 * i1 + 1]);

    // third point forming the smallest circumcircle with the first two
    let mut i2 = 0;
    let mut min_radius = f64::INFINITY;
    for i in 0..n {
        if i == i0 || i == i1 {
            continue;
        }
        let r = circumradius_sq(x0, y0, x1, y1, points[2 * i], points[2 * i + 1]);
        if r < min_radius {
            i2 = i;
            min_radius = r;
        }
    }
    if min_radius == f64::INFINITY {
        return None;
    }

    let (x2, y2) = (points[2 * i2], points[2 * i2 + 1]);
    if orient2d_sign(x0, y0, x1, y1, x2, y2) < 0.0 {
        Some((i0, i2, i1))
    } else {
        Some((i0, i1, i2))
    }
}

/// Sorts the permutation `ids` ascending by `dists[id]` with a dual-pivot
/// quicksort, falling back to insertion sort on short ranges.
fn sort_by_distance(ids: &mut [usize], dists: &[f64]) {
    if !ids.is_empty() {
        quicksort(ids, dists, 0, ids.len() - 1);
    }
}

fn quicksort(ids: &mut [usize], dists: &[f64], left: usize, right: usize) {
    if right - left <= INSERTION_SORT_CUTOFF {
        for i in left + 1..=right {
            let id = ids[i];
            let d = dists[id];
            let mut j = i;
            while j > left && dists[ids[j - 1]] > d {
                ids[j] = ids[j - 1];
                j -= 1;
            }
            ids[j] = id;
        }
        return;
    }

    // pivots from the outer thirds of the range
    let third = (right - left) / 3;
    ids.swap(left, left + third);
    ids.swap(right, right - third);
    if dists[ids[left]] > dists[ids[right]] {
        ids.swap(left, right);
    }
    let p = dists[ids[left]];
    let q = dists[ids[right]];

    let mut lt = left + 1;
    let mut gt = right - 1;
    let mut k = left + 1;
    while k <= gt {
        if dists[ids[k]] < p {
            ids.swap(k, lt);
            lt += 1;
        } else if dists[ids[k]] > q {
            while dists[ids[gt]] > q && k < gt {
                gt -= 1;
            }
            ids.swap(k, gt);
            gt -= 1;
            if dists[ids[k]] < p {
                ids.swap(k, lt);
                lt += 1;
            }
        }
        k += 1;
    }
    ids.swap(left, lt - 1);
    ids.swap(right, gt + 1);

    if lt >= left + 2 {
        quicksort(ids, dists, left, lt - 2);
    }
    if gt >= lt {
        quicksort(ids, dists, lt, gt);
    }
    if gt + 2 <= right {
        quicksort(ids, dists, gt + 2, right);
    }
}

/// Circular advancing hull: successor/predecessor point per hull point, the
/// interior half-edge leaving each hull point, and an angular hash giving an
/// approximate starting point for the visible-edge search.
struct Hull {
    prev: Vec<usize>,
    next: Vec<usize>,
    tri: Vec<usize>,
    hash: Vec<usize>,
    start: usize,
    center_x: f64,
    center_y: f64,
}

impl Hull {
    fn new(
        n: usize,
        center_x: f64,
        center_y: f64,
        i0: usize,
        i1: usize,
        i2: usize,
        points: &[f64],
    ) -> Self {
        let hash_len = (n as f64).sqrt().ceil() as usize;
        let mut hull = Self {
            prev: vec![0; n],
            next: vec![0; n],
            tri: vec![0; n],
            hash: vec![EMPTY; hash_len],
            start: i0,
            center_x,
            center_y,
        };

        hull.next[i0] = i1;
        hull.prev[i2] = i1;
        hull.next[i1] = i2;
        hull.prev[i0] = i2;
        hull.next[i2] = i0;
        hull.prev[i1] = i0;

        hull.tri[i0] = 0;
        hull.tri[i1] = 1;
        hull.tri[i2] = 2;

        hull.hash_edge(points[2 * i0], points[2 * i0 + 1], i0);
        hull.hash_edge(points[2 * i1], points[2 * i1 + 1], i1);
        hull.hash_edge(points[2 * i2], points[2 * i2 + 1], i2);

        hull
    }

    fn hash_key(&self, x: f64, y: f64) -> usize {
        let angle = pseudo_angle(x - self.center_x, y - self.center_y);
        let len = self.hash.len();
        ((len as f64 * angle).floor() as usize) % len
    }

    fn hash_edge(&mut self, x: f64, y: f64, i: usize) {
        let key = self.hash_key(x, y);
        self.hash[key] = i;
    }

    /// Starts from the hash bucket nearest the new point's angle, backs up
    /// one hull position, then walks forward to the first edge the point is
    /// strictly right of (for a counter-clockwise hull, "right of an edge"
    /// is the outside, so that edge is visible from the point).
    ///
    /// Returns `(EMPTY, _)` when no edge is visible (interior duplicates),
    /// and a flag telling the caller whether the walk must also look
    /// backward from the returned edge.
    fn find_visible_edge(&self, x: f64, y: f64, points: &[f64]) -> (usize, bool) {
        let mut start = 0;
        let key = self.hash_key(x, y);
        let len = self.hash.len();
        for j in 0..len {
            start = self.hash[(key + j) % len];
            if start != EMPTY && self.next[start] != EMPTY {
                break;
            }
        }
        start = self.prev[start];

        let mut e = start;
        loop {
            let n = self.next[e];
            if orient2d_sign(
                x,
                y,
                points[2 * e],
                points[2 * e + 1],
                points[2 * n],
                points[2 * n + 1],
            ) < 0.0
            {
                break;
            }
            e = n;
            if e == start {
                return (EMPTY, false);
            }
        }
        (e, e == start)
    }

    /// Replaces a stale `tri` entry after a flip removed the half-edge it
    /// referenced from the boundary. Walks the `prev` chain: mid-insertion
    /// the `next` chain has holes where consumed points were unlinked.
    fn fix_tri(&mut self, old: usize, new: usize) {
        let mut e = self.start;
        loop {
            if self.tri[e] == old {
                self.tri[e] = new;
                break;
            }
            e = self.prev[e];
            if e == self.start {
                break;
            }
        }
    }
}
