//! High-level Delaunay facade over the flat half-edge mesh.
//!
//! Owns the coordinate buffer and the [`Triangulation`], and adds the query
//! surface consumers actually use: nearest-site point location via a greedy
//! walk, lazy neighbor enumeration, and a one-shot jitter-and-rebuild
//! fallback when the whole input turns out to be collinear.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::triangulation::{
    next_halfedge, Triangulation, TriangulationError, EMPTY,
};
use crate::geometry::util::dist_sq;

/// Scale factor for the deterministic jitter applied to collinear input,
/// relative to the point cloud's extent.
pub const COLLINEAR_JITTER: f64 = 1e-8;

/// Triangles whose doubled area is at or below this are treated as flat
/// when deciding whether the whole mesh degenerated.
const COLLINEAR_THRESHOLD: f64 = 1e-10;

/// A Delaunay triangulation with point-location and adjacency queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delaunay {
    points: Vec<f64>,
    triangulation: Triangulation,
    /// Position of each point within `triangulation.hull`, or [`EMPTY`].
    hull_index: Vec<usize>,
    /// Set when the input was collinear: the point indices ordered along
    /// the shared line. The mesh itself is built from jittered coordinates.
    collinear: Option<Vec<usize>>,
}

impl Delaunay {
    /// Builds the triangulation from a flat `[x0, y0, x1, y1, ..]` buffer.
    ///
    /// # Errors
    ///
    /// Fails on odd-length buffers and non-finite coordinates.
    pub fn new(points: Vec<f64>) -> Result<Self, TriangulationError> {
        let triangulation = Triangulation::new(&points)?;
        let mut delaunay = Self {
            points,
            triangulation,
            hull_index: Vec::new(),
            collinear: None,
        };
        delaunay.init()?;
        Ok(delaunay)
    }

    /// Convenience constructor from `(x, y)` pairs.
    ///
    /// # Errors
    ///
    /// Fails on non-finite coordinates.
    pub fn from_points(points: &[[f64; 2]]) -> Result<Self, TriangulationError> {
        Self::new(points.iter().flat_map(|p| [p[0], p[1]]).collect())
    }

    /// The flat coordinate buffer.
    #[must_use]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Mutable access to the coordinates; call [`Self::update`] afterwards
    /// to rebuild the mesh.
    pub fn points_mut(&mut self) -> &mut [f64] {
        &mut self.points
    }

    /// The underlying half-edge mesh.
    #[must_use]
    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    /// Number of input points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len() / 2
    }

    /// True when the input collapsed to a line and the mesh was rebuilt
    /// from jittered coordinates.
    #[must_use]
    pub fn is_collinear(&self) -> bool {
        self.collinear.is_some()
    }

    /// Rebuilds the mesh from the current coordinates after external
    /// mutation through [`Self::points_mut`].
    ///
    /// # Errors
    ///
    /// Fails if the mutated buffer contains non-finite values.
    pub fn update(&mut self) -> Result<(), TriangulationError> {
        self.collinear = None;
        self.triangulation = Triangulation::new(&self.points)?;
        self.init()
    }

    /// Index of the point nearest to `(x, y)`, walking greedily from
    /// `hint` (clamped to a valid index). `None` for empty inputs or a
    /// non-finite query point.
    #[must_use]
    pub fn find(&self, x: f64, y: f64, hint: usize) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let n = self.num_points();
        if n == 0 {
            return None;
        }
        if self.triangulation.is_empty() {
            // hull-only mesh (too few distinct points): scan
            return (0..n).min_by(|&a, &b| {
                let da = dist_sq(self.points[2 * a], self.points[2 * a + 1], x, y);
                let db = dist_sq(self.points[2 * b], self.points[2 * b + 1], x, y);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let i0 = hint.min(n - 1);
        let mut i = i0;
        loop {
            let c = self.step(i, x, y);
            if c == i || c == i0 {
                return Some(c);
            }
            i = c;
        }
    }

    /// One greedy step from site `i` toward `(x, y)`: the neighbor of `i`
    /// (including, at the hull boundary, the next hull point) strictly
    /// closer to the query, or `i` itself at a local optimum. Exact on a
    /// Delaunay mesh, where the local optimum is the global one.
    pub(crate) fn step(&self, i: usize, x: f64, y: f64) -> usize {
        let t = &self.triangulation;
        let n = self.num_points();
        if t.inedges[i] == EMPTY {
            // point absent from the mesh (duplicate); move on so the walk
            // can escape to a real site
            return (i + 1) % n;
        }

        let mut c = i;
        let mut dc = dist_sq(self.points[2 * i], self.points[2 * i + 1], x, y);
        let e0 = t.inedges[i];
        let mut e = e0;
        loop {
            let cand = t.triangles[e];
            let dt = dist_sq(self.points[2 * cand], self.points[2 * cand + 1], x, y);
            if dt < dc {
                dc = dt;
                c = cand;
            }
            let en = next_halfedge(e);
            if t.triangles[en] != i {
                break; // inconsistent mesh; bail out of the rotation
            }
            e = t.halfedges[en];
            if e == EMPTY {
                // hull boundary: also consider the next hull point, which
                // the rotation cannot reach
                let p = t.hull[(self.hull_index[i] + 1) % t.hull.len()];
                if p != cand
                    && dist_sq(self.points[2 * p], self.points[2 * p + 1], x, y) < dc
                {
                    return p;
                }
                break;
            }
            if e == e0 {
                break;
            }
        }
        c
    }

    /// Iterates over the point indices adjacent to `i`.
    ///
    /// For collinear inputs this is the one or two chain neighbors along
    /// the line; otherwise the mesh neighbors, starting from the incoming
    /// half-edge and rotating until wrap-around or the hull boundary.
    #[must_use]
    pub fn neighbors(&self, i: usize) -> Neighbors<'_> {
        if let Some(order) = &self.collinear {
            let at = order.iter().position(|&p| p == i);
            let (prev, next) = match at {
                Some(k) => (
                    k.checked_sub(1).map(|k| order[k]),
                    order.get(k + 1).copied(),
                ),
                None => (None, None),
            };
            return Neighbors {
                delaunay: self,
                state: NeighborsState::Chain { prev, next },
            };
        }

        let e0 = self.triangulation.inedges[i];
        let state = if e0 == EMPTY {
            NeighborsState::Done // coincident or absent point
        } else {
            NeighborsState::Rotating { i, e0, e: e0 }
        };
        Neighbors {
            delaunay: self,
            state,
        }
    }

    fn init(&mut self) -> Result<(), TriangulationError> {
        if self.triangulation.hull.len() > 2 && self.is_mesh_flat() {
            self.rebuild_with_jitter()?;
        }

        let n = self.num_points();
        self.hull_index = vec![EMPTY; n];
        for (k, &p) in self.triangulation.hull.iter().enumerate() {
            self.hull_index[p] = k;
        }
        Ok(())
    }

    /// True when every triangle's doubled area is below the collinearity
    /// threshold (vacuously true for hull-only meshes).
    fn is_mesh_flat(&self) -> bool {
        let t = &self.triangulation.triangles;
        for tri in t.chunks_exact(3) {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            let cross = (self.points[2 * c] - self.points[2 * a])
                * (self.points[2 * b + 1] - self.points[2 * a + 1])
                - (self.points[2 * b] - self.points[2 * a])
                    * (self.points[2 * c + 1] - self.points[2 * a + 1]);
            if cross.abs() > COLLINEAR_THRESHOLD {
                return false;
            }
        }
        true
    }

    /// Records the collinear order, perturbs every coordinate by a tiny
    /// deterministic amount, and reruns the triangulator once.
    fn rebuild_with_jitter(&mut self) -> Result<(), TriangulationError> {
        let n = self.num_points();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_unstable_by(|&a, &b| {
            (self.points[2 * a], self.points[2 * a + 1])
                .partial_cmp(&(self.points[2 * b], self.points[2 * b + 1]))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let first = order[0];
        let last = order[n - 1];
        let span_x = self.points[2 * last] - self.points[2 * first];
        let span_y = self.points[2 * last + 1] - self.points[2 * first + 1];
        let r = COLLINEAR_JITTER * span_x.hypot(span_y);

        warn!(
            points = n,
            jitter = r,
            "input points are collinear; jittering coordinates and retriangulating"
        );

        for i in 0..n {
            let x = self.points[2 * i];
            let y = self.points[2 * i + 1];
            self.points[2 * i] = x + (x + y).sin() * r;
            self.points[2 * i + 1] = y + (x - y).cos() * r;
        }

        self.triangulation = Triangulation::new(&self.points)?;
        self.collinear = Some(order);
        Ok(())
    }
}

enum NeighborsState {
    /// Collinear input: at most two neighbors along the chain.
    Chain {
        prev: Option<usize>,
        next: Option<usize>,
    },
    /// Rotating around the incoming half-edges of point `i`.
    Rotating { i: usize, e0: usize, e: usize },
    /// Hull boundary reached: one final successor to emit.
    HullTail { pending: usize },
    Done,
}

/// Lazy iterator over the neighbors of one point; see
/// [`Delaunay::neighbors`].
pub struct Neighbors<'a> {
    delaunay: &'a Delaunay,
    state: NeighborsState,
}

impl Iterator for Neighbors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self.state {
            NeighborsState::Chain { prev, next } => {
                if let Some(p) = prev {
                    self.state = NeighborsState::Chain { prev: None, next };
                    Some(p)
                } else if let Some(q) = next {
                    self.state = NeighborsState::Done;
                    Some(q)
                } else {
                    self.state = NeighborsState::Done;
                    None
                }
            }
            NeighborsState::Rotating { i, e0, e } => {
                let t = self.delaunay.triangulation();
                let yielded = t.triangles[e];

                let en = next_halfedge(e);
                if t.triangles[en] != i {
                    self.state = NeighborsState::Done;
                    return Some(yielded);
                }
                let twin = t.halfedges[en];
                if twin == EMPTY {
                    // the rotation stops at the hull; the successor hull
                    // point is a neighbor the edge walk cannot reach
                    let p = t.hull
                        [(self.delaunay.hull_index[i] + 1) % t.hull.len()];
                    self.state = if p == yielded {
                        NeighborsState::Done
                    } else {
                        NeighborsState::HullTail { pending: p }
                    };
                } else if twin == e0 {
                    self.state = NeighborsState::Done;
                } else {
                    self.state = NeighborsState::Rotating { i, e0, e: twin };
                }
                Some(yielded)
            }
            NeighborsState::HullTail { pending, .. } => {
                self.state = NeighborsState::Done;
                Some(pending)
            }
            NeighborsState::Done => None,
        }
    }
}
