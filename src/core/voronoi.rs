//! Voronoi cell construction and rectangle clipping.
//!
//! The diagram is derived from a [`Delaunay`] mesh: each Voronoi vertex is a
//! triangle circumcenter, each cell is the chain of circumcenters around a
//! site, and cells of hull sites are closed by projecting outward rays to
//! the clip rectangle. Clipping is Cohen-Sutherland style over 4-bit region
//! codes, with rectangle corners spliced in only when the site actually
//! owns them.
//!
//! Cell polygons come back as flat `[x0, y0, x1, y1, ..]` rings wound
//! clockwise; callers needing counter-clockwise output can reverse pairs.

use serde::{Deserialize, Serialize};

use crate::core::delaunay::Delaunay;
use crate::core::triangulation::{next_halfedge, TriangulationError, EMPTY};

/// Triangles whose doubled area is below this get the far-point
/// circumcenter fallback instead of the exact solve.
const DEGENERATE_AREA: f64 = 1e-9;

/// Distance used for the pseudo-circumcenter of a degenerate triangle.
const FAR_CIRCUMCENTER: f64 = 1e9;

const LEFT: u8 = 0b0001;
const RIGHT: u8 = 0b0010;
const BOTTOM: u8 = 0b0100;
const TOP: u8 = 0b1000;

/// An axis-aligned clipping rectangle, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRect {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl ClipRect {
    /// Creates a rectangle spanning `[x_min, x_max] x [y_min, y_max]`.
    ///
    /// # Errors
    ///
    /// Fails when a bound is non-finite or the rectangle is inverted or
    /// empty.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Self, TriangulationError> {
        if !(x_min.is_finite() && y_min.is_finite() && x_max.is_finite() && y_max.is_finite())
            || x_min >= x_max
            || y_min >= y_max
        {
            return Err(TriangulationError::InvalidClipRect {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Left edge.
    #[must_use]
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Bottom edge.
    #[must_use]
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// Right edge.
    #[must_use]
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Top edge.
    #[must_use]
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Rectangle area.
    #[must_use]
    pub fn area(&self) -> f64 {
        (self.x_max - self.x_min) * (self.y_max - self.y_min)
    }

    /// The full rectangle as a clockwise flat polygon ring.
    fn as_polygon(&self) -> Vec<f64> {
        vec![
            self.x_min, self.y_max, self.x_max, self.y_max, self.x_max, self.y_min, self.x_min,
            self.y_min,
        ]
    }
}

/// Voronoi diagram of a Delaunay mesh, clipped to a rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voronoi {
    delaunay: Delaunay,
    rect: ClipRect,
    /// One `(x, y)` per triangle.
    circumcenters: Vec<f64>,
    /// Four slots per point: the outward ray directions of the first and
    /// last Voronoi edge of a hull site (all zero for interior sites).
    vectors: Vec<f64>,
}

impl Voronoi {
    /// Builds the diagram for `delaunay` clipped to `rect`.
    #[must_use]
    pub fn new(delaunay: Delaunay, rect: ClipRect) -> Self {
        let mut voronoi = Self {
            delaunay,
            rect,
            circumcenters: Vec::new(),
            vectors: Vec::new(),
        };
        voronoi.init();
        voronoi
    }

    /// The underlying triangulation facade.
    #[must_use]
    pub fn delaunay(&self) -> &Delaunay {
        &self.delaunay
    }

    /// The clip rectangle.
    #[must_use]
    pub fn rect(&self) -> ClipRect {
        self.rect
    }

    /// Per-triangle circumcenters, flat `(x, y)` pairs.
    #[must_use]
    pub fn circumcenters(&self) -> &[f64] {
        &self.circumcenters
    }

    /// Mutable access to the site coordinates; call [`Self::update`] to
    /// rebuild afterwards.
    pub fn points_mut(&mut self) -> &mut [f64] {
        self.delaunay.points_mut()
    }

    /// Rebuilds mesh, circumcenters, and rays from the current
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Fails if the mutated coordinates are no longer finite.
    pub fn update(&mut self) -> Result<(), TriangulationError> {
        self.delaunay.update()?;
        self.init();
        Ok(())
    }

    /// True when `(x, y)` lies in site `i`'s cell, i.e. `i` is its nearest
    /// site.
    #[must_use]
    pub fn contains(&self, i: usize, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        self.delaunay.step(i, x, y) == i
    }

    /// The raw circumcenter chain around site `i`, unclipped and open for
    /// hull sites. `None` for sites absent from the mesh.
    #[must_use]
    pub fn cell(&self, i: usize) -> Option<Vec<f64>> {
        let t = self.delaunay.triangulation();
        let e0 = *t.inedges.get(i)?;
        if e0 == EMPTY {
            return None; // coincident or degenerate point
        }
        let mut points = Vec::new();
        let mut e = e0;
        loop {
            let tri = e / 3;
            points.extend([self.circumcenters[2 * tri], self.circumcenters[2 * tri + 1]]);
            let en = next_halfedge(e);
            if t.triangles[en] != i {
                break; // inconsistent mesh
            }
            e = t.halfedges[en];
            if e == EMPTY || e == e0 {
                break;
            }
        }
        Some(points)
    }

    /// Site `i`'s cell clipped to the rectangle: a flat clockwise polygon
    /// ring, or `None` when the cell does not intersect the rectangle (or
    /// the site is a duplicate).
    #[must_use]
    pub fn clipped_cell(&self, i: usize) -> Option<Vec<f64>> {
        let hull = &self.delaunay.triangulation().hull;
        // single distinct site: it owns the whole rectangle
        if hull.len() == 1 {
            return if hull[0] == i {
                Some(self.rect.as_polygon())
            } else {
                None
            };
        }

        let points = self.cell(i)?;
        let v = i * 4;
        let clipped = if self.vectors[v] != 0.0 || self.vectors[v + 1] != 0.0 {
            self.clip_infinite(
                i,
                &points,
                self.vectors[v],
                self.vectors[v + 1],
                self.vectors[v + 2],
                self.vectors[v + 3],
            )
        } else {
            self.clip_finite(i, &points)
        }?;
        simplify(clipped)
    }

    fn init(&mut self) {
        let points = self.delaunay.points();
        let t = self.delaunay.triangulation();

        // circumcenter per triangle, with a far-away stand-in for flat
        // triangles so clipping sees a consistent direction instead of NaN
        let mut circumcenters = Vec::with_capacity(t.triangles.len() / 3 * 2);
        let mut barycenter: Option<(f64, f64)> = None;
        for tri in t.triangles.chunks_exact(3) {
            let x1 = points[2 * tri[0]];
            let y1 = points[2 * tri[0] + 1];
            let x2 = points[2 * tri[1]];
            let y2 = points[2 * tri[1] + 1];
            let x3 = points[2 * tri[2]];
            let y3 = points[2 * tri[2] + 1];

            let dx = x2 - x1;
            let dy = y2 - y1;
            let ex = x3 - x1;
            let ey = y3 - y1;
            let ab = (dx * ey - dy * ex) * 2.0;

            if ab.abs() < DEGENERATE_AREA {
                let (bx, by) = *barycenter.get_or_insert_with(|| {
                    let mut bx = 0.0;
                    let mut by = 0.0;
                    for &h in &t.hull {
                        bx += points[2 * h];
                        by += points[2 * h + 1];
                    }
                    let len = t.hull.len() as f64;
                    (bx / len, by / len)
                });
                let side = (bx - x1) * ey - (by - y1) * ex;
                let a = FAR_CIRCUMCENTER
                    * if side > 0.0 {
                        1.0
                    } else if side < 0.0 {
                        -1.0
                    } else {
                        0.0
                    };
                circumcenters.push((x1 + x3) / 2.0 - a * ey);
                circumcenters.push((y1 + y3) / 2.0 + a * ex);
            } else {
                let d = 1.0 / ab;
                let bl = dx * dx + dy * dy;
                let cl = ex * ex + ey * ey;
                circumcenters.push(x1 + (ey * bl - dy * cl) * d);
                circumcenters.push(y1 + (dx * cl - ex * bl) * d);
            }
        }

        // outward perpendiculars of the hull edges: for a counter-clockwise
        // hull edge p0 -> p1 that is (y1 - y0, x0 - x1), stored as the
        // trailing ray of p0's cell and the leading ray of p1's
        let mut vectors = vec![0.0; points.len() * 2];
        if t.hull.len() > 1 {
            let mut h = t.hull[t.hull.len() - 1];
            let mut p1 = h * 4;
            let mut x1 = points[2 * h];
            let mut y1 = points[2 * h + 1];
            for &next in &t.hull {
                h = next;
                let p0 = p1;
                let x0 = x1;
                let y0 = y1;
                p1 = h * 4;
                x1 = points[2 * h];
                y1 = points[2 * h + 1];
                vectors[p0 + 2] = y1 - y0;
                vectors[p1] = y1 - y0;
                vectors[p0 + 3] = x0 - x1;
                vectors[p1 + 1] = x0 - x1;
            }
        }

        self.circumcenters = circumcenters;
        self.vectors = vectors;
    }

    /// Clips a closed circumcenter ring to the rectangle, splicing in owned
    /// corners wherever the ring leaves and re-enters along the boundary.
    fn clip_finite(&self, i: usize, points: &[f64]) -> Option<Vec<f64>> {
        let n = points.len();
        let mut result: Option<Vec<f64>> = None;
        let mut x1 = points[n - 2];
        let mut y1 = points[n - 1];
        let mut c1 = self.regioncode(x1, y1);
        let mut e1: u8 = 0;

        let mut j = 0;
        while j < n {
            let x0 = x1;
            let y0 = y1;
            x1 = points[j];
            y1 = points[j + 1];
            let c0 = c1;
            c1 = self.regioncode(x1, y1);
            j += 2;

            if c0 == 0 && c1 == 0 {
                e1 = 0;
                match result.as_mut() {
                    Some(p) => p.extend([x1, y1]),
                    None => result = Some(vec![x1, y1]),
                }
            } else if c0 == 0 {
                // starts inside: the start vertex is emitted by its own
                // iteration, only the exit point is new
                let Some([_, _, sx1, sy1]) = self.clip_segment(x0, y0, x1, y1, c0, c1) else {
                    continue;
                };
                let e0 = e1;
                e1 = self.edgecode(sx1, sy1);
                if e0 != 0 && e1 != 0 {
                    if let Some(p) = result.as_mut() {
                        let len = p.len();
                        self.edge(i, e0, e1, p, len);
                    }
                }
                match result.as_mut() {
                    Some(p) => p.extend([sx1, sy1]),
                    None => result = Some(vec![sx1, sy1]),
                }
            } else {
                // segment starts outside: clip it reversed, then emit the
                // entry point before the (possibly clipped) endpoint
                let Some([sx1r, sy1r, sx0, sy0]) = self.clip_segment(x1, y1, x0, y0, c1, c0)
                else {
                    continue;
                };
                let mut e0 = e1;
                e1 = self.edgecode(sx0, sy0);
                if e0 != 0 && e1 != 0 {
                    if let Some(p) = result.as_mut() {
                        let len = p.len();
                        self.edge(i, e0, e1, p, len);
                    }
                }
                match result.as_mut() {
                    Some(p) => p.extend([sx0, sy0]),
                    None => result = Some(vec![sx0, sy0]),
                }
                e0 = e1;
                e1 = self.edgecode(sx1r, sy1r);
                if e0 != 0 && e1 != 0 {
                    if let Some(p) = result.as_mut() {
                        let len = p.len();
                        self.edge(i, e0, e1, p, len);
                    }
                }
                if let Some(p) = result.as_mut() {
                    p.extend([sx1r, sy1r]);
                }
            }
        }

        match result {
            Some(mut p) => {
                let e0 = e1;
                e1 = self.edgecode(p[0], p[1]);
                if e0 != 0 && e1 != 0 {
                    let len = p.len();
                    self.edge(i, e0, e1, &mut p, len);
                }
                Some(p)
            }
            None => {
                // the ring misses the rectangle entirely; the cell still
                // covers it when the site owns the rectangle's center
                let (cx, cy) = self.rect.center();
                if self.contains(i, cx, cy) {
                    Some(self.rect.as_polygon())
                } else {
                    None
                }
            }
        }
    }

    /// Clips one segment to the rectangle, iteratively reclassifying until
    /// both endpoints are inside or the segment is fully rejected. The
    /// segment is always processed with the higher region code first so
    /// that shared edges of adjacent cells clip identically.
    fn clip_segment(
        &self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        c0: u8,
        c1: u8,
    ) -> Option<[f64; 4]> {
        let flip = c0 < c1;
        let (mut x0, mut y0, mut x1, mut y1, mut c0, mut c1) = if flip {
            (x1, y1, x0, y0, c1, c0)
        } else {
            (x0, y0, x1, y1, c0, c1)
        };

        loop {
            if c0 == 0 && c1 == 0 {
                return Some(if flip {
                    [x1, y1, x0, y0]
                } else {
                    [x0, y0, x1, y1]
                });
            }
            if c0 & c1 != 0 {
                return None;
            }
            let c = if c0 != 0 { c0 } else { c1 };
            let (x, y);
            if c & TOP != 0 {
                x = x0 + (x1 - x0) * (self.rect.y_max - y0) / (y1 - y0);
                y = self.rect.y_max;
            } else if c & BOTTOM != 0 {
                x = x0 + (x1 - x0) * (self.rect.y_min - y0) / (y1 - y0);
                y = self.rect.y_min;
            } else if c & RIGHT != 0 {
                y = y0 + (y1 - y0) * (self.rect.x_max - x0) / (x1 - x0);
                x = self.rect.x_max;
            } else {
                y = y0 + (y1 - y0) * (self.rect.x_min - x0) / (x1 - x0);
                x = self.rect.x_min;
            }
            if c0 != 0 {
                x0 = x;
                y0 = y;
                c0 = self.regioncode(x0, y0);
            } else {
                x1 = x;
                y1 = y;
                c1 = self.regioncode(x1, y1);
            }
        }
    }

    /// Closes the open circumcenter chain of a hull site by projecting its
    /// endpoints along the outward rays onto the rectangle, then clips and
    /// splices boundary corners along the whole ring.
    fn clip_infinite(
        &self,
        i: usize,
        points: &[f64],
        vx0: f64,
        vy0: f64,
        vxn: f64,
        vyn: f64,
    ) -> Option<Vec<f64>> {
        let mut p = points.to_vec();
        if let Some((x, y)) = self.project(p[0], p[1], vx0, vy0) {
            p.insert(0, y);
            p.insert(0, x);
        }
        if let Some((x, y)) = self.project(p[p.len() - 2], p[p.len() - 1], vxn, vyn) {
            p.extend([x, y]);
        }

        match self.clip_finite(i, &p) {
            Some(mut p) => {
                let mut j = 0;
                let mut c1 = self.edgecode(p[p.len() - 2], p[p.len() - 1]);
                while j < p.len() {
                    let c0 = c1;
                    c1 = self.edgecode(p[j], p[j + 1]);
                    if c0 != 0 && c1 != 0 {
                        j = self.edge(i, c0, c1, &mut p, j);
                    }
                    j += 2;
                }
                Some(p)
            }
            None => {
                let (cx, cy) = self.rect.center();
                if self.contains(i, cx, cy) {
                    Some(self.rect.as_polygon())
                } else {
                    None
                }
            }
        }
    }

    /// Walks the rectangle boundary clockwise from edge code `e0` to `e1`,
    /// inserting each passed corner at position `j` of the ring if the site
    /// owns it. Returns the insertion cursor after the last corner.
    #[allow(clippy::float_cmp)]
    fn edge(&self, i: usize, mut e0: u8, e1: u8, p: &mut Vec<f64>, mut j: usize) -> usize {
        while e0 != e1 {
            let (x, y);
            match e0 {
                0b0101 => {
                    // bottom-left corner, continue on the left edge
                    e0 = LEFT;
                    continue;
                }
                LEFT => {
                    e0 = 0b1001;
                    x = self.rect.x_min;
                    y = self.rect.y_max;
                }
                0b1001 => {
                    // top-left corner, continue on the top edge
                    e0 = TOP;
                    continue;
                }
                TOP => {
                    e0 = 0b1010;
                    x = self.rect.x_max;
                    y = self.rect.y_max;
                }
                0b1010 => {
                    // top-right corner, continue on the right edge
                    e0 = RIGHT;
                    continue;
                }
                RIGHT => {
                    e0 = 0b0110;
                    x = self.rect.x_max;
                    y = self.rect.y_min;
                }
                0b0110 => {
                    // bottom-right corner, continue on the bottom edge
                    e0 = BOTTOM;
                    continue;
                }
                BOTTOM => {
                    e0 = 0b0101;
                    x = self.rect.x_min;
                    y = self.rect.y_min;
                }
                _ => break,
            }
            // insert the corner only once and only if this site owns it;
            // two or more cells can otherwise claim the same corner
            if (j >= p.len() || p[j] != x || p[j + 1] != y) && self.contains(i, x, y) {
                p.insert(j, y);
                p.insert(j, x);
                j += 2;
            }
        }
        j
    }

    /// First intersection of the ray from `(x0, y0)` along `(vx, vy)` with
    /// the rectangle boundary, or `None` when the ray points away.
    fn project(&self, x0: f64, y0: f64, vx: f64, vy: f64) -> Option<(f64, f64)> {
        let mut t = f64::INFINITY;
        let mut x = 0.0;
        let mut y = 0.0;

        if vy > 0.0 {
            if y0 >= self.rect.y_max {
                return None;
            }
            let c = (self.rect.y_max - y0) / vy;
            if c < t {
                t = c;
                y = self.rect.y_max;
                x = x0 + c * vx;
            }
        } else if vy < 0.0 {
            if y0 <= self.rect.y_min {
                return None;
            }
            let c = (self.rect.y_min - y0) / vy;
            if c < t {
                t = c;
                y = self.rect.y_min;
                x = x0 + c * vx;
            }
        }

        if vx > 0.0 {
            if x0 >= self.rect.x_max {
                return None;
            }
            let c = (self.rect.x_max - x0) / vx;
            if c < t {
                t = c;
                x = self.rect.x_max;
                y = y0 + c * vy;
            }
        } else if vx < 0.0 {
            if x0 <= self.rect.x_min {
                return None;
            }
            let c = (self.rect.x_min - x0) / vx;
            if c < t {
                t = c;
                x = self.rect.x_min;
                y = y0 + c * vy;
            }
        }

        t.is_finite().then_some((x, y))
    }

    /// 4-bit Cohen-Sutherland region of `(x, y)` relative to the rectangle
    /// (0 when inside or on the boundary).
    fn regioncode(&self, x: f64, y: f64) -> u8 {
        (if x < self.rect.x_min {
            LEFT
        } else if x > self.rect.x_max {
            RIGHT
        } else {
            0
        }) | (if y < self.rect.y_min {
            BOTTOM
        } else if y > self.rect.y_max {
            TOP
        } else {
            0
        })
    }

    /// Which rectangle edge(s) `(x, y)` lies exactly on (0 for interior
    /// points).
    #[allow(clippy::float_cmp)]
    fn edgecode(&self, x: f64, y: f64) -> u8 {
        (if x == self.rect.x_min {
            LEFT
        } else if x == self.rect.x_max {
            RIGHT
        } else {
            0
        }) | (if y == self.rect.y_min {
            BOTTOM
        } else if y == self.rect.y_max {
            TOP
        } else {
            0
        })
    }
}

/// Drops ring vertices that repeat a coordinate with both neighbors, i.e.
/// collinear runs along a rectangle edge left behind by corner splicing.
#[allow(clippy::float_cmp)]
fn simplify(mut p: Vec<f64>) -> Option<Vec<f64>> {
    if p.len() > 4 {
        let mut i = 0;
        while i < p.len() {
            let n = p.len();
            let j = (i + 2) % n;
            let k = (i + 4) % n;
            if (p[i] == p[j] && p[j] == p[k]) || (p[i + 1] == p[j + 1] && p[j + 1] == p[k + 1]) {
                p.drain(j..j + 2);
            } else {
                i += 2;
            }
        }
        if p.is_empty() {
            return None;
        }
    }
    Some(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voronoi(points: &[(f64, f64)], rect: ClipRect) -> Voronoi {
        let flat: Vec<f64> = points.iter().flat_map(|&(x, y)| [x, y]).collect();
        Voronoi::new(Delaunay::new(flat).unwrap(), rect)
    }

    /// Unsigned shoelace area of a flat polygon ring.
    fn ring_area(ring: &[f64]) -> f64 {
        let n = ring.len();
        let mut sum = 0.0;
        for i in (0..n).step_by(2) {
            let j = (i + 2) % n;
            sum += ring[i] * ring[j + 1] - ring[j] * ring[i + 1];
        }
        (sum / 2.0).abs()
    }

    fn point_in_ring(ring: &[f64], x: f64, y: f64) -> bool {
        // ray casting; boundary treatment is irrelevant for these tests
        let n = ring.len() / 2;
        let mut inside = false;
        for i in 0..n {
            let (xi, yi) = (ring[2 * i], ring[2 * i + 1]);
            let j = (i + 1) % n;
            let (xj, yj) = (ring[2 * j], ring[2 * j + 1]);
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
        }
        inside
    }

    #[test]
    fn clip_rect_rejects_bad_bounds() {
        assert!(ClipRect::new(0.0, 0.0, 1.0, 1.0).is_ok());
        assert!(ClipRect::new(1.0, 0.0, 0.0, 1.0).is_err());
        assert!(ClipRect::new(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(ClipRect::new(0.0, f64::NAN, 1.0, 1.0).is_err());
        assert!(ClipRect::new(0.0, 0.0, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn single_site_owns_the_whole_rectangle() {
        let rect = ClipRect::new(0.0, 0.0, 2.0, 1.0).unwrap();
        let v = voronoi(&[(0.5, 0.5)], rect);
        let cell = v.clipped_cell(0).unwrap();
        assert_eq!(ring_area(&cell), 2.0);
    }

    #[test]
    fn three_sites_partition_the_rectangle() {
        let rect = ClipRect::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let v = voronoi(&[(0.2, 0.2), (0.8, 0.3), (0.5, 0.8)], rect);

        let mut total = 0.0;
        for i in 0..3 {
            let cell = v.clipped_cell(i).unwrap();
            let (x, y) = (v.delaunay().points()[2 * i], v.delaunay().points()[2 * i + 1]);
            assert!(point_in_ring(&cell, x, y), "site {i} outside its own cell");
            total += ring_area(&cell);
        }
        assert!((total - rect.area()).abs() < 1e-9);
    }

    #[test]
    fn oversized_rectangle_is_partitioned_too() {
        // rect much larger than the point cloud: the unbounded cells are
        // closed by projected rays and still tile the whole rectangle
        let rect = ClipRect::new(-5.0, -5.0, 5.0, 5.0).unwrap();
        let v = voronoi(&[(0.0, 0.0), (1.0, 0.2), (0.4, 1.0)], rect);

        let mut total = 0.0;
        for i in 0..3 {
            let cell = v.clipped_cell(i).unwrap();
            total += ring_area(&cell);
        }
        assert!((total - rect.area()).abs() < 1e-6);
    }

    #[test]
    fn interior_cell_is_clipped_to_rectangle_bounds() {
        let rect = ClipRect::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let v = voronoi(
            &[(0.5, 0.5), (0.1, 0.1), (0.9, 0.1), (0.9, 0.9), (0.1, 0.9)],
            rect,
        );
        let cell = v.clipped_cell(0).unwrap();
        for pair in cell.chunks_exact(2) {
            assert!((0.0..=1.0).contains(&pair[0]));
            assert!((0.0..=1.0).contains(&pair[1]));
        }
    }

    #[test]
    fn contains_matches_nearest_site() {
        let rect = ClipRect::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let v = voronoi(&[(0.25, 0.5), (0.75, 0.5), (0.5, 0.05)], rect);
        assert!(v.contains(0, 0.1, 0.6));
        assert!(v.contains(1, 0.9, 0.6));
        assert!(!v.contains(0, 0.9, 0.6));
        assert!(!v.contains(2, f64::NAN, 0.5));
    }

    #[test]
    fn duplicate_site_has_no_cell() {
        let rect = ClipRect::new(-1.0, -1.0, 2.0, 2.0).unwrap();
        let v = voronoi(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 0.0)], rect);
        // exactly one of the two coincident sites keeps the cell
        let first = v.clipped_cell(1).is_some();
        let second = v.clipped_cell(3).is_some();
        assert!(first != second);
        assert!(v.clipped_cell(0).is_some());
    }

    #[test]
    fn update_follows_moved_sites() {
        let rect = ClipRect::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let mut v = voronoi(&[(0.1, 0.5), (0.2, 0.5), (0.5, 0.9)], rect);
        let before = ring_area(&v.clipped_cell(0).unwrap());

        // push site 0 into the far corner; its cell shrinks
        v.points_mut()[0] = 0.01;
        v.points_mut()[1] = 0.01;
        v.update().unwrap();
        let after = ring_area(&v.clipped_cell(0).unwrap());
        assert!(after < before);
    }

    #[test]
    fn simplify_collapses_boundary_runs() {
        // middle vertex collinear with both neighbors along x == 1
        let ring = vec![1.0, 0.0, 1.0, 0.5, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let out = simplify(ring).unwrap();
        assert_eq!(out.len(), 8);
        assert!(!out.chunks_exact(2).any(|p| p == [1.0, 0.5]));
    }
}
