//! Consumer-facing Voronoi diagram facade.
//!
//! Bundles triangulation and clipping behind a small query surface so
//! callers (renderers, Lloyd-style relaxation loops) never touch the
//! half-edge arrays directly.

use serde::{Deserialize, Serialize};

use crate::core::delaunay::Delaunay;
use crate::core::triangulation::TriangulationError;
use crate::core::voronoi::{ClipRect, Voronoi};

/// A Delaunay triangulation and its Voronoi diagram clipped to a
/// rectangle, built once from a point set and rebuildable in place.
///
/// # Example
///
/// ```
/// use delaunay2d::prelude::*;
///
/// let rect = ClipRect::new(0.0, 0.0, 1.0, 1.0)?;
/// let diagram = VoronoiDiagram::new(vec![0.2, 0.3, 0.8, 0.4, 0.5, 0.9], rect)?;
/// let cell = diagram.cell_polygon(0);
/// assert!(!cell.is_empty());
/// # Ok::<(), TriangulationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoronoiDiagram {
    voronoi: Voronoi,
}

impl VoronoiDiagram {
    /// Builds the diagram from a flat `[x0, y0, x1, y1, ..]` buffer.
    ///
    /// # Errors
    ///
    /// Fails when the buffer has odd length, contains a non-finite
    /// coordinate, or the rectangle is invalid (the rectangle is checked
    /// by [`ClipRect::new`] before this call).
    pub fn new(points: Vec<f64>, rect: ClipRect) -> Result<Self, TriangulationError> {
        Ok(Self {
            voronoi: Voronoi::new(Delaunay::new(points)?, rect),
        })
    }

    /// Builds the diagram from `(x, y)` pairs.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::new`].
    pub fn from_points(points: &[[f64; 2]], rect: ClipRect) -> Result<Self, TriangulationError> {
        Self::new(points.iter().flatten().copied().collect(), rect)
    }

    /// The clipping layer, for direct access to flat cell rings and
    /// circumcenters.
    #[must_use]
    pub fn voronoi(&self) -> &Voronoi {
        &self.voronoi
    }

    /// The triangulation facade.
    #[must_use]
    pub fn delaunay(&self) -> &Delaunay {
        self.voronoi.delaunay()
    }

    /// The clip rectangle.
    #[must_use]
    pub fn rect(&self) -> ClipRect {
        self.voronoi.rect()
    }

    /// Number of sites, including duplicates.
    #[must_use]
    pub fn num_sites(&self) -> usize {
        self.voronoi.delaunay().num_points()
    }

    /// Site `i`'s clipped cell as a clockwise vertex list; empty when the
    /// cell does not intersect the rectangle or the site is a duplicate.
    #[must_use]
    pub fn cell_polygon(&self, i: usize) -> Vec<[f64; 2]> {
        self.voronoi
            .clipped_cell(i)
            .map(|flat| flat.chunks_exact(2).map(|p| [p[0], p[1]]).collect())
            .unwrap_or_default()
    }

    /// Iterates over `(site, polygon)` for every non-empty cell.
    pub fn cell_polygons(&self) -> impl Iterator<Item = (usize, Vec<[f64; 2]>)> + '_ {
        (0..self.num_sites()).filter_map(move |i| {
            let polygon = self.cell_polygon(i);
            (!polygon.is_empty()).then_some((i, polygon))
        })
    }

    /// Sites whose clipped cells share an edge with site `i`'s cell.
    ///
    /// This is stricter than mesh adjacency: two sites adjacent in the
    /// triangulation stop being neighbors here once the rectangle cuts
    /// away their common cell edge.
    #[must_use]
    pub fn neighbors(&self, i: usize) -> Vec<usize> {
        let Some(ci) = self.voronoi.clipped_cell(i) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for j in self.voronoi.delaunay().neighbors(i) {
            if let Some(cj) = self.voronoi.clipped_cell(j) {
                if shares_directed_edge(&ci, &cj) {
                    out.push(j);
                }
            }
        }
        out
    }

    /// Mutable access to the site coordinates; call [`Self::update`]
    /// afterwards.
    pub fn points_mut(&mut self) -> &mut [f64] {
        self.voronoi.points_mut()
    }

    /// Rebuilds everything from the current coordinates.
    ///
    /// # Errors
    ///
    /// Fails if a coordinate was set to a non-finite value.
    pub fn update(&mut self) -> Result<(), TriangulationError> {
        self.voronoi.update()
    }
}

/// True when ring `ci` contains a directed edge that appears reversed in
/// ring `cj`, i.e. the two clipped cells share a border segment.
#[allow(clippy::float_cmp)]
fn shares_directed_edge(ci: &[f64], cj: &[f64]) -> bool {
    let li = ci.len();
    let lj = cj.len();
    for ai in (0..li).step_by(2) {
        for aj in (0..lj).step_by(2) {
            if ci[ai] == cj[aj]
                && ci[ai + 1] == cj[aj + 1]
                && ci[(ai + 2) % li] == cj[(aj + lj - 2) % lj]
                && ci[(ai + 3) % li] == cj[(aj + lj - 1) % lj]
            {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_rect() -> ClipRect {
        ClipRect::new(0.0, 0.0, 1.0, 1.0).unwrap()
    }

    fn square_with_center() -> VoronoiDiagram {
        VoronoiDiagram::from_points(
            &[
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [0.0, 1.0],
                [0.5, 0.5],
            ],
            unit_rect(),
        )
        .unwrap()
    }

    #[test]
    fn construction_rejects_bad_input() {
        assert!(VoronoiDiagram::new(vec![0.0, 0.0, 1.0], unit_rect()).is_err());
        assert!(VoronoiDiagram::new(vec![0.0, f64::NAN], unit_rect()).is_err());
    }

    #[test]
    fn center_site_neighbors_all_corners() {
        let diagram = square_with_center();
        let mut n = diagram.neighbors(4);
        n.sort_unstable();
        assert_eq!(n, vec![0, 1, 2, 3]);
    }

    #[test]
    fn neighbor_relation_is_symmetric() {
        let diagram = square_with_center();
        for i in 0..diagram.num_sites() {
            for &j in &diagram.neighbors(i) {
                assert!(
                    diagram.neighbors(j).contains(&i),
                    "site {j} does not list {i} back"
                );
            }
        }
    }

    #[test]
    fn clipping_can_sever_mesh_adjacency() {
        // sites 0 and 1 are mesh neighbors, but their common Voronoi edge
        // (x = 0.5 below the circumcenter at y ~ 0.547) lies entirely
        // under this rect, so site 2's cell separates them inside it
        let rect = ClipRect::new(0.2, 0.6, 0.8, 0.9).unwrap();
        let diagram =
            VoronoiDiagram::from_points(&[[0.1, 0.5], [0.9, 0.5], [0.5, 0.95]], rect).unwrap();
        assert!(!diagram.cell_polygon(0).is_empty());
        assert!(!diagram.cell_polygon(1).is_empty());
        let neighbors = diagram.neighbors(0);
        assert!(neighbors.contains(&2));
        assert!(!neighbors.contains(&1));
    }

    #[test]
    fn cell_polygons_skips_empty_cells() {
        // duplicate site contributes no polygon
        let diagram = VoronoiDiagram::from_points(
            &[[0.2, 0.2], [0.8, 0.8], [0.2, 0.8], [0.2, 0.2]],
            unit_rect(),
        )
        .unwrap();
        let cells: Vec<usize> = diagram.cell_polygons().map(|(i, _)| i).collect();
        assert_eq!(cells.len(), 3);
    }

    #[test]
    fn update_rebuilds_cells() {
        let mut diagram = square_with_center();
        let before = diagram.cell_polygon(4);

        diagram.points_mut()[8] = 0.25;
        diagram.update().unwrap();
        let after = diagram.cell_polygon(4);
        assert_ne!(before, after);
        assert!(!after.is_empty());
    }

    #[test]
    fn serde_round_trip() {
        let diagram = square_with_center();
        let json = serde_json::to_string(&diagram).unwrap();
        let back: VoronoiDiagram = serde_json::from_str(&json).unwrap();
        assert_eq!(diagram, back);
    }
}
