//! # delaunay2d
//!
//! Planar Delaunay triangulation and rectangle-clipped Voronoi diagrams
//! over flat `f64` coordinate buffers, with robust orientation and
//! in-circle predicates evaluated in double-double arithmetic.
//!
//! # Features
//!
//! - Sweep-hull Delaunay triangulation into a flat half-edge mesh
//!   (triangle vertex triples, twin half-edges, counter-clockwise hull)
//! - Robust `orient2d` / `in_circle` predicates whose signs are exact for
//!   finite input
//! - Greedy-walk point location (`find`) and lazy neighbor enumeration
//! - Voronoi cells clipped to an axis-aligned rectangle, with hull cells
//!   closed by outward ray projection
//! - In-place rebuilds after mutating the coordinate buffer (`update`)
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Triangulating points
//!
//! ```rust
//! use delaunay2d::prelude::*;
//!
//! // Four square corners and the center point.
//! let points = vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.5, 0.5];
//! let delaunay = Delaunay::new(points)?;
//!
//! // Euler: n = 5 points, h = 4 hull points => 2n - h - 2 = 4 triangles.
//! assert_eq!(delaunay.triangulation().len(), 4);
//! assert_eq!(delaunay.triangulation().hull.len(), 4);
//!
//! // Point location: (0.9, 0.9) is nearest the corner at index 2.
//! assert_eq!(delaunay.find(0.9, 0.9, 0), Some(2));
//!
//! // The center point neighbors all four corners.
//! let mut around_center: Vec<_> = delaunay.neighbors(4).collect();
//! around_center.sort_unstable();
//! assert_eq!(around_center, vec![0, 1, 2, 3]);
//! # Ok::<(), TriangulationError>(())
//! ```
//!
//! # Voronoi cells
//!
//! ```rust
//! use delaunay2d::prelude::*;
//!
//! let rect = ClipRect::new(0.0, 0.0, 1.0, 1.0)?;
//! let mut diagram = VoronoiDiagram::new(
//!     vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.5, 0.5],
//!     rect,
//! )?;
//!
//! // Every site owns a non-empty clipped cell here.
//! assert_eq!(diagram.cell_polygons().count(), 5);
//!
//! // Move the center point and rebuild in place.
//! diagram.points_mut()[8] = 0.25;
//! diagram.update()?;
//! assert!(!diagram.cell_polygon(4).is_empty());
//! # Ok::<(), TriangulationError>(())
//! ```
//!
//! # Degenerate input
//!
//! Fewer than three points, duplicate points, and fully collinear point
//! sets are defined terminal states, not errors: the mesh comes back
//! empty (or hull-only) and queries degrade gracefully. The only
//! construction failures are structural — an odd-length buffer, a
//! non-finite coordinate, or an invalid clip rectangle.

/// Mesh construction and the query facades layered on top of it.
pub mod core {
    /// Greedy-walk point location and neighbor iteration over the mesh
    pub mod delaunay;
    pub mod diagram;
    /// Sweep-hull triangulator producing the flat half-edge arrays
    pub mod triangulation;
    /// Circumcenter chains and rectangle clipping
    pub mod voronoi;

    // Re-export the `core` modules.
    pub use delaunay::*;
    pub use diagram::*;
    pub use triangulation::*;
    pub use voronoi::*;
}

/// Exact-sign predicates and the numeric helpers under them.
pub mod geometry {
    /// Error-free double-double expansion arithmetic
    pub mod dd;
    pub mod robust_predicates;
    pub mod util;

    pub use robust_predicates::*;
    pub use util::*;
}

/// Commonly used types and functions, importable in one line.
pub mod prelude {
    pub use crate::core::delaunay::*;
    pub use crate::core::diagram::*;
    pub use crate::core::triangulation::*;
    pub use crate::core::voronoi::*;
    pub use crate::geometry::robust_predicates::*;
    pub use crate::geometry::util::*;
}
