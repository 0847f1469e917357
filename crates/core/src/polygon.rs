//! Points and closed polygons with cyclic indexing and derived edge data.

use crate::transform::{rotate, Aabb};
use crate::{Error, Result};
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, Centroid, Coord, Line, LineString, Polygon as GeoPolygon};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in field coordinates, metres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// This point rotated counterclockwise around the origin.
    pub fn rotated(&self, angle: f64) -> Point {
        let (x, y) = rotate(self.x, self.y, angle);
        Point::new(x, y)
    }

    /// This point shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// A closed polygon stored as a contiguous vertex sequence.
///
/// Derived data (bounding box, per-vertex tangent angles, per-edge lengths
/// and the longest-edge direction) is computed eagerly on construction and
/// after every transform; indexing is modular, so walking off either end
/// wraps around the cycle.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    vertices: Vec<Point>,
    bbox: Aabb,
    tangents: Vec<f64>,
    edge_lengths: Vec<f64>,
    best_direction_deg: f64,
}

impl Polygon {
    /// Creates a polygon from a vertex list and computes its derived data.
    pub fn new(vertices: Vec<Point>) -> Self {
        let mut polygon = Self {
            vertices,
            bbox: Aabb::empty(),
            tangents: Vec::new(),
            edge_lengths: Vec::new(),
            best_direction_deg: 0.0,
        };
        polygon.calculate_data();
        polygon
    }

    /// Creates an axis-aligned rectangle with one corner at the origin.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(vec![
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ])
    }

    /// Creates a regular n-gon approximation of a circle around the origin.
    pub fn circle(radius: f64, n: usize) -> Self {
        let n = n.max(3);
        let step = std::f64::consts::TAU / n as f64;
        let vertices = (0..n)
            .map(|i| {
                let angle = i as f64 * step;
                Point::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Self::new(vertices)
    }

    /// Recomputes all derived data from the vertex list.
    pub fn calculate_data(&mut self) {
        let n = self.vertices.len();
        self.bbox = Aabb::empty();
        self.tangents = Vec::with_capacity(n);
        self.edge_lengths = Vec::with_capacity(n);

        let mut longest = 0.0_f64;
        let mut longest_dir = 0.0_f64;
        for i in 0..n {
            let from = self.vertices[i];
            let to = self.vertices[(i + 1) % n];
            self.bbox.extend(from.x, from.y);
            let length = from.distance_to(&to);
            let tangent = (to.y - from.y).atan2(to.x - from.x);
            self.edge_lengths.push(length);
            self.tangents.push(tangent);
            if length > longest {
                longest = length;
                longest_dir = tangent;
            }
        }
        // longest edge direction as an axis in [0, 180)
        let mut deg = longest_dir.to_degrees() % 180.0;
        if deg < 0.0 {
            deg += 180.0;
        }
        self.best_direction_deg = deg;
    }

    /// Rejects polygons that cannot bound a work area.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() < 3 {
            return Err(Error::InvalidBoundary(format!(
                "polygon must have at least 3 vertices, got {}",
                self.vertices.len()
            )));
        }
        if self
            .vertices
            .iter()
            .any(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(Error::InvalidBoundary(
                "polygon has non-finite coordinates".into(),
            ));
        }
        let distinct = self
            .vertices
            .iter()
            .filter(|p| p.distance_to(&self.vertices[0]) > 1e-9)
            .count();
        if distinct < 2 {
            return Err(Error::InvalidBoundary(
                "polygon vertices are degenerate".into(),
            ));
        }
        Ok(())
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The vertex sequence.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Vertex at a modular index.
    pub fn at(&self, ix: isize) -> &Point {
        &self.vertices[self.wrap(ix)]
    }

    /// Maps any signed index onto the cycle.
    pub fn wrap(&self, ix: isize) -> usize {
        ix.rem_euclid(self.vertices.len() as isize) as usize
    }

    /// The bounding box.
    pub fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    /// Tangent angle of the edge leaving vertex `ix`, radians.
    pub fn tangent(&self, ix: usize) -> f64 {
        self.tangents[ix % self.tangents.len()]
    }

    /// Length of the edge leaving vertex `ix`.
    pub fn edge_length(&self, ix: usize) -> f64 {
        self.edge_lengths[ix % self.edge_lengths.len()]
    }

    /// Direction of the longest edge, degrees in `[0, 180)`.
    pub fn best_direction_deg(&self) -> f64 {
        self.best_direction_deg
    }

    /// Area centroid.
    pub fn centroid(&self) -> Point {
        match self.to_geo().centroid() {
            Some(c) => Point::new(c.x(), c.y()),
            None => Point::default(),
        }
    }

    /// Unsigned area.
    pub fn area(&self) -> f64 {
        self.to_geo().unsigned_area()
    }

    /// This polygon rotated counterclockwise around the origin.
    pub fn rotated(&self, angle: f64) -> Polygon {
        Polygon::new(self.vertices.iter().map(|p| p.rotated(angle)).collect())
    }

    /// This polygon shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Polygon {
        Polygon::new(
            self.vertices
                .iter()
                .map(|p| p.translated(dx, dy))
                .collect(),
        )
    }

    /// Iterates vertex indices cyclically from `start` to `end` inclusive.
    ///
    /// `step` must be `-1` or `+1`; at most one full cycle is walked.
    pub fn iter_cyclic(&self, start: usize, end: usize, step: i32) -> CyclicIter {
        CyclicIter {
            len: self.vertices.len(),
            cur: start % self.vertices.len().max(1),
            end: end % self.vertices.len().max(1),
            step,
            emitted: 0,
            done: self.vertices.is_empty(),
        }
    }

    /// Vertex points from `start` to `end` inclusive, walking in `step`.
    pub fn slice(&self, start: usize, end: usize, step: i32) -> Vec<Point> {
        self.iter_cyclic(start, end, step)
            .map(|ix| self.vertices[ix])
            .collect()
    }

    /// Distance walked along the boundary from edge `from_ix` to edge
    /// `to_ix` in direction `step`, accumulating the length of the edge
    /// leaving each visited vertex. `None` if `to_ix` is never reached
    /// within one cycle.
    pub fn distance_between_edges(&self, from_ix: usize, to_ix: usize, step: i32) -> Option<f64> {
        if self.vertices.is_empty() {
            return None;
        }
        let n = self.vertices.len();
        let mut sum = 0.0;
        let mut ix = from_ix % n;
        let to_ix = to_ix % n;
        for _ in 0..=n {
            if ix == to_ix {
                return Some(sum);
            }
            sum += self.edge_length(ix);
            ix = self.wrap(ix as isize + step as isize);
        }
        None
    }

    /// Minimum distance from a point to the polygon boundary.
    pub fn distance_to_boundary(&self, point: &Point) -> f64 {
        let n = self.vertices.len();
        let mut best = f64::INFINITY;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            best = best.min(point_segment_distance(point, &a, &b));
        }
        best
    }

    /// Returns true if the point lies inside the polygon (ray casting).
    pub fn contains(&self, point: &Point) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    fn to_geo(&self) -> GeoPolygon<f64> {
        let exterior = LineString::from(
            self.vertices
                .iter()
                .map(|p| Coord { x: p.x, y: p.y })
                .collect::<Vec<_>>(),
        );
        GeoPolygon::new(exterior, Vec::new())
    }
}

/// Cyclic index iterator over a polygon, inclusive of both endpoints.
pub struct CyclicIter {
    len: usize,
    cur: usize,
    end: usize,
    step: i32,
    emitted: usize,
    done: bool,
}

impl Iterator for CyclicIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done || self.emitted > self.len {
            return None;
        }
        let ix = self.cur;
        self.emitted += 1;
        if ix == self.end {
            self.done = true;
        } else {
            let next = (ix as isize + self.step as isize).rem_euclid(self.len as isize);
            self.cur = next as usize;
        }
        Some(ix)
    }
}

/// Single-point intersection of two segments, if they cross.
///
/// Collinear overlaps yield no point; the caller sees the crossings of
/// the neighbouring edges instead.
pub fn segment_intersection(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Option<Point> {
    let p = Line::new(Coord { x: a1.x, y: a1.y }, Coord { x: a2.x, y: a2.y });
    let q = Line::new(Coord { x: b1.x, y: b1.y }, Coord { x: b2.x, y: b2.y });
    match line_intersection(p, q) {
        Some(LineIntersection::SinglePoint { intersection, .. }) => {
            Some(Point::new(intersection.x, intersection.y))
        }
        _ => None,
    }
}

fn point_segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 <= f64::EPSILON {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_bbox_and_area() {
        let rect = Polygon::rectangle(40.0, 20.0);
        assert_relative_eq!(rect.bbox().width(), 40.0);
        assert_relative_eq!(rect.bbox().height(), 20.0);
        assert_relative_eq!(rect.area(), 800.0, epsilon = 1e-9);
    }

    #[test]
    fn test_centroid() {
        let rect = Polygon::rectangle(10.0, 10.0);
        let c = rect.centroid();
        assert_relative_eq!(c.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(c.y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_best_direction_of_long_rectangle() {
        let rect = Polygon::rectangle(100.0, 10.0);
        assert_relative_eq!(rect.best_direction_deg(), 0.0, epsilon = 1e-9);

        let tall = Polygon::rectangle(10.0, 100.0);
        assert_relative_eq!(tall.best_direction_deg(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_modular_indexing() {
        let rect = Polygon::rectangle(10.0, 10.0);
        assert_eq!(rect.wrap(-1), 3);
        assert_eq!(rect.wrap(4), 0);
        assert_relative_eq!(rect.at(-1).y, 10.0);
    }

    #[test]
    fn test_cyclic_iteration_both_directions() {
        let rect = Polygon::rectangle(10.0, 10.0);
        let fwd: Vec<usize> = rect.iter_cyclic(3, 1, 1).collect();
        assert_eq!(fwd, vec![3, 0, 1]);
        let back: Vec<usize> = rect.iter_cyclic(1, 3, -1).collect();
        assert_eq!(back, vec![1, 0, 3]);
        let single: Vec<usize> = rect.iter_cyclic(2, 2, 1).collect();
        assert_eq!(single, vec![2]);
    }

    #[test]
    fn test_distance_between_edges() {
        let rect = Polygon::rectangle(10.0, 20.0);
        // edges: 0 bottom (10), 1 right (20), 2 top (10), 3 left (20)
        assert_relative_eq!(rect.distance_between_edges(0, 2, 1).unwrap(), 30.0);
        assert_relative_eq!(rect.distance_between_edges(2, 0, -1).unwrap(), 30.0);
        assert_relative_eq!(rect.distance_between_edges(1, 1, 1).unwrap(), 0.0);
    }

    #[test]
    fn test_segment_intersection() {
        let p = segment_intersection(
            &Point::new(0.0, 0.0),
            &Point::new(10.0, 0.0),
            &Point::new(5.0, -5.0),
            &Point::new(5.0, 5.0),
        )
        .unwrap();
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-9);

        assert!(segment_intersection(
            &Point::new(0.0, 0.0),
            &Point::new(10.0, 0.0),
            &Point::new(0.0, 1.0),
            &Point::new(10.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn test_contains_and_boundary_distance() {
        let rect = Polygon::rectangle(10.0, 10.0);
        assert!(rect.contains(&Point::new(5.0, 5.0)));
        assert!(!rect.contains(&Point::new(15.0, 5.0)));
        assert_relative_eq!(rect.distance_to_boundary(&Point::new(5.0, 1.0)), 1.0);
    }

    #[test]
    fn test_validate_rejects_degenerate() {
        assert!(Polygon::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)])
            .validate()
            .is_err());
        assert!(Polygon::rectangle(10.0, 10.0).validate().is_ok());
    }

    #[test]
    fn test_rotated_recomputes_data() {
        let rect = Polygon::rectangle(100.0, 10.0);
        let rotated = rect.rotated(std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(rotated.best_direction_deg(), 90.0, epsilon = 1e-9);
        assert_relative_eq!(rotated.bbox().width(), 10.0, epsilon = 1e-9);
    }
}
