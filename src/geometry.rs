// src/geometry.rs
//
// Pixel-space geometry used by the rule evaluators. Integer inputs, exact
// arithmetic for containment, f64 for distances.

use anyhow::{bail, Result};

pub type Point = (i32, i32);

/// Euclidean distance between two pixel points.
pub fn distance(p1: Point, p2: Point) -> f64 {
    let dx = (p2.0 - p1.0) as f64;
    let dy = (p2.1 - p1.1) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Point-in-polygon via the crossing-number test. Boundary points count as
/// inside, matching the >= 0 convention the rules rely on.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let (px, py) = point;
    let mut inside = false;

    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];

        if on_segment(point, a, b) {
            return true;
        }

        // Edge crosses the horizontal ray from the point?
        if (a.1 > py) != (b.1 > py) {
            // x of the edge at height py, kept in exact integer arithmetic:
            // px < ax + (py - ay) * (bx - ax) / (by - ay)
            let lhs = (px - a.0) as i64 * (b.1 - a.1) as i64;
            let rhs = (py - a.1) as i64 * (b.0 - a.0) as i64;
            let crosses = if b.1 > a.1 { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }
    }

    inside
}

/// True if the point lies within `buffer` pixels of the segment's bounding
/// span on both axes. A box test, not perpendicular distance — the stop
/// line is axis-aligned in practice.
pub fn near_segment(point: Point, seg_a: Point, seg_b: Point, buffer: i32) -> bool {
    let (px, py) = point;
    let y_ok = py >= seg_a.1.min(seg_b.1) - buffer && py <= seg_a.1.max(seg_b.1) + buffer;
    let x_ok = px >= seg_a.0.min(seg_b.0) - buffer && px <= seg_a.0.max(seg_b.0) + buffer;
    y_ok && x_ok
}

/// Validate a configured polygon: at least 3 vertices, non-zero area, no
/// self-intersection. A bad polygon invalidates every later containment
/// test, so this is checked once at engine construction and is fatal.
pub fn validate_polygon(polygon: &[Point]) -> Result<()> {
    if polygon.len() < 3 {
        bail!("polygon has {} vertices, need at least 3", polygon.len());
    }

    if signed_area2(polygon) == 0 {
        bail!("polygon is degenerate (zero area)");
    }

    let n = polygon.len();
    for i in 0..n {
        let (a1, a2) = (polygon[i], polygon[(i + 1) % n]);
        for j in (i + 1)..n {
            // Skip edges sharing a vertex with edge i.
            if (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let (b1, b2) = (polygon[j], polygon[(j + 1) % n]);
            if segments_intersect(a1, a2, b1, b2) {
                bail!(
                    "polygon is self-intersecting (edge {}-{} crosses edge {}-{})",
                    i,
                    (i + 1) % n,
                    j,
                    (j + 1) % n
                );
            }
        }
    }

    Ok(())
}

/// Twice the signed area of the polygon (shoelace).
fn signed_area2(polygon: &[Point]) -> i64 {
    let mut acc: i64 = 0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        acc += a.0 as i64 * b.1 as i64 - b.0 as i64 * a.1 as i64;
    }
    acc
}

fn cross(o: Point, a: Point, b: Point) -> i64 {
    (a.0 - o.0) as i64 * (b.1 - o.1) as i64 - (a.1 - o.1) as i64 * (b.0 - o.0) as i64
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    cross(a, b, p) == 0
        && p.0 >= a.0.min(b.0)
        && p.0 <= a.0.max(b.0)
        && p.1 >= a.1.min(b.1)
        && p.1 <= a.1.max(b.1)
}

/// Proper or touching intersection of two closed segments.
fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    if ((d1 > 0 && d2 < 0) || (d1 < 0 && d2 > 0)) && ((d3 > 0 && d4 < 0) || (d3 < 0 && d4 > 0)) {
        return true;
    }

    (d1 == 0 && on_segment(a1, b1, b2))
        || (d2 == 0 && on_segment(a2, b1, b2))
        || (d3 == 0 && on_segment(b1, a1, a2))
        || (d4 == 0 && on_segment(b2, a1, a2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![(0, 0), (10, 0), (10, 10), (0, 10)]
    }

    #[test]
    fn test_point_inside_polygon() {
        assert!(point_in_polygon((5, 5), &square()));
        assert!(!point_in_polygon((15, 5), &square()));
        assert!(!point_in_polygon((-1, 5), &square()));
    }

    #[test]
    fn test_boundary_counts_as_inside() {
        assert!(point_in_polygon((0, 5), &square())); // on edge
        assert!(point_in_polygon((10, 10), &square())); // on vertex
        assert!(point_in_polygon((5, 0), &square()));
    }

    #[test]
    fn test_concave_polygon() {
        // An L shape. (6, 6) is in the notch, outside the polygon.
        let l_shape = vec![(0, 0), (10, 0), (10, 4), (4, 4), (4, 10), (0, 10)];
        assert!(point_in_polygon((2, 8), &l_shape));
        assert!(point_in_polygon((8, 2), &l_shape));
        assert!(!point_in_polygon((6, 6), &l_shape));
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance((0, 0), (3, 4)), 5.0);
        assert_eq!(distance((1, 1), (1, 1)), 0.0);
    }

    #[test]
    fn test_near_segment_buffered() {
        // Horizontal stop line at y=700.
        let a = (100, 700);
        let b = (900, 700);
        assert!(near_segment((500, 700), a, b, 20));
        assert!(near_segment((500, 719), a, b, 20));
        assert!(near_segment((500, 681), a, b, 20));
        assert!(!near_segment((500, 721), a, b, 20));
        assert!(near_segment((85, 700), a, b, 20)); // x buffer applies too
        assert!(!near_segment((50, 700), a, b, 20));
    }

    #[test]
    fn test_validate_accepts_simple_polygon() {
        assert!(validate_polygon(&square()).is_ok());
    }

    #[test]
    fn test_validate_rejects_too_few_vertices() {
        assert!(validate_polygon(&[(0, 0), (1, 1)]).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_area() {
        assert!(validate_polygon(&[(0, 0), (5, 5), (10, 10)]).is_err());
    }

    #[test]
    fn test_validate_rejects_self_intersection() {
        // Bowtie: edges 0-1 and 2-3 cross.
        let bowtie = vec![(0, 0), (10, 10), (10, 0), (0, 10)];
        assert!(validate_polygon(&bowtie).is_err());
    }
}
