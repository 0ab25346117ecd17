//! Planar Delaunay triangulation of small point sets
//!
//! The dual builder hands each Voronoi cell's circumcenters to this module
//! after projecting them into the cell's tangent plane. Cell polygons are
//! tiny (usually 5 to 8 vertices), so the triangulator favors simple,
//! predictable code paths over asymptotic cleverness:
//!
//! - 3 points: the single triangle
//! - up to 6 points: angular sort around the centroid, then a fan
//! - more: incremental insertion followed by budget-capped Lawson flips

use glam::Vec2;

use crate::error::{PlanetError, Result};

/// Orientation / containment tolerance in plane units
const EPSILON: f32 = 1.0e-7;

/// Lawson flip budget multiplier (flips allowed per triangle)
const FLIP_BUDGET_FACTOR: usize = 3;

/// Triangulate a planar point set into counter-clockwise index triples
///
/// # Errors
///
/// `DegenerateGeometry` if fewer than 3 points are supplied or all points
/// are collinear.
pub(crate) fn triangulate(points: &[Vec2]) -> Result<Vec<[usize; 3]>> {
    match points.len() {
        0..=2 => Err(PlanetError::DegenerateGeometry(format!(
            "triangulation requires at least 3 points, got {}",
            points.len()
        ))),
        3 => {
            if signed_area(points[0], points[1], points[2]).abs() < EPSILON {
                return Err(PlanetError::DegenerateGeometry(
                    "triangulation input is collinear".into(),
                ));
            }
            Ok(vec![ccw([0, 1, 2], points)])
        }
        4..=6 => Ok(fan_triangulate(points)),
        _ => incremental_triangulate(points),
    }
}

/// Twice the signed area of the triangle a-b-c (positive when CCW)
#[inline]
fn signed_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Reorder a triple so its winding is counter-clockwise
#[inline]
fn ccw(tri: [usize; 3], points: &[Vec2]) -> [usize; 3] {
    if signed_area(points[tri[0]], points[tri[1]], points[tri[2]]) < 0.0 {
        [tri[0], tri[2], tri[1]]
    } else {
        tri
    }
}

/// True when p lies strictly inside the circumcircle of the CCW triangle a-b-c
fn in_circumcircle(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    let (ax, ay) = ((a - p).x, (a - p).y);
    let (bx, by) = ((b - p).x, (b - p).y);
    let (cx, cy) = ((c - p).x, (c - p).y);

    let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
        - (bx * bx + by * by) * (ax * cy - cx * ay)
        + (cx * cx + cy * cy) * (ax * by - bx * ay);
    det > EPSILON
}

/// Sort indices by angle around the centroid and fan from the first
fn fan_triangulate(points: &[Vec2]) -> Vec<[usize; 3]> {
    let order = angular_order(points);
    (1..order.len() - 1)
        .map(|i| ccw([order[0], order[i], order[i + 1]], points))
        .collect()
}

/// Indices sorted counter-clockwise around the centroid
pub(crate) fn angular_order(points: &[Vec2]) -> Vec<usize> {
    let centroid = points.iter().copied().sum::<Vec2>() / points.len() as f32;
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        let ai = (points[i] - centroid).y.atan2((points[i] - centroid).x);
        let aj = (points[j] - centroid).y.atan2((points[j] - centroid).x);
        ai.partial_cmp(&aj).unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

/// Incremental insertion: seed triangle, then one point at a time
///
/// Interior points split their containing triangle in three; exterior
/// points connect to every hull edge they can see. A final Lawson pass
/// flips non-Delaunay edges until convergence or until the flip budget
/// runs out (the partial result is still a valid triangulation).
fn incremental_triangulate(points: &[Vec2]) -> Result<Vec<[usize; 3]>> {
    // Seed: first two points plus the first point not collinear with them
    let third = (2..points.len())
        .find(|&i| signed_area(points[0], points[1], points[i]).abs() > EPSILON)
        .ok_or_else(|| {
            PlanetError::DegenerateGeometry("triangulation input is collinear".into())
        })?;

    let mut triangles = vec![ccw([0, 1, third], points)];
    let mut remaining: Vec<usize> = (2..points.len()).filter(|&i| i != third).collect();

    // Insert the rest in angular order so exterior insertion dominates
    let order = angular_order(points);
    let mut rank = vec![0usize; points.len()];
    for (position, &index) in order.iter().enumerate() {
        rank[index] = position;
    }
    remaining.sort_by_key(|&i| rank[i]);

    for point in remaining {
        insert_point(point, points, &mut triangles);
    }

    lawson_flips(points, &mut triangles);
    Ok(triangles)
}

fn insert_point(index: usize, points: &[Vec2], triangles: &mut Vec<[usize; 3]>) {
    let p = points[index];

    // Interior case: split the containing triangle in three
    if let Some(t) = triangles.iter().position(|&[a, b, c]| {
        signed_area(points[a], points[b], p) >= -EPSILON
            && signed_area(points[b], points[c], p) >= -EPSILON
            && signed_area(points[c], points[a], p) >= -EPSILON
    }) {
        let [a, b, c] = triangles.swap_remove(t);
        for tri in [[a, b, index], [b, c, index], [c, a, index]] {
            if signed_area(points[tri[0]], points[tri[1]], points[tri[2]]).abs() > EPSILON {
                triangles.push(ccw(tri, points));
            }
        }
        return;
    }

    // Exterior case: connect to every visible hull edge
    let hull = boundary_edges(triangles);
    for (a, b) in hull {
        // A CCW triangulation keeps its interior left of each hull edge,
        // so the edge is visible from p when p sits on the right.
        if signed_area(points[a], points[b], p) < -EPSILON {
            triangles.push(ccw([a, b, index], points));
        }
    }
}

/// Directed edges that appear in exactly one triangle, in triangle winding
fn boundary_edges(triangles: &[[usize; 3]]) -> Vec<(usize, usize)> {
    let mut edges: Vec<(usize, usize)> = Vec::new();
    for &[a, b, c] in triangles {
        for (from, to) in [(a, b), (b, c), (c, a)] {
            if let Some(i) = edges.iter().position(|&(f, t)| f == to && t == from) {
                edges.swap_remove(i);
            } else {
                edges.push((from, to));
            }
        }
    }
    edges
}

/// Flip non-Delaunay interior edges until convergence or budget exhaustion
fn lawson_flips(points: &[Vec2], triangles: &mut Vec<[usize; 3]>) {
    let mut budget = triangles.len() * FLIP_BUDGET_FACTOR;

    loop {
        let Some((t, u, shared)) = find_flippable(points, triangles) else {
            return;
        };
        if budget == 0 {
            log::debug!(
                "flip budget exhausted with {} triangles; keeping partial result",
                triangles.len()
            );
            return;
        }
        budget -= 1;

        let (a, b) = shared;
        let c = opposite(triangles[t], a, b);
        let d = opposite(triangles[u], a, b);
        triangles[t] = ccw([a, c, d], points);
        triangles[u] = ccw([b, c, d], points);
    }
}

/// First interior edge whose opposite point violates the in-circle test
fn find_flippable(
    points: &[Vec2],
    triangles: &[[usize; 3]],
) -> Option<(usize, usize, (usize, usize))> {
    for t in 0..triangles.len() {
        let [a, b, c] = triangles[t];
        for (x, y) in [(a, b), (b, c), (c, a)] {
            let Some(u) = (t + 1..triangles.len())
                .find(|&u| triangles[u].contains(&x) && triangles[u].contains(&y))
            else {
                continue;
            };
            let d = opposite(triangles[u], x, y);
            let o = opposite(triangles[t], x, y);
            let [ta, tb, tc] = ccw([x, y, o], points);
            if in_circumcircle(points[ta], points[tb], points[tc], points[d]) {
                // The quad is convex exactly when x and y straddle the
                // candidate diagonal o-d; flipping otherwise would overlap.
                let side_x = signed_area(points[o], points[d], points[x]);
                let side_y = signed_area(points[o], points[d], points[y]);
                if side_x * side_y < -EPSILON {
                    return Some((t, u, (x, y)));
                }
            }
        }
    }
    None
}

#[inline]
fn opposite(tri: [usize; 3], a: usize, b: usize) -> usize {
    *tri.iter().find(|&&v| v != a && v != b).unwrap_or(&tri[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_all_ccw(points: &[Vec2], triangles: &[[usize; 3]]) {
        for &[a, b, c] in triangles {
            assert!(
                signed_area(points[a], points[b], points[c]) > 0.0,
                "triangle [{a}, {b}, {c}] is not counter-clockwise"
            );
        }
    }

    #[test]
    fn test_too_few_points_is_degenerate() {
        let points = [Vec2::ZERO, Vec2::X];
        assert!(matches!(
            triangulate(&points),
            Err(PlanetError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_collinear_points_is_degenerate() {
        let points = [Vec2::ZERO, Vec2::X, Vec2::X * 2.0];
        assert!(matches!(
            triangulate(&points),
            Err(PlanetError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_three_points_single_triangle() {
        let points = [Vec2::ZERO, Vec2::X, Vec2::Y];
        let triangles = triangulate(&points).unwrap();
        assert_eq!(triangles.len(), 1);
        assert_all_ccw(&points, &triangles);
    }

    #[test]
    fn test_fan_hexagon() {
        let points: Vec<Vec2> = (0..6)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 6.0;
                Vec2::new(angle.cos(), angle.sin())
            })
            .collect();

        let triangles = triangulate(&points).unwrap();
        assert_eq!(triangles.len(), 4);
        assert_all_ccw(&points, &triangles);
    }

    #[test]
    fn test_incremental_octagon() {
        let points: Vec<Vec2> = (0..8)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 8.0;
                Vec2::new(angle.cos(), angle.sin())
            })
            .collect();

        let triangles = triangulate(&points).unwrap();
        // A triangulated convex polygon with n vertices has n - 2 triangles
        assert_eq!(triangles.len(), 6);
        assert_all_ccw(&points, &triangles);
    }

    #[test]
    fn test_incremental_with_interior_point() {
        let mut points: Vec<Vec2> = (0..8)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 8.0;
                Vec2::new(angle.cos(), angle.sin())
            })
            .collect();
        points.push(Vec2::ZERO);

        let triangles = triangulate(&points).unwrap();
        // n boundary + 1 interior: 2 * 9 - 2 - 8 = 8 triangles
        assert_eq!(triangles.len(), 8);
        assert_all_ccw(&points, &triangles);

        // The interior point must appear in the triangulation
        assert!(triangles.iter().any(|t| t.contains(&8)));
    }

    #[test]
    fn test_triangulation_covers_polygon_area() {
        let points: Vec<Vec2> = (0..7)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 7.0;
                Vec2::new(angle.cos(), angle.sin())
            })
            .collect();

        let triangles = triangulate(&points).unwrap();
        let total: f32 = triangles
            .iter()
            .map(|&[a, b, c]| signed_area(points[a], points[b], points[c]) * 0.5)
            .sum();

        // Area of a regular 7-gon with unit circumradius
        let expected = 7.0 / 2.0 * (std::f32::consts::TAU / 7.0).sin();
        assert!((total - expected).abs() < 1.0e-4);
    }

    #[test]
    fn test_delaunay_property_on_square() {
        // The short diagonal of this quad is the Delaunay choice
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 0.5),
            Vec2::new(1.0, -0.4),
            Vec2::new(1.0, 1.4),
        ];

        let triangles = triangulate(&points).unwrap();
        assert_all_ccw(&points, &triangles);

        // No point may fall strictly inside any triangle's circumcircle
        for &[a, b, c] in &triangles {
            for (i, &p) in points.iter().enumerate() {
                if i == a || i == b || i == c {
                    continue;
                }
                assert!(
                    !in_circumcircle(points[a], points[b], points[c], p),
                    "point {i} violates the circumcircle of [{a}, {b}, {c}]"
                );
            }
        }
    }
}
