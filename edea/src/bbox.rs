//! Upright 2D bounding boxes.

use std::fmt;

use serde::Serialize;

use crate::parser::shapes::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

/// Axis-aligned box around a set of points; empty until the first point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    bounds: Option<Bounds>,
}

impl BoundingBox {
    pub fn new(points: &[Point]) -> Self {
        let mut bbox = Self::empty();
        bbox.envelop(points);
        bbox
    }

    pub fn empty() -> Self {
        Self { bounds: None }
    }

    /// Grow the box so it also contains `points`.
    pub fn envelop(&mut self, points: &[Point]) {
        for &(x, y) in points {
            self.bounds = Some(match self.bounds {
                None => Bounds {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => Bounds {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            });
        }
    }

    /// Grow the box so it also contains `other`.
    pub fn union(&mut self, other: &BoundingBox) {
        if let Some(corners) = other.corners() {
            self.envelop(&corners);
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        if let Some(b) = self.bounds.as_mut() {
            b.min_x += dx;
            b.max_x += dx;
            b.min_y += dy;
            b.max_y += dy;
        }
    }

    /// Rotate the box about the origin by `degrees` and re-envelop the corners.
    pub fn rotate(&mut self, degrees: f64) {
        let Some(corners) = self.corners() else {
            return;
        };
        let rotated: Vec<Point> = corners.iter().map(|&p| rotate_point(p, degrees)).collect();
        *self = Self::new(&rotated);
    }

    /// `[min_x,min_y]`, `[min_x,max_y]`, `[max_x,max_y]`, `[max_x,min_y]`.
    pub fn corners(&self) -> Option<[Point; 4]> {
        self.bounds.map(|b| {
            [
                (b.min_x, b.min_y),
                (b.min_x, b.max_y),
                (b.max_x, b.max_y),
                (b.max_x, b.min_y),
            ]
        })
    }

    pub fn is_valid(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn min(&self) -> Option<Point> {
        self.bounds.map(|b| (b.min_x, b.min_y))
    }

    pub fn max(&self) -> Option<Point> {
        self.bounds.map(|b| (b.max_x, b.max_y))
    }

    pub fn width(&self) -> f64 {
        self.bounds.map_or(0.0, |b| b.max_x - b.min_x)
    }

    pub fn height(&self) -> f64 {
        self.bounds.map_or(0.0, |b| b.max_y - b.min_y)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Option<Point> {
        self.bounds
            .map(|b| (b.min_x + (b.max_x - b.min_x) / 2.0, b.min_y + (b.max_y - b.min_y) / 2.0))
    }
}

/// Rotation about the origin the way KiCad applies it: counter-clockwise on
/// screen, with the y axis pointing down. Angle in degrees.
pub fn rotate_point((x, y): Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (x * cos + y * sin, y * cos - x * sin)
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            None => write!(f, "boundingbox empty"),
            Some(b) => write!(
                f,
                "boundingbox([{:.3}, {:.3}] -> [{:.3}, {:.3}])",
                b.min_x, b.min_y, b.max_x, b.max_y
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_box() {
        let bbox = BoundingBox::empty();
        assert!(!bbox.is_valid());
        assert_eq!(bbox.width(), 0.0);
        assert_eq!(bbox.area(), 0.0);
        assert!(bbox.corners().is_none());
        assert!(bbox.center().is_none());
        assert_eq!(bbox.to_string(), "boundingbox empty");
    }

    #[test]
    fn test_envelop_and_dimensions() {
        let mut bbox = BoundingBox::new(&[(1.0, 2.0), (4.0, -1.0)]);
        assert_eq!(bbox.width(), 3.0);
        assert_eq!(bbox.height(), 3.0);

        bbox.envelop(&[(-1.0, 5.0)]);
        assert_eq!(bbox.min(), Some((-1.0, -1.0)));
        assert_eq!(bbox.max(), Some((4.0, 5.0)));
        assert_eq!(bbox.area(), 30.0);
        assert_eq!(bbox.center(), Some((1.5, 2.0)));
    }

    #[test]
    fn test_envelop_with_nothing_keeps_empty() {
        let mut bbox = BoundingBox::empty();
        bbox.envelop(&[]);
        assert!(!bbox.is_valid());
    }

    #[test]
    fn test_translate() {
        let mut bbox = BoundingBox::new(&[(0.0, 0.0), (2.0, 1.0)]);
        bbox.translate(10.0, -5.0);
        assert_eq!(bbox.min(), Some((10.0, -5.0)));
        assert_eq!(bbox.max(), Some((12.0, -4.0)));

        let mut empty = BoundingBox::empty();
        empty.translate(1.0, 1.0);
        assert!(!empty.is_valid());
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let mut bbox = BoundingBox::new(&[(0.0, 0.0), (4.0, 2.0)]);
        bbox.rotate(90.0);
        let (min_x, min_y) = bbox.min().unwrap();
        let (max_x, max_y) = bbox.max().unwrap();
        assert!(approx(min_x, 0.0));
        assert!(approx(min_y, -4.0));
        assert!(approx(max_x, 2.0));
        assert!(approx(max_y, 0.0));
        assert!(approx(bbox.area(), 8.0));
    }

    #[test]
    fn test_rotate_point_y_down() {
        let (x, y) = rotate_point((2.0, 0.0), 90.0);
        assert!(approx(x, 0.0));
        assert!(approx(y, -2.0));

        let (x, y) = rotate_point((0.0, 1.0), 90.0);
        assert!(approx(x, 1.0));
        assert!(approx(y, 0.0));
    }

    #[test]
    fn test_union() {
        let mut a = BoundingBox::new(&[(0.0, 0.0), (1.0, 1.0)]);
        a.union(&BoundingBox::new(&[(3.0, 3.0), (4.0, 5.0)]));
        a.union(&BoundingBox::empty());
        assert_eq!(a.max(), Some((4.0, 5.0)));
        assert_eq!(a.min(), Some((0.0, 0.0)));
    }

    #[test]
    fn test_display() {
        let bbox = BoundingBox::new(&[(0.0, 0.5), (12.25, 3.0)]);
        assert_eq!(bbox.to_string(), "boundingbox([0.000, 0.500] -> [12.250, 3.000])");
    }
}
