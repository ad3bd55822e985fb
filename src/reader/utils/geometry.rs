use std::ops::{Add, Mul, Sub};

// Point
//------------------------------------------------------------------------------

// Sub-pixel position in image space. Pixel (x, y) covers [x, x + 1) x [y, y + 1)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dist(&self, other: &Point) -> f64 {
        (*self - *other).norm()
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    // Z component of the cross product. Positive when `other` is clockwise from
    // `self` in image coordinates, where y grows downward
    pub fn cross(&self, other: &Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    // Pixel containing the point
    pub fn pixel(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Self::Output {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Self::Output {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

#[cfg(test)]
mod point_tests {
    use super::Point;

    #[test]
    fn test_point_ops() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(4.0, 6.0);
        assert_eq!(b - a, Point::new(3.0, 4.0));
        assert_eq!(a + b, Point::new(5.0, 8.0));
        assert_eq!(a * 2.0, Point::new(2.0, 4.0));
        assert_eq!(a.dist(&b), 5.0);
        assert_eq!(Point::new(3.7, -0.2).pixel(), (3, -1));
    }

    #[test]
    fn test_cross_orientation() {
        // Top left to top right, then top left to bottom left
        let right = Point::new(10.0, 0.0);
        let down = Point::new(0.0, 10.0);
        assert!(right.cross(&down) > 0.0);
        assert!(down.cross(&right) < 0.0);
        assert_eq!(right.dot(&down), 0.0);
    }
}

// Scan axis
//------------------------------------------------------------------------------

pub trait Axis {
    // Moves the pixel position by `d` along the axis
    fn shift(pos: &mut (i32, i32), d: i32);

    // Position along the axis
    fn along(pos: &(i32, i32)) -> i32;
}

pub struct X;
impl Axis for X {
    #[inline]
    fn shift(pos: &mut (i32, i32), d: i32) {
        pos.0 += d;
    }

    #[inline]
    fn along(pos: &(i32, i32)) -> i32 {
        pos.0
    }
}

pub struct Y;
impl Axis for Y {
    #[inline]
    fn shift(pos: &mut (i32, i32), d: i32) {
        pos.1 += d;
    }

    #[inline]
    fn along(pos: &(i32, i32)) -> i32 {
        pos.1
    }
}
