use crate::geom::point::Point;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    /// Bounding box holding all points `pts`. Returns `None` for an empty slice.
    pub fn from_points(pts: &[Point]) -> Option<Self> {
        let first = pts.first()?;
        let (min, max) = pts.iter().skip(1).fold((*first, *first), |(lo, hi), p| {
            (
                Point::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        });
        Some(Self { min, max })
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_points() {
        let pts = vec![
            Point::new(1., -2., 0.),
            Point::new(-1., 4., 3.),
            Point::new(0., 0., -1.),
        ];
        let bbox = BBox::from_points(&pts).unwrap();
        assert!(bbox.min.is_close(&Point::new(-1., -2., -1.)));
        assert!(bbox.max.is_close(&Point::new(1., 4., 3.)));
        assert!(bbox.center().is_close(&Point::new(0., 1., 1.)));
        assert!(BBox::from_points(&[]).is_none());
    }
}
