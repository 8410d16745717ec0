/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 02/09/2026
Last Modified: 29/09/2026
License: MIT
*/

use geo::{BoundingRect, Coord, Geometry, Polygon, Rect};
use rstar::AABB;

/// Axis-aligned box used for the coarse candidate filters ahead of the exact
/// geometry predicates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> BoundingBox {
        let (x1, x2) = if min_x < max_x {
            (min_x, max_x)
        } else {
            (max_x, min_x)
        };
        let (y1, y2) = if min_y < max_y {
            (min_y, max_y)
        } else {
            (max_y, min_y)
        };
        BoundingBox {
            min_x: x1,
            min_y: y1,
            max_x: x2,
            max_y: y2,
        }
    }

    /// The bounding box of a geometry, or `None` for an empty geometry.
    pub fn from_geometry(geom: &Geometry<f64>) -> Option<BoundingBox> {
        geom.bounding_rect().map(BoundingBox::from)
    }

    /// The combined box of a sequence of geometries. Empty geometries are ignored.
    pub fn from_geometries<'a, I>(geoms: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a Geometry<f64>>,
    {
        let mut ret: Option<BoundingBox> = None;
        for g in geoms {
            if let Some(bb) = BoundingBox::from_geometry(g) {
                match ret.as_mut() {
                    Some(r) => r.expand_to(bb),
                    None => ret = Some(bb),
                }
            }
        }
        ret
    }


    pub fn overlaps(&self, other: BoundingBox) -> bool {
        !(self.max_y < other.min_y
            || self.max_x < other.min_x
            || self.min_y > other.max_y
            || self.min_x > other.max_x)
    }


    pub fn expand_to(&mut self, other: BoundingBox) {
        self.max_y = self.max_y.max(other.max_y);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.min_x = self.min_x.min(other.min_x);
    }

    pub fn expand_by(&mut self, value: f64) {
        self.max_y += value;
        self.max_x += value;
        self.min_y -= value;
        self.min_x -= value;
    }

    /// Returns an expanded copy, leaving `self` untouched.
    pub fn expanded(&self, value: f64) -> BoundingBox {
        let mut bb = *self;
        bb.expand_by(value);
        bb
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            Coord { x: self.min_x, y: self.min_y },
            Coord { x: self.max_x, y: self.max_y },
        )
        .to_polygon()
    }

    pub fn to_aabb(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(r: Rect<f64>) -> BoundingBox {
        BoundingBox::new(r.min().x, r.max().x, r.min().y, r.max().y)
    }
}
