/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 03/09/2026
Last Modified: 08/10/2026
License: MIT
*/

use geo::Geometry;
use mapchange_common::structures::BoundingBox;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Int(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldData::Int(v) => write!(f, "{}", v),
            FieldData::Real(v) => write!(f, "{}", v),
            FieldData::Text(v) => write!(f, "{}", v),
            FieldData::Bool(v) => write!(f, "{}", v),
            FieldData::Null => write!(f, "null"),
        }
    }
}

/// One geometry plus its attributes. An absent geometry is stored as an
/// empty geometry collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub attributes: BTreeMap<String, FieldData>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Feature {
        Feature {
            geometry,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attributes(geometry: Geometry<f64>, attributes: BTreeMap<String, FieldData>) -> Feature {
        Feature { geometry, attributes }
    }

    pub fn get_attribute(&self, name: &str) -> Option<&FieldData> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: FieldData) {
        self.attributes.insert(name.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        match &self.geometry {
            Geometry::GeometryCollection(gc) => gc.0.is_empty(),
            _ => false,
        }
    }
}

pub fn geometry_type_name(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// An ordered set of features sharing one coordinate reference system. The
/// CRS may be unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub crs: Option<String>,
}

impl FeatureCollection {
    pub fn new(crs: Option<String>) -> FeatureCollection {
        FeatureCollection {
            features: vec![],
            crs,
        }
    }

    pub fn from_features(features: Vec<Feature>, crs: Option<String>) -> FeatureCollection {
        FeatureCollection { features, crs }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn geometries(&self) -> impl Iterator<Item = &Geometry<f64>> {
        self.features.iter().map(|f| &f.geometry)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_geometries(self.geometries())
    }

    /// A collection holding only the feature at `index`, with the same CRS.
    pub fn single(&self, index: usize) -> FeatureCollection {
        FeatureCollection {
            features: self.features.get(index).cloned().into_iter().collect(),
            crs: self.crs.clone(),
        }
    }

    /// Adopts the CRS of `other` when this collection has none.
    pub fn inherit_crs(&mut self, other: &FeatureCollection) {
        if self.crs.is_none() {
            self.crs = other.crs.clone();
        }
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geo::{point, GeometryCollection};

    #[test]
    fn crs_is_inherited_only_when_missing() {
        let typed = FeatureCollection::new(Some("EPSG:4490".to_string()));
        let mut untyped = FeatureCollection::new(None);
        untyped.inherit_crs(&typed);
        assert_eq!(untyped.crs.as_deref(), Some("EPSG:4490"));

        let mut other = FeatureCollection::new(Some("EPSG:3857".to_string()));
        other.inherit_crs(&typed);
        assert_eq!(other.crs.as_deref(), Some("EPSG:3857"));
    }

    #[test]
    fn single_keeps_attributes_and_crs() {
        let mut fc = FeatureCollection::new(Some("EPSG:4326".to_string()));
        for i in 0..3 {
            let mut f = Feature::new(Geometry::Point(point!(x: i as f64, y: 0.0)));
            f.set_attribute("ID", FieldData::Int(i));
            fc.push(f);
        }
        let one = fc.single(1);
        assert_eq!(one.len(), 1);
        assert_eq!(one.features[0].get_attribute("ID"), Some(&FieldData::Int(1)));
        assert_eq!(one.crs, fc.crs);
        assert!(fc.single(7).is_empty());
    }

    #[test]
    fn empty_geometry_collection_is_an_empty_feature() {
        let f = Feature::new(Geometry::GeometryCollection(GeometryCollection(vec![])));
        assert!(f.is_empty());
        assert_eq!(geometry_type_name(&f.geometry), "GeometryCollection");
    }
}
