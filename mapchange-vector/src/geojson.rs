/*
This code is part of the MapChange geospatial editing tools.
Authors: MapChange contributors
Created: 04/09/2026
Last Modified: 18/10/2026
License: MIT

Notes: GeoJSON (RFC 7946) reading and writing for feature collections. A named
CRS is carried in the legacy `crs` member so that projected data keeps its
coordinate system across a round trip.
*/

use crate::feature::{Feature, FeatureCollection, FieldData};
use ::geojson::{GeoJson, JsonObject, Value as GeoValue};
use geo::{Geometry, GeometryCollection};
use mapchange_common::{MapChangeError, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::convert::TryFrom;

/// Parses the text of a GeoJSON FeatureCollection.
pub fn from_geojson_str(text: &str) -> Result<FeatureCollection> {
    let root: GeoJson = serde_json::from_str(text)?;
    let fc = match root {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => {
            return Err(MapChangeError::InvalidData(
                "expected a FeatureCollection, found Feature".to_string(),
            ))
        }
        GeoJson::Geometry(_) => {
            return Err(MapChangeError::InvalidData(
                "expected a FeatureCollection, found a bare geometry".to_string(),
            ))
        }
    };

    let crs = fc
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let mut collection = FeatureCollection::new(crs);
    for (i, f) in fc.features.into_iter().enumerate() {
        let geometry = match f.geometry {
            Some(g) => to_geometry(g)
                .map_err(|e| MapChangeError::InvalidData(format!("feature {}: {}", i + 1, e)))?,
            None => Geometry::GeometryCollection(GeometryCollection(vec![])),
        };
        let mut attributes = BTreeMap::new();
        if let Some(props) = f.properties {
            for (k, v) in props {
                attributes.insert(k, to_field_data(&v));
            }
        }
        collection.push(Feature::with_attributes(geometry, attributes));
    }
    Ok(collection)
}

pub fn to_geojson_string(collection: &FeatureCollection) -> Result<String> {
    let features = collection
        .features
        .iter()
        .map(|f| ::geojson::Feature {
            bbox: None,
            geometry: if f.is_empty() {
                None
            } else {
                Some(::geojson::Geometry::new(GeoValue::from(&f.geometry)))
            },
            id: None,
            properties: Some(
                f.attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), from_field_data(v)))
                    .collect::<JsonObject>(),
            ),
            foreign_members: None,
        })
        .collect();
    let foreign_members = collection.crs.as_ref().map(|name| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            json!({ "type": "name", "properties": { "name": name } }),
        );
        members
    });
    let root = GeoJson::FeatureCollection(::geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    });
    Ok(serde_json::to_string(&root)?)
}

/// Converts a parsed geometry, rejecting positions with fewer than two
/// ordinates before `geo` indexes into them.
fn to_geometry(geometry: ::geojson::Geometry) -> std::result::Result<Geometry<f64>, String> {
    check_positions(&geometry.value)?;
    Geometry::<f64>::try_from(geometry).map_err(|e| e.to_string())
}

fn check_positions(value: &GeoValue) -> std::result::Result<(), String> {
    fn check(p: &[f64]) -> std::result::Result<(), String> {
        if p.len() < 2 {
            return Err(format!("position with {} ordinates", p.len()));
        }
        Ok(())
    }
    match value {
        GeoValue::Point(p) => check(p),
        GeoValue::MultiPoint(ps) | GeoValue::LineString(ps) => ps.iter().try_for_each(|p| check(p)),
        GeoValue::MultiLineString(ls) | GeoValue::Polygon(ls) => {
            ls.iter().flatten().try_for_each(|p| check(p))
        }
        GeoValue::MultiPolygon(polys) => polys.iter().flatten().flatten().try_for_each(|p| check(p)),
        GeoValue::GeometryCollection(gs) => gs.iter().try_for_each(|g| check_positions(&g.value)),
    }
}

fn to_field_data(v: &Value) -> FieldData {
    match v {
        Value::Null => FieldData::Null,
        Value::Bool(b) => FieldData::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldData::Int(i),
            None => FieldData::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => FieldData::Text(s.clone()),
        // nested values are kept as their JSON text
        other => FieldData::Text(other.to_string()),
    }
}

fn from_field_data(v: &FieldData) -> Value {
    match v {
        FieldData::Int(i) => Value::from(*i),
        FieldData::Real(r) => serde_json::Number::from_f64(*r)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        FieldData::Text(s) => Value::String(s.clone()),
        FieldData::Bool(b) => Value::Bool(*b),
        FieldData::Null => Value::Null,
    }
}
