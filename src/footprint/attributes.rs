use std::path::Path;

use serde_json::{Map, Value};

use crate::config::{AttributeFields, DEFAULT_HEIGHT};
use crate::error::InputError;

use super::FootprintAttributes;

/// Identifies the feature whose properties are being resolved.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRef<'a> {
    pub path: &'a Path,
    pub index: usize,
}

/// Derives extrusion height and vertical offset from a feature's properties.
pub struct ResolveAttributes<'a> {
    properties: &'a Map<String, Value>,
    fields: &'a AttributeFields,
    feature: FeatureRef<'a>,
}

impl<'a> ResolveAttributes<'a> {
    #[must_use]
    pub fn new(properties: &'a Map<String, Value>, fields: &'a AttributeFields, feature: FeatureRef<'a>) -> Self {
        Self {
            properties,
            fields,
            feature,
        }
    }

    /// Resolves both attributes.
    ///
    /// Height falls back to [`DEFAULT_HEIGHT`] when missing, empty, not
    /// positive, or of a non-numeric JSON type. The offset is 0 unless a
    /// z-level field is configured and holds a value.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidHeight`] or [`InputError::InvalidZLevel`]
    /// when the field holds text that is not a number.
    pub fn execute(&self) -> Result<FootprintAttributes, InputError> {
        Ok(FootprintAttributes {
            height: self.height()?,
            z_offset: self.z_offset()?,
        })
    }

    fn height(&self) -> Result<f64, InputError> {
        let field = &self.fields.height_field;
        let raw = match self.properties.get(field) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => {
                let text = s.trim();
                if text.is_empty() {
                    None
                } else {
                    Some(text.parse::<f64>().map_err(|_| InputError::InvalidHeight {
                        path: self.feature.path.to_path_buf(),
                        feature: self.feature.index,
                        field: field.clone(),
                        value: s.clone(),
                    })?)
                }
            }
            _ => None,
        };
        Ok(match raw {
            Some(h) if h.is_finite() && h > 0.0 => h,
            _ => DEFAULT_HEIGHT,
        })
    }

    fn z_offset(&self) -> Result<f64, InputError> {
        let Some(field) = &self.fields.z_level_field else {
            return Ok(0.0);
        };
        match self.properties.get(field) {
            Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or(0.0)),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(z) if z.is_finite() => Ok(z),
                _ => Err(InputError::InvalidZLevel {
                    path: self.feature.path.to_path_buf(),
                    feature: self.feature.index,
                    field: field.clone(),
                    value: s.clone(),
                }),
            },
            _ => Ok(0.0),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(z: Option<&str>) -> AttributeFields {
        AttributeFields {
            height_field: "h".into(),
            z_level_field: z.map(str::to_string),
        }
    }

    fn resolve(props: Value, fields: &AttributeFields) -> Result<FootprintAttributes, InputError> {
        let Value::Object(map) = props else {
            panic!("properties must be an object");
        };
        let feature = FeatureRef {
            path: Path::new("blocks.geojson"),
            index: 3,
        };
        ResolveAttributes::new(&map, fields, feature).execute()
    }

    fn height_of(props: Value) -> f64 {
        resolve(props, &fields(None)).unwrap().height
    }

    #[test]
    fn height_defaults_and_parsing() {
        assert!((height_of(json!({})) - DEFAULT_HEIGHT).abs() < f64::EPSILON);
        assert!((height_of(json!({"h": ""})) - DEFAULT_HEIGHT).abs() < f64::EPSILON);
        assert!((height_of(json!({"h": "-5"})) - DEFAULT_HEIGHT).abs() < f64::EPSILON);
        assert!((height_of(json!({"h": "7.5"})) - 7.5).abs() < f64::EPSILON);
        assert!((height_of(json!({"h": 7.5})) - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_null_and_non_numeric_types_use_default() {
        assert!((height_of(json!({"h": 0})) - DEFAULT_HEIGHT).abs() < f64::EPSILON);
        assert!((height_of(json!({"h": null})) - DEFAULT_HEIGHT).abs() < f64::EPSILON);
        assert!((height_of(json!({"h": true})) - DEFAULT_HEIGHT).abs() < f64::EPSILON);
        assert!((height_of(json!({"h": " 12 "})) - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unparsable_height_is_fatal_with_context() {
        let err = resolve(json!({"h": "tall"}), &fields(None)).unwrap_err();
        match err {
            InputError::InvalidHeight {
                path,
                feature,
                field,
                value,
            } => {
                assert_eq!(path, Path::new("blocks.geojson"));
                assert_eq!(feature, 3);
                assert_eq!(field, "h");
                assert_eq!(value, "tall");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn z_offset_only_read_when_configured() {
        let props = json!({"h": 5, "z": 12.5});
        assert!(resolve(props.clone(), &fields(None)).unwrap().z_offset.abs() < f64::EPSILON);
        let attrs = resolve(props, &fields(Some("z"))).unwrap();
        assert!((attrs.z_offset - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn z_offset_passes_negative_values_through() {
        let attrs = resolve(json!({"z": "-2.5"}), &fields(Some("z"))).unwrap();
        assert!((attrs.z_offset + 2.5).abs() < f64::EPSILON);
        let missing = resolve(json!({}), &fields(Some("z"))).unwrap();
        assert!(missing.z_offset.abs() < f64::EPSILON);
    }

    #[test]
    fn unparsable_z_level_is_fatal() {
        let err = resolve(json!({"z": "ground"}), &fields(Some("z"))).unwrap_err();
        assert!(matches!(err, InputError::InvalidZLevel { feature: 3, .. }));
    }
}
