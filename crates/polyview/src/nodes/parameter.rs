//! Node body widgets, one per parameter kind.

use glam::{Vec2, Vec3};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::request::ParameterValue;
use crate::schema::{ParameterKind, ParameterSchema};
use crate::surface::Aabb;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterWidget {
    Number { value: f64, integer: bool },
    Toggle(bool),
    Text(String),
    Color(String),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector3Array(Vec<Vec3>),
    /// Image parameter; the preview comes from the node's producer output.
    Image,
    /// Raw bytes uploaded from a file.
    File,
    Aabb(Aabb),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct Xyz {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    z: Option<f32>,
}

impl Xyz {
    fn vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z.unwrap_or_default())
    }
}

impl From<Vec3> for Xyz {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: Some(v.z),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AabbJson {
    CenterExtents { center: Xyz, extents: Xyz },
    MinMax { min: Xyz, max: Xyz },
}

#[derive(Serialize)]
struct CenterExtents {
    center: Xyz,
    extents: Xyz,
}

fn parse_or_default<T: DeserializeOwned + Default>(value: &Value) -> Result<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value.clone())?)
}

fn parse_aabb(value: &Value) -> Result<Aabb> {
    if value.is_null() {
        return Ok(Aabb {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        });
    }

    Ok(match serde_json::from_value::<AabbJson>(value.clone())? {
        AabbJson::CenterExtents { center, extents } => Aabb {
            min: center.vec3() - extents.vec3(),
            max: center.vec3() + extents.vec3(),
        },
        AabbJson::MinMax { min, max } => Aabb {
            min: min.vec3(),
            max: max.vec3(),
        },
    })
}

/// Pick the widget for a node parameter from its declared type.
pub fn build_parameter(param: &ParameterSchema) -> Result<ParameterWidget> {
    let value = &param.current_value;
    let widget = match param.kind()? {
        ParameterKind::Float => ParameterWidget::Number {
            value: value.as_f64().unwrap_or_default(),
            integer: false,
        },
        ParameterKind::Int => ParameterWidget::Number {
            value: value.as_f64().unwrap_or_default().round(),
            integer: true,
        },
        ParameterKind::Bool => ParameterWidget::Toggle(value.as_bool().unwrap_or_default()),
        ParameterKind::String => {
            ParameterWidget::Text(value.as_str().unwrap_or_default().to_owned())
        }
        ParameterKind::Color => {
            ParameterWidget::Color(value.as_str().unwrap_or_default().to_owned())
        }
        ParameterKind::Vector2 => {
            let v: Xyz = parse_or_default(value)?;
            ParameterWidget::Vector2(Vec2::new(v.x, v.y))
        }
        ParameterKind::Vector3 => {
            let v: Xyz = parse_or_default(value)?;
            ParameterWidget::Vector3(v.vec3())
        }
        ParameterKind::Vector3Array => {
            let points: Vec<Xyz> = parse_or_default(value)?;
            ParameterWidget::Vector3Array(points.iter().map(Xyz::vec3).collect())
        }
        ParameterKind::Image => ParameterWidget::Image,
        ParameterKind::File => ParameterWidget::File,
        ParameterKind::Aabb => ParameterWidget::Aabb(parse_aabb(value)?),
        // groups only exist in the profile tree
        ParameterKind::Group => {
            return Err(Error::UnimplementedParameterType(param.type_tag.clone()))
        }
    };

    Ok(widget)
}

impl ParameterWidget {
    /// The value to post when the user commits this widget. Image and file
    /// widgets post raw bytes through their own upload path instead.
    pub fn value(&self) -> Option<ParameterValue> {
        let json = match self {
            ParameterWidget::Number { value, integer } => {
                if *integer {
                    Value::from(value.round() as i64)
                } else {
                    serde_json::json!(value)
                }
            }
            ParameterWidget::Toggle(b) => Value::Bool(*b),
            ParameterWidget::Text(s) | ParameterWidget::Color(s) => Value::String(s.clone()),
            ParameterWidget::Vector2(v) => serde_json::json!({ "x": v.x, "y": v.y }),
            ParameterWidget::Vector3(v) => serde_json::to_value(Xyz::from(*v)).ok()?,
            ParameterWidget::Vector3Array(points) => {
                let points: Vec<Xyz> = points.iter().copied().map(Xyz::from).collect();
                serde_json::to_value(points).ok()?
            }
            ParameterWidget::Aabb(aabb) => serde_json::to_value(CenterExtents {
                center: ((aabb.min + aabb.max) / 2.0).into(),
                extents: (aabb.size() / 2.0).into(),
            })
            .ok()?,
            ParameterWidget::Image | ParameterWidget::File => return None,
        };

        Some(ParameterValue::Json(json))
    }
}
