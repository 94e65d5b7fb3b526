//! Object-JSON scene descriptions
//!
//! Builds a detached node tree from the `{ metadata, geometries, materials,
//! object }` document format. Buffer geometries keep their triangles and
//! are measured from their position attribute; the parametric primitives
//! keep their parameters. Colours arrive as packed sRGB integers and are
//! stored linear.

use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};
use vantage_core::{
    Aabb, DeserializeError, Geometry, Material, Mesh, NodeContent, NodeSubtree, SceneDeserializer,
    Shape, Transform,
};

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    geometries: Vec<GeometryDef>,
    #[serde(default)]
    materials: Vec<MaterialDef>,
    object: ObjectDef,
}

#[derive(Debug, Deserialize)]
struct GeometryDef {
    uuid: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<BufferData>,
    #[serde(flatten)]
    params: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct BufferData {
    /// Kept raw: only `position` is read and other attributes may be
    /// interleaved
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(default)]
    index: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attribute {
    item_size: usize,
    array: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct IndexAttribute {
    array: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct MaterialDef {
    uuid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    color: Option<u32>,
    #[serde(default)]
    emissive: Option<u32>,
    #[serde(default)]
    opacity: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MaterialRef {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectDef {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    matrix: Option<[f32; 16]>,
    #[serde(default)]
    position: Option<[f32; 3]>,
    #[serde(default)]
    quaternion: Option<[f32; 4]>,
    #[serde(default)]
    scale: Option<[f32; 3]>,
    #[serde(default)]
    geometry: Option<String>,
    #[serde(default)]
    material: Option<MaterialRef>,
    #[serde(default)]
    user_data: Map<String, Value>,
    #[serde(default)]
    children: Vec<ObjectDef>,
}

/// Deserializer for Object-JSON scene descriptions
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectJsonDeserializer;

impl SceneDeserializer for ObjectJsonDeserializer {
    fn build(&self, description: &Value) -> Result<NodeSubtree, DeserializeError> {
        let document = Document::deserialize(description)?;

        let geometries: HashMap<&str, Geometry> = document
            .geometries
            .iter()
            .map(|def| (def.uuid.as_str(), measure_geometry(def)))
            .collect();
        let materials: HashMap<&str, Material> = document
            .materials
            .iter()
            .map(|def| (def.uuid.as_str(), convert_material(def)))
            .collect();

        let subtree = build_object(&document.object, &geometries, &materials)?;
        debug!(
            nodes = subtree.node_count(),
            geometries = geometries.len(),
            materials = materials.len(),
            "Built Object-JSON subtree"
        );
        Ok(subtree)
    }
}

fn build_object(
    def: &ObjectDef,
    geometries: &HashMap<&str, Geometry>,
    materials: &HashMap<&str, Material>,
) -> Result<NodeSubtree, DeserializeError> {
    let content = match &def.geometry {
        Some(uuid) => {
            let geometry = geometries.get(uuid.as_str()).cloned().ok_or_else(|| {
                DeserializeError::MissingReference {
                    kind: "geometry",
                    uuid: uuid.clone(),
                }
            })?;
            let material = match first_material(def.material.as_ref()) {
                Some(uuid) => materials.get(uuid).cloned().ok_or_else(|| {
                    DeserializeError::MissingReference {
                        kind: "material",
                        uuid: uuid.to_string(),
                    }
                })?,
                None => Material::default(),
            };
            NodeContent::Mesh(Mesh { geometry, material })
        }
        None => NodeContent::Group,
    };

    let children = def
        .children
        .iter()
        .map(|child| build_object(child, geometries, materials))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NodeSubtree {
        name: def.name.clone(),
        kind: def.kind.clone(),
        transform: object_transform(def),
        content,
        user_data: def.user_data.clone(),
        children,
    })
}

fn first_material(material: Option<&MaterialRef>) -> Option<&str> {
    match material? {
        MaterialRef::One(uuid) => Some(uuid),
        MaterialRef::Many(list) => list.first().map(String::as_str),
    }
}

fn object_transform(def: &ObjectDef) -> Transform {
    if let Some(matrix) = def.matrix {
        return Transform::from_matrix(&Mat4::from_cols_array(&matrix));
    }
    Transform {
        translation: def.position.map(Vec3::from_array).unwrap_or(Vec3::ZERO),
        rotation: def
            .quaternion
            .map(|[x, y, z, w]| Quat::from_xyzw(x, y, z, w).normalize())
            .unwrap_or(Quat::IDENTITY),
        scale: def.scale.map(Vec3::from_array).unwrap_or(Vec3::ONE),
    }
}

fn measure_geometry(def: &GeometryDef) -> Geometry {
    let param = |key: &str, default: f32| {
        def.params
            .get(key)
            .and_then(Value::as_f64)
            .map(|v| v as f32)
            .unwrap_or(default)
    };

    match def.kind.as_str() {
        "BufferGeometry" | "InstancedBufferGeometry" => buffer_geometry(def),
        "BoxGeometry" => {
            let size = Vec3::new(param("width", 1.0), param("height", 1.0), param("depth", 1.0));
            Geometry {
                bounds: Aabb::from_center_size(Vec3::ZERO, size),
                vertex_count: 24,
                shape: Shape::Cuboid { size },
            }
        }
        "SphereGeometry" => {
            let radius = param("radius", 1.0);
            Geometry {
                bounds: Aabb::from_center_size(Vec3::ZERO, Vec3::splat(2.0 * radius)),
                vertex_count: 0,
                shape: Shape::Sphere { radius },
            }
        }
        "CylinderGeometry" => {
            let radius_top = param("radiusTop", 1.0);
            let radius_bottom = param("radiusBottom", 1.0);
            let height = param("height", 1.0);
            let radius = radius_top.max(radius_bottom);
            Geometry {
                bounds: Aabb::from_center_size(
                    Vec3::ZERO,
                    Vec3::new(2.0 * radius, height, 2.0 * radius),
                ),
                vertex_count: 0,
                shape: Shape::Cylinder {
                    radius_top,
                    radius_bottom,
                    height,
                },
            }
        }
        "PlaneGeometry" => {
            let (width, height) = (param("width", 1.0), param("height", 1.0));
            Geometry {
                bounds: Aabb::from_center_size(Vec3::ZERO, Vec3::new(width, height, 0.0)),
                vertex_count: 4,
                shape: Shape::Plane { width, height },
            }
        }
        other => {
            warn!(uuid = %def.uuid, kind = %other, "Unsupported geometry type, treating as empty");
            Geometry::default()
        }
    }
}

/// Triangles from the position attribute and optional index buffer.
/// Unusable index data keeps the bounds but drops the shape.
fn buffer_geometry(def: &GeometryDef) -> Geometry {
    let data = def.data.as_ref();
    let Some(position) = data
        .and_then(|d| d.attributes.get("position"))
        .and_then(|v| Attribute::deserialize(v).ok())
    else {
        warn!(uuid = %def.uuid, "Buffer geometry without a readable position attribute");
        return Geometry::default();
    };
    if position.item_size < 3 {
        warn!(uuid = %def.uuid, item_size = position.item_size, "Unusable position attribute");
        return Geometry::default();
    }

    let positions: Vec<[f32; 3]> = position
        .array
        .chunks_exact(position.item_size)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let bounds = Aabb::from_points(positions.iter().copied().map(Vec3::from_array));
    let vertex_count = positions.len();

    let indices = match data.and_then(|d| d.index.as_ref()) {
        None => None,
        Some(raw) => match IndexAttribute::deserialize(raw) {
            Ok(index) if index.array.iter().all(|i| (*i as usize) < vertex_count) => {
                Some(index.array)
            }
            Ok(_) => {
                warn!(uuid = %def.uuid, vertex_count, "Index buffer points past the vertices");
                return Geometry {
                    bounds,
                    vertex_count,
                    shape: Shape::None,
                };
            }
            Err(e) => {
                warn!(uuid = %def.uuid, error = %e, "Unreadable index buffer");
                return Geometry {
                    bounds,
                    vertex_count,
                    shape: Shape::None,
                };
            }
        },
    };

    // Partial triangles at the end are dropped
    let shape = match indices {
        Some(mut indices) => {
            indices.truncate(indices.len() - indices.len() % 3);
            Shape::Triangles {
                positions: positions.into(),
                indices: Some(indices.into()),
            }
        }
        None => {
            let mut positions = positions;
            positions.truncate(vertex_count - vertex_count % 3);
            Shape::Triangles {
                positions: positions.into(),
                indices: None,
            }
        }
    };
    debug!(uuid = %def.uuid, vertex_count, "Read buffer geometry");

    Geometry {
        bounds,
        vertex_count,
        shape,
    }
}

fn convert_material(def: &MaterialDef) -> Material {
    let defaults = Material::default();
    Material {
        name: def.name.clone().filter(|n| !n.is_empty()),
        color: def.color.map(srgb_hex_to_linear).unwrap_or(defaults.color),
        emissive: def.emissive.map(srgb_hex_to_linear).unwrap_or(defaults.emissive),
        opacity: def.opacity.unwrap_or(defaults.opacity),
    }
}

fn srgb_hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}
