use anyhow::{anyhow, bail, Context, Result};
use glam::{Quat, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::math::{world_transform, RowMat4};
use crate::render::{DirectionalLight, LightingState};

/// Frame setup described by a scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    #[serde(default)]
    pub camera: CameraDesc,
    #[serde(default)]
    pub lighting: LightingState,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl Scene {
    /// Parses a scene XML document.
    ///
    /// Every element is optional except each object's `<name>`; missing
    /// values fall back to the defaults of the corresponding type.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            bail!("expected <scene> root element, found <{}>", root.tag_name().name());
        }

        let camera = match child(&root, "camera") {
            Some(node) => parse_camera(&node).context("invalid <camera>")?,
            None => CameraDesc::default(),
        };

        let mut lighting = LightingState::default();
        lighting.ambient_light = parse_vec3(optional_text(&root, "ambient"), lighting.ambient_light)
            .context("invalid <ambient>")?;
        if let Some(node) = child(&root, "light") {
            lighting.light = parse_light(&node).context("invalid <light>")?;
        }

        let mut objects = Vec::new();
        for node in root.children().filter(|n| n.has_tag_name("object")) {
            let object = parse_object(&node)
                .with_context(|| format!("invalid <object> #{}", objects.len() + 1))?;
            objects.push(object);
        }

        Ok(Self {
            camera,
            lighting,
            objects,
        })
    }
}

/// Left-handed look-at camera with a perspective lens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraDesc {
    #[serde(default)]
    pub position: Vec3,
    #[serde(default = "default_target")]
    pub target: Vec3,
    #[serde(default = "default_up")]
    pub up: Vec3,
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            target: default_target(),
            up: default_up(),
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

impl CameraDesc {
    pub fn view(&self) -> RowMat4 {
        RowMat4::look_at(self.position, self.target, self.up)
    }

    pub fn projection(&self, width: u32, height: u32) -> RowMat4 {
        RowMat4::perspective_fov(
            self.fov.to_radians(),
            width.max(1) as f32,
            height.max(1) as f32,
            self.near,
            self.far,
        )
    }
}

/// Drawable object of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in degrees, applied about X, then Y, then Z.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    /// Overrides the mesh's specular power when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_power: Option<f32>,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            mesh: None,
            texture: None,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
            spec_power: None,
        }
    }
}

impl SceneObject {
    pub fn rotation_quat(&self) -> Quat {
        let r = self.rotation;
        Quat::from_rotation_z(r.z.to_radians())
            * Quat::from_rotation_y(r.y.to_radians())
            * Quat::from_rotation_x(r.x.to_radians())
    }

    pub fn world_transform(&self) -> RowMat4 {
        world_transform(self.scale, self.rotation_quat(), self.position)
    }
}

fn default_target() -> Vec3 {
    Vec3::X
}

fn default_up() -> Vec3 {
    Vec3::Z
}

fn default_fov() -> f32 {
    70.0
}

fn default_near() -> f32 {
    25.0
}

fn default_far() -> f32 {
    10000.0
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn parse_camera(node: &Node<'_, '_>) -> Result<CameraDesc> {
    let defaults = CameraDesc::default();
    let camera = CameraDesc {
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
        target: parse_vec3(optional_text(node, "target"), defaults.target)?,
        up: parse_vec3(optional_text(node, "up"), defaults.up)?,
        fov: parse_f32(optional_text(node, "fov"), defaults.fov)?,
        near: parse_f32(optional_text(node, "near"), defaults.near)?,
        far: parse_f32(optional_text(node, "far"), defaults.far)?,
    };
    if camera.position == camera.target {
        bail!("camera position and target coincide");
    }
    let forward = (camera.target - camera.position).normalize();
    if camera.up.normalize_or_zero().cross(forward).length_squared() <= f32::EPSILON {
        bail!("camera up vector must not be parallel to the view direction");
    }
    if !(camera.near > 0.0 && camera.far > camera.near) {
        bail!("camera needs 0 < near < far, got near={} far={}", camera.near, camera.far);
    }
    Ok(camera)
}

fn parse_light(node: &Node<'_, '_>) -> Result<DirectionalLight> {
    let defaults = DirectionalLight::default();
    let direction = parse_vec3(optional_text(node, "direction"), defaults.direction)?;
    if direction.length_squared() <= f32::EPSILON {
        bail!("light direction must not be the zero vector");
    }
    Ok(DirectionalLight {
        direction: direction.normalize(),
        diffuse_color: parse_vec3(optional_text(node, "diffuse"), defaults.diffuse_color)?,
        spec_color: parse_vec3(optional_text(node, "specular"), defaults.spec_color)?,
    })
}

fn parse_object(node: &Node<'_, '_>) -> Result<SceneObject> {
    let defaults = SceneObject::default();
    let spec_power = match optional_text(node, "specular_power") {
        Some(text) => {
            let power = parse_f32(Some(text), 0.0)?;
            if !(power > 0.0) {
                bail!("specular power must be positive, got {power}");
            }
            Some(power)
        }
        None => None,
    };
    Ok(SceneObject {
        name: required_text(node, "name")?,
        mesh: optional_text(node, "mesh"),
        texture: optional_text(node, "texture"),
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
        rotation: parse_vec3(optional_text(node, "rotation"), defaults.rotation)?,
        scale: parse_scale(optional_text(node, "scale"), defaults.scale)?,
        spec_power,
    })
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_components(value: &str) -> Result<Vec<f32>> {
    value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse '{component}': {err}"))
        })
        .collect()
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    match parse_components(&value)?.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        other => Err(anyhow!("expected 3 vector components, got {}", other.len())),
    }
}

/// Accepts either a uniform scale or three per-axis factors.
fn parse_scale(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    match parse_components(&value)?.as_slice() {
        [s] => Ok(Vec3::splat(*s)),
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        other => Err(anyhow!("expected 1 or 3 scale components, got {}", other.len())),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}
