use std::collections::BTreeMap;

/// Vertex stage shared by every program. The stage draws one full-screen quad
/// into an orthographic [-1,1] view volume; only the fragment stage varies.
pub const QUAD_VERTEX_SOURCE: &str = "\
precision highp float;
uniform mat4 modelMatrix;
uniform mat4 modelViewMatrix;
uniform mat4 projectionMatrix;
uniform mat4 viewMatrix;
uniform mat3 normalMatrix;
uniform vec3 cameraPosition;
attribute vec3 position;
void main() {
    gl_Position = projectionMatrix * viewMatrix * modelMatrix * vec4(position, 1.0);
}
";

/// Fragment stage used when a stage is built without caller-supplied source:
/// a time-varying gradient, enough to produce visibly animated frames.
pub const DEFAULT_FRAGMENT_SOURCE: &str = "\
precision highp float;
uniform vec3 iResolution;
uniform float iTime;
void main() {
    vec2 uv = gl_FragCoord.xy / iResolution.xy;
    vec3 col = 0.5 + 0.5 * cos(iTime + uv.xyx + vec3(0.0, 2.0, 4.0));
    gl_FragColor = vec4(col, 1.0);
}
";

/// A vertex/fragment program pair. The vertex stage is fixed at construction
/// and never user-replaceable; the fragment stage swaps whole.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShaderProgram {
    vertex: String,
    fragment: String,
}

impl ShaderProgram {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            vertex: QUAD_VERTEX_SOURCE.to_string(),
            fragment: fragment.into(),
        }
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment
    }

    /// Replace the fragment stage. Callers holding `&mut` cannot race a
    /// render, so no draw ever observes a half-swapped program.
    pub fn set_fragment(&mut self, fragment: impl Into<String>) {
        self.fragment = fragment.into();
    }
}

impl Default for ShaderProgram {
    fn default() -> Self {
        Self::new(DEFAULT_FRAGMENT_SOURCE)
    }
}

/// A tagged uniform value, the subset the quad renderer understands.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix.
    Mat4([f32; 16]),
    /// Opaque handle into the renderer collaborator's texture table.
    Sampler(u32),
}

/// Uniform name -> value mapping handed to the renderer on every draw.
///
/// A stage replaces its set wholesale via [`crate::ShaderStage::set_uniforms`];
/// there is no merge operation, so a render never observes a partial update.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UniformSet {
    values: BTreeMap<String, UniformValue>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: UniformValue) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
