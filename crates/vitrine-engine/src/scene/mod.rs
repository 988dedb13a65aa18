//! Scene description types.
//!
//! Responsibilities:
//! - describe what a render target shows (meshes, lights, fog, background)
//! - build procedural textures and their mip chains
//! - generate primitive geometry on the CPU
//! - provide the perspective camera consumed by the backend
//!
//! Scenes are renderer-agnostic apart from the lazily created GPU resources
//! cached inside each `Geometry` and `Texture`.

mod camera;
mod color;
mod geometry;
mod light;
mod mesh;
mod stage;
mod texture;

pub use camera::PerspectiveCamera;
pub use color::Color;
pub use geometry::{Geometry, GeometryId, Vertex};
pub use light::{AmbientLight, DirectionalLight};
pub use mesh::{Material, Mesh, Transform};
pub use stage::{Fog, MeshId, PixelRect, Scene, SplitView};
pub use texture::{Texture, TextureId, TextureMap};
