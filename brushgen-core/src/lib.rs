//! brushgen core library - brush geometry and map generation
//!
//! This library builds convex brushes from planar faces, offers parametric
//! primitives and duplication modifiers, and writes them as brushDef map text
//! grouped into func_group and worldspawn entities.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod map;
pub mod modifiers;
pub mod primitives;
pub mod texture;
pub mod transform;
pub mod writer;

// Re-export commonly used types
pub use entity::{Placeable, Ungrouped};
pub use error::{BrushError, BrushResult, ParseError, TextureError};
pub use geometry::{Brush, Face};
pub use map::{parse_map, MapEntity, ParsedBrush, ParsedFace};
pub use modifiers::{Array, RandomScatter};
pub use primitives::{Cuboid, CylinderBrush, EllipsoidBrush, Textures};
pub use texture::{CachedResolver, FallbackResolver, TextureSizeResolver, TextureSizeTable};
pub use transform::{rotation_x, rotation_y, rotation_z, uv_rotation};
pub use writer::ObjectWriter;
