//! Shared constants for brush generation
//!
//! Every tunable value used by the generators, the serializer and the
//! writer lives here.

/// Texture applied when a face or primitive role has no explicit texture
pub const DEFAULT_TEXTURE: &str = "common/caulk";

/// Texture size substituted when the resolver cannot size a texture
pub const FALLBACK_TEXTURE_SIZE: (u32, u32) = (64, 64);

/// `targetname` of the func_group written by `ObjectWriter::new`
pub const DEFAULT_GROUP_NAME: &str = "Group";

/// A tetrahedron is the smallest closed convex solid
pub const MIN_BRUSH_FACES: usize = 4;

/// Fewer sides cannot enclose a volume between the caps
pub const MIN_CYLINDER_SIDES: u32 = 3;

pub const MIN_ELLIPSOID_SEGMENTS: u32 = 3;

/// With a single ring both pole bands collapse and no face survives
pub const MIN_ELLIPSOID_RINGS: u32 = 2;

/// Sine of the angle between two face edges below which the face is
/// degenerate; also the smallest determinant of three unit plane normals
/// that still yields a corner
pub const EPSILON: f64 = 1e-9;

/// Distance a corner may lie outside a face plane and still count as on it
pub const CUT_THRESHOLD: f64 = 1e-6;
