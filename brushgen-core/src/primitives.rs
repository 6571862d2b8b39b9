//! Parametric primitives that generate their faces on demand

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Matrix3, Point3, Vector3};

use crate::config::{
    DEFAULT_TEXTURE, MIN_CYLINDER_SIDES, MIN_ELLIPSOID_RINGS, MIN_ELLIPSOID_SEGMENTS,
};
use crate::entity::{check_scale_factor, Placeable};
use crate::error::{BrushError, BrushResult};
use crate::geometry::{Brush, Face};
use crate::texture::TextureSizeResolver;

/// Texture assignment for a primitive: one texture everywhere, or one per
/// face role (`"top"`, `"front"`, `"sides"`, ...) with a default for the rest
#[derive(Debug, Clone, PartialEq)]
pub enum Textures {
    Uniform(String),
    Roles {
        roles: BTreeMap<String, String>,
        default: String,
    },
}

impl Textures {
    pub fn uniform(texture: impl Into<String>) -> Self {
        Self::Uniform(texture.into())
    }

    /// Per-role textures; unmapped roles use the default texture
    pub fn roles<I, K, V>(roles: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Roles {
            roles: roles
                .into_iter()
                .map(|(role, texture)| (role.into(), texture.into()))
                .collect(),
            default: DEFAULT_TEXTURE.to_string(),
        }
    }

    pub fn with_default(self, default: impl Into<String>) -> Self {
        match self {
            Self::Uniform(_) => Self::Uniform(default.into()),
            Self::Roles { roles, .. } => Self::Roles {
                roles,
                default: default.into(),
            },
        }
    }

    pub fn for_role(&self, role: &str) -> &str {
        match self {
            Self::Uniform(texture) => texture,
            Self::Roles { roles, default } => roles.get(role).unwrap_or(default),
        }
    }
}

impl Default for Textures {
    fn default() -> Self {
        Self::Uniform(DEFAULT_TEXTURE.to_string())
    }
}

impl From<&str> for Textures {
    fn from(texture: &str) -> Self {
        Self::uniform(texture)
    }
}

impl From<String> for Textures {
    fn from(texture: String) -> Self {
        Self::Uniform(texture)
    }
}

/// Corner sign patterns for each cuboid face, in output order.
/// The winding of every triple gives an inward normal.
const CUBOID_FACES: [(&str, [[f64; 3]; 3]); 6] = [
    ("front", [[-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, 1.0]]),
    ("back", [[1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [1.0, -1.0, 1.0]]),
    ("right", [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [1.0, -1.0, -1.0]]),
    ("left", [[1.0, 1.0, 1.0], [-1.0, 1.0, 1.0], [1.0, 1.0, -1.0]]),
    ("bottom", [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [-1.0, 1.0, -1.0]]),
    ("top", [[1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [-1.0, 1.0, 1.0]]),
];

/// Axis-aligned box
#[derive(Debug, Clone, PartialEq)]
pub struct Cuboid {
    center: Point3<f64>,
    size: Vector3<f64>,
    textures: Textures,
}

impl Cuboid {
    pub fn new(
        center: impl Into<Point3<f64>>,
        size: impl Into<Vector3<f64>>,
        textures: impl Into<Textures>,
    ) -> BrushResult<Self> {
        let size = size.into();
        check_extent("cuboid size", &size)?;
        Ok(Self {
            center: center.into(),
            size,
            textures: textures.into(),
        })
    }

    pub fn textures(&self) -> &Textures {
        &self.textures
    }

    /// The six faces: front, back, right, left, bottom, top
    pub fn faces(&self) -> Vec<Face> {
        let half = self.size / 2.0;
        let corner = |signs: &[f64; 3]| self.center + half.component_mul(&Vector3::from(*signs));
        CUBOID_FACES
            .iter()
            .map(|(role, [a, b, c])| {
                Face::textured(corner(a), corner(b), corner(c), self.textures.for_role(role))
            })
            .collect()
    }

    pub fn to_brush(&self) -> BrushResult<Brush> {
        Brush::new(self.faces())
    }

    /// A brush of this box cut by additional planes
    pub fn cutted<I>(&self, new_faces: I) -> BrushResult<Brush>
    where
        I: IntoIterator<Item = Face>,
    {
        let mut faces = self.faces();
        faces.extend(new_faces);
        Brush::new(faces)
    }
}

/// Prism around the Z axis with an optionally elliptical cross-section
#[derive(Debug, Clone, PartialEq)]
pub struct CylinderBrush {
    center: Point3<f64>,
    radius: f64,
    height: f64,
    /// Y extent; zero means the same as `radius`
    radius2: f64,
    num_sides: u32,
    textures: Textures,
}

impl CylinderBrush {
    pub fn new(
        center: impl Into<Point3<f64>>,
        radius: f64,
        height: f64,
        radius2: f64,
        num_sides: u32,
        textures: impl Into<Textures>,
    ) -> BrushResult<Self> {
        check_positive("cylinder radius", radius)?;
        check_positive("cylinder height", height)?;
        if !(radius2 >= 0.0 && radius2.is_finite()) {
            return Err(BrushError::invalid(
                "cylinder radius2",
                radius2,
                "must be zero or positive",
            ));
        }
        check_count("cylinder sides", num_sides, MIN_CYLINDER_SIDES)?;
        Ok(Self {
            center: center.into(),
            radius,
            height,
            radius2,
            num_sides,
            textures: textures.into(),
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn radius_y(&self) -> f64 {
        if self.radius2 == 0.0 {
            self.radius
        } else {
            self.radius2
        }
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn num_sides(&self) -> u32 {
        self.num_sides
    }

    /// `num_sides` side faces followed by the top and bottom caps
    pub fn faces(&self) -> Vec<Face> {
        let (rx, ry) = (self.radius, self.radius_y());
        let (c, half) = (self.center, self.height / 2.0);
        let rim = |i: u32, z: f64| {
            let theta = TAU * f64::from(i) / f64::from(self.num_sides);
            Point3::new(c.x + rx * theta.cos(), c.y + ry * theta.sin(), c.z + z)
        };

        let sides = self.textures.for_role("sides");
        let mut faces: Vec<Face> = (0..self.num_sides)
            .map(|i| Face::textured(rim(i, -half), rim(i, half), rim(i + 1, -half), sides))
            .collect();

        let top = c.z + half;
        faces.push(Face::textured(
            [c.x, c.y, top],
            [c.x + rx, c.y, top],
            [c.x, c.y - ry, top],
            self.textures.for_role("top"),
        ));
        let bottom = c.z - half;
        faces.push(Face::textured(
            [c.x, c.y, bottom],
            [c.x + rx, c.y, bottom],
            [c.x, c.y + ry, bottom],
            self.textures.for_role("bottom"),
        ));

        log::debug!("cylinder with {} sides -> {} faces", self.num_sides, faces.len());
        faces
    }

    pub fn to_brush(&self) -> BrushResult<Brush> {
        Brush::new(self.faces())
    }
}

/// UV-sphere tessellation of an axis-aligned ellipsoid
#[derive(Debug, Clone, PartialEq)]
pub struct EllipsoidBrush {
    center: Point3<f64>,
    size: Vector3<f64>,
    num_segments: u32,
    num_rings: u32,
    texture: String,
}

impl EllipsoidBrush {
    pub fn new(
        center: impl Into<Point3<f64>>,
        size: impl Into<Vector3<f64>>,
        num_segments: u32,
        num_rings: u32,
        texture: impl Into<String>,
    ) -> BrushResult<Self> {
        let size = size.into();
        check_extent("ellipsoid size", &size)?;
        check_count("ellipsoid segments", num_segments, MIN_ELLIPSOID_SEGMENTS)?;
        check_count("ellipsoid rings", num_rings, MIN_ELLIPSOID_RINGS)?;
        Ok(Self {
            center: center.into(),
            size,
            num_segments,
            num_rings,
            texture: texture.into(),
        })
    }

    pub fn texture(&self) -> &str {
        &self.texture
    }

    fn surface_point(&self, ring: u32, segment: u32) -> Point3<f64> {
        let mu = -FRAC_PI_2 + PI * f64::from(ring) / f64::from(self.num_rings);
        let nu = TAU * f64::from(segment) / f64::from(self.num_segments);
        let direction = Vector3::new(mu.cos() * nu.cos(), mu.cos() * nu.sin(), mu.sin());
        self.center + (self.size / 2.0).component_mul(&direction)
    }

    /// Band by band from the south pole.
    ///
    /// Each band quad `a b c d` (a, b on the lower ring) splits into
    /// `a d c` and `a c b`; the triangle that would collapse onto a pole
    /// is dropped, so the pole bands contribute one face per segment.
    pub fn faces(&self) -> Vec<Face> {
        let mut faces = Vec::with_capacity((2 * self.num_segments * (self.num_rings - 1)) as usize);
        for ring in 0..self.num_rings {
            for segment in 0..self.num_segments {
                let a = self.surface_point(ring, segment);
                let b = self.surface_point(ring, segment + 1);
                let c = self.surface_point(ring + 1, segment + 1);
                let d = self.surface_point(ring + 1, segment);
                if ring + 1 < self.num_rings {
                    faces.push(Face::textured(a, d, c, self.texture.as_str()));
                }
                if ring > 0 {
                    faces.push(Face::textured(a, c, b, self.texture.as_str()));
                }
            }
        }
        log::debug!(
            "ellipsoid with {} segments and {} rings -> {} faces",
            self.num_segments,
            self.num_rings,
            faces.len()
        );
        faces
    }

    pub fn to_brush(&self) -> BrushResult<Brush> {
        Brush::new(self.faces())
    }
}

fn check_positive(name: &'static str, value: f64) -> BrushResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(BrushError::invalid(name, value, "must be positive"))
    }
}

fn check_extent(name: &'static str, size: &Vector3<f64>) -> BrushResult<()> {
    if size.iter().all(|v| *v > 0.0 && v.is_finite()) {
        Ok(())
    } else {
        Err(BrushError::invalid(
            name,
            format!("{}, {}, {}", size.x, size.y, size.z),
            "every component must be positive",
        ))
    }
}

fn check_count(name: &'static str, value: u32, min: u32) -> BrushResult<()> {
    if value >= min {
        Ok(())
    } else {
        Err(BrushError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "too few subdivisions to enclose a volume",
        })
    }
}

fn unsupported_rotation(entity: &'static str) -> BrushResult<()> {
    Err(BrushError::Unsupported {
        operation: "rotation",
        entity,
    })
}

impl Placeable for Cuboid {
    fn is_groupable(&self) -> bool {
        true
    }

    fn center(&self) -> Point3<f64> {
        self.center
    }

    fn size(&self) -> Vector3<f64> {
        self.size
    }

    fn translate(&mut self, offset: &Vector3<f64>) {
        self.center += offset;
    }

    fn rotate(&mut self, _pivot: &Point3<f64>, _rotation: &Matrix3<f64>) -> BrushResult<()> {
        unsupported_rotation("Cuboid")
    }

    fn scale(&mut self, factor: f64) -> BrushResult<()> {
        check_scale_factor(factor)?;
        self.size *= factor;
        Ok(())
    }

    fn serialize(&self, resolver: &dyn TextureSizeResolver) -> BrushResult<String> {
        Ok(self.to_brush()?.serialize(resolver))
    }
}

impl Placeable for CylinderBrush {
    fn is_groupable(&self) -> bool {
        true
    }

    fn center(&self) -> Point3<f64> {
        self.center
    }

    fn size(&self) -> Vector3<f64> {
        Vector3::new(2.0 * self.radius, 2.0 * self.radius_y(), self.height)
    }

    fn translate(&mut self, offset: &Vector3<f64>) {
        self.center += offset;
    }

    fn rotate(&mut self, _pivot: &Point3<f64>, _rotation: &Matrix3<f64>) -> BrushResult<()> {
        unsupported_rotation("CylinderBrush")
    }

    fn scale(&mut self, factor: f64) -> BrushResult<()> {
        check_scale_factor(factor)?;
        self.radius *= factor;
        self.radius2 *= factor;
        self.height *= factor;
        Ok(())
    }

    fn serialize(&self, resolver: &dyn TextureSizeResolver) -> BrushResult<String> {
        Ok(self.to_brush()?.serialize(resolver))
    }
}

impl Placeable for EllipsoidBrush {
    fn is_groupable(&self) -> bool {
        true
    }

    fn center(&self) -> Point3<f64> {
        self.center
    }

    fn size(&self) -> Vector3<f64> {
        self.size
    }

    fn translate(&mut self, offset: &Vector3<f64>) {
        self.center += offset;
    }

    fn rotate(&mut self, _pivot: &Point3<f64>, _rotation: &Matrix3<f64>) -> BrushResult<()> {
        unsupported_rotation("EllipsoidBrush")
    }

    fn scale(&mut self, factor: f64) -> BrushResult<()> {
        check_scale_factor(factor)?;
        self.size *= factor;
        Ok(())
    }

    fn serialize(&self, resolver: &dyn TextureSizeResolver) -> BrushResult<String> {
        Ok(self.to_brush()?.serialize(resolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::FallbackResolver;
    use approx::assert_relative_eq;

    #[test]
    fn test_textures_roles() {
        let textures = Textures::roles([("top", "base/floor"), ("sides", "base/wall")]);
        assert_eq!(textures.for_role("top"), "base/floor");
        assert_eq!(textures.for_role("front"), DEFAULT_TEXTURE);
        let textures = textures.with_default("base/trim");
        assert_eq!(textures.for_role("front"), "base/trim");
        assert_eq!(Textures::from("a/b").for_role("anything"), "a/b");
        assert_eq!(Textures::default().for_role("top"), DEFAULT_TEXTURE);
    }

    #[test]
    fn test_cuboid_corners() {
        let cuboid = Cuboid::new([0.0, 0.0, 0.0], [2.0, 2.0, 2.0], Textures::default()).unwrap();
        let faces = cuboid.faces();
        assert_eq!(faces.len(), 6);
        for face in &faces {
            for vertex in &face.vertices {
                assert!(vertex.iter().all(|c| c.abs() == 1.0), "{:?} is not a corner", vertex);
            }
        }
    }

    #[test]
    fn test_cuboid_normals_point_inward() {
        let cuboid = Cuboid::new([5.0, -3.0, 8.0], [32.0, 128.0, 16.0], "base/step").unwrap();
        let expected = [
            Vector3::x(),
            -Vector3::x(),
            Vector3::y(),
            -Vector3::y(),
            Vector3::z(),
            -Vector3::z(),
        ];
        for (face, direction) in cuboid.faces().iter().zip(expected.iter()) {
            assert_relative_eq!(face.normal().normalize(), *direction, epsilon = 1e-12);
        }
        let brush = cuboid.to_brush().unwrap();
        assert!(!brush.is_point_outside(&Point3::new(5.0, -3.0, 8.0)));
        assert!(brush.is_point_outside(&Point3::new(5.0, -3.0, 16.5)));
        assert!(brush.is_point_outside(&Point3::new(-11.5, -3.0, 8.0)));
    }

    #[test]
    fn test_cuboid_role_textures() {
        let cuboid = Cuboid::new(
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            Textures::roles([("top", "t"), ("front", "f")]),
        )
        .unwrap();
        let textures: Vec<String> = cuboid.faces().into_iter().map(|f| f.texture).collect();
        assert_eq!(
            textures,
            ["f", DEFAULT_TEXTURE, DEFAULT_TEXTURE, DEFAULT_TEXTURE, DEFAULT_TEXTURE, "t"]
        );
    }

    #[test]
    fn test_cuboid_rejects_bad_size() {
        assert!(Cuboid::new([0.0, 0.0, 0.0], [1.0, 0.0, 1.0], "a").is_err());
        assert!(Cuboid::new([0.0, 0.0, 0.0], [1.0, 1.0, -2.0], "a").is_err());
    }

    #[test]
    fn test_cuboid_placeable() {
        let mut cuboid = Cuboid::new([0.0, 0.0, 8.0], [32.0, 128.0, 16.0], "a").unwrap();
        cuboid.translate(&Vector3::new(32.0, 0.0, 24.0));
        assert_eq!(Placeable::center(&cuboid), Point3::new(32.0, 0.0, 32.0));
        cuboid.scale(0.5).unwrap();
        assert_eq!(Placeable::size(&cuboid), Vector3::new(16.0, 64.0, 8.0));
        assert!(matches!(
            cuboid.rotate(&Point3::origin(), &Matrix3::identity()),
            Err(BrushError::Unsupported { .. })
        ));
        let text = cuboid.serialize(&FallbackResolver).unwrap();
        assert_eq!(text.matches(" 0 0 0\n").count(), 6);
    }

    #[test]
    fn test_cuboid_cutted() {
        let cuboid = Cuboid::new([248.0, 0.0, 176.0], [496.0, 16.0, 368.0], "b").unwrap();
        let beam = cuboid
            .cutted([
                Face::textured([8.0, 0.0, 8.0], [8.0, 32.0, 8.0], [40.0, 0.0, 32.0], "b"),
                Face::textured(
                    [496.0, 0.0, 352.0],
                    [496.0, 32.0, 352.0],
                    [24.0, 0.0, 0.0],
                    "b",
                ),
            ])
            .unwrap();
        assert_eq!(beam.faces().len(), 8);
        assert!(!beam.is_point_outside(&Point3::new(248.0, 0.0, 176.0)));
        assert!(beam.is_point_outside(&Point3::new(1.0, 0.0, 300.0)));
        assert!(beam.is_point_outside(&Point3::new(248.0, 20.0, 176.0)));

        // cut planes reach past the box, but the extent stays the box's
        assert_eq!(beam.vertices().len(), 12);
        assert_relative_eq!(
            Placeable::size(&beam),
            Vector3::new(496.0, 16.0, 368.0),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            Placeable::center(&beam),
            Point3::new(248.0, 0.0, 176.0),
            epsilon = 1e-9
        );
        let beams = crate::modifiers::Array::new(beam, 2, [0.0, 1.0, 0.0], true).unwrap();
        assert_relative_eq!(beams.step(), Vector3::new(0.0, 16.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_cylinder_faces() {
        let cylinder = CylinderBrush::new(
            [0.0, 0.0, 0.0],
            64.0,
            32.0,
            0.0,
            8,
            Textures::roles([("sides", "s"), ("top", "t")]),
        )
        .unwrap();
        let faces = cylinder.faces();
        assert_eq!(faces.len(), 10);
        assert!(faces[..8].iter().all(|f| f.texture == "s"));
        assert_eq!(faces[8].texture, "t");
        assert_eq!(faces[9].texture, DEFAULT_TEXTURE);

        let brush = cylinder.to_brush().unwrap();
        assert!(!brush.is_point_outside(&Point3::origin()));
        assert!(!brush.is_point_outside(&Point3::new(0.0, 0.0, 15.0)));
        assert!(brush.is_point_outside(&Point3::new(0.0, 0.0, 17.0)));
        assert!(brush.is_point_outside(&Point3::new(65.0, 0.0, 0.0)));
    }

    #[test]
    fn test_elliptical_cylinder() {
        let cylinder = CylinderBrush::new([0.0, 0.0, 0.0], 64.0, 32.0, 16.0, 16, "s").unwrap();
        assert_eq!(Placeable::size(&cylinder), Vector3::new(128.0, 32.0, 32.0));
        let brush = cylinder.to_brush().unwrap();
        assert!(!brush.is_point_outside(&Point3::new(60.0, 0.0, 0.0)));
        assert!(brush.is_point_outside(&Point3::new(0.0, 20.0, 0.0)));
    }

    #[test]
    fn test_cylinder_validation() {
        assert!(CylinderBrush::new([0.0, 0.0, 0.0], 0.0, 1.0, 0.0, 8, "a").is_err());
        assert!(CylinderBrush::new([0.0, 0.0, 0.0], 1.0, -1.0, 0.0, 8, "a").is_err());
        assert!(CylinderBrush::new([0.0, 0.0, 0.0], 1.0, 1.0, -1.0, 8, "a").is_err());
        assert!(CylinderBrush::new([0.0, 0.0, 0.0], 1.0, 1.0, 0.0, 0, "a").is_err());
        assert!(CylinderBrush::new([0.0, 0.0, 0.0], 1.0, 1.0, 0.0, 2, "a").is_err());
        assert!(CylinderBrush::new([0.0, 0.0, 0.0], 1.0, 1.0, 0.0, 3, "a").is_ok());
    }

    #[test]
    fn test_ellipsoid_faces() {
        let ellipsoid =
            EllipsoidBrush::new([10.0, 20.0, 30.0], [64.0, 32.0, 16.0], 8, 4, "e").unwrap();
        let faces = ellipsoid.faces();
        assert_eq!(faces.len(), 2 * 8 * 3);

        let brush = ellipsoid.to_brush().unwrap();
        assert!(!brush.is_point_outside(&Point3::new(10.0, 20.0, 30.0)));
        assert!(brush.is_point_outside(&Point3::new(10.0, 20.0, 39.0)));
        assert!(brush.is_point_outside(&Point3::new(43.0, 20.0, 30.0)));

        // every vertex lies on the ellipsoid surface
        for vertex in faces.iter().flat_map(|f| f.vertices.iter()) {
            let local = vertex - Point3::new(10.0, 20.0, 30.0);
            let r = (local.x / 32.0).powi(2) + (local.y / 16.0).powi(2) + (local.z / 8.0).powi(2);
            assert_relative_eq!(r, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_ellipsoid_validation() {
        assert!(EllipsoidBrush::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], 0, 4, "e").is_err());
        assert!(EllipsoidBrush::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], 8, 0, "e").is_err());
        assert!(EllipsoidBrush::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], 8, 1, "e").is_err());
        assert!(EllipsoidBrush::new([0.0, 0.0, 0.0], [0.0, 1.0, 1.0], 8, 4, "e").is_err());
        let minimal = EllipsoidBrush::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], 3, 2, "e").unwrap();
        assert_eq!(minimal.to_brush().unwrap().faces().len(), 6);
    }
}
