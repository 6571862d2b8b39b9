//! Faces and the convex brushes they bound

use nalgebra::{Matrix3, Point3, Vector2, Vector3};

use crate::config::{CUT_THRESHOLD, DEFAULT_TEXTURE, EPSILON, MIN_BRUSH_FACES};
use crate::entity::{check_scale_factor, Placeable};
use crate::error::{BrushError, BrushResult};
use crate::texture::{size_or_fallback, TextureSizeResolver};
use crate::transform::{rotate_point, uv_rotation};

/// A bounding plane through three points, with texture mapping.
///
/// The normal `(v1 - v0) × (v2 - v0)` points into the solid the face
/// bounds; every inside/outside test relies on that winding.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub vertices: [Point3<f64>; 3],
    pub texture: String,
    /// Texture rotation in degrees
    pub angle: f64,
    pub offset: Vector2<f64>,
    /// Must stay non-zero in both components
    pub scale: Vector2<f64>,
}

impl Face {
    pub fn new(
        v0: impl Into<Point3<f64>>,
        v1: impl Into<Point3<f64>>,
        v2: impl Into<Point3<f64>>,
    ) -> Self {
        Self {
            vertices: [v0.into(), v1.into(), v2.into()],
            texture: DEFAULT_TEXTURE.to_string(),
            angle: 0.0,
            offset: Vector2::zeros(),
            scale: Vector2::new(1.0, 1.0),
        }
    }

    pub fn textured(
        v0: impl Into<Point3<f64>>,
        v1: impl Into<Point3<f64>>,
        v2: impl Into<Point3<f64>>,
        texture: impl Into<String>,
    ) -> Self {
        Self::new(v0, v1, v2).with_texture(texture)
    }

    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = texture.into();
        self
    }

    pub fn with_angle(mut self, degrees: f64) -> Self {
        self.angle = degrees;
        self
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = Vector2::new(x, y);
        self
    }

    pub fn with_scale(mut self, x: f64, y: f64) -> Self {
        self.scale = Vector2::new(x, y);
        self
    }

    /// Unnormalized plane normal, recomputed from the current vertices
    pub fn normal(&self) -> Vector3<f64> {
        let [v0, v1, v2] = &self.vertices;
        (v1 - v0).cross(&(v2 - v0))
    }

    /// Check that the vertices span a plane and the texture scale is usable
    pub fn validate(&self) -> BrushResult<()> {
        let [v0, v1, v2] = &self.vertices;
        let (e1, e2) = (v1 - v0, v2 - v0);
        if e1.cross(&e2).norm() <= EPSILON * e1.norm() * e2.norm() {
            return Err(BrushError::DegenerateFace {
                reason: format!(
                    "vertices {} {} {} are coincident or collinear",
                    point_to_str(&self.vertices[0]),
                    point_to_str(&self.vertices[1]),
                    point_to_str(&self.vertices[2])
                ),
            });
        }
        if self.scale.x == 0.0 || self.scale.y == 0.0 {
            return Err(BrushError::DegenerateFace {
                reason: format!(
                    "texture scale ({}, {}) has a zero component",
                    self.scale.x, self.scale.y
                ),
            });
        }
        Ok(())
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for vertex in &mut self.vertices {
            *vertex += offset;
        }
    }

    pub fn rotate(&mut self, pivot: &Point3<f64>, rotation: &Matrix3<f64>) {
        for vertex in &mut self.vertices {
            *vertex = rotate_point(vertex, pivot, rotation);
        }
    }

    pub fn rotated(&self, pivot: &Point3<f64>, rotation: &Matrix3<f64>) -> Self {
        let mut face = self.clone();
        face.rotate(pivot, rotation);
        face
    }

    /// Reverse the winding, which negates the normal
    pub fn flip(&mut self) {
        self.vertices.swap(1, 2);
    }

    pub fn flipped(&self) -> Self {
        let mut face = self.clone();
        face.flip();
        face
    }

    /// True if `point` lies on the outer side of this face's plane
    pub fn is_point_in_front(&self, point: &Point3<f64>) -> bool {
        (point - self.vertices[0]).dot(&self.normal()) < 0.0
    }

    /// Unit inward normal `n` and distance `d` with `n · x = d` on the plane
    fn plane(&self) -> (Vector3<f64>, f64) {
        let normal = self.normal().normalize();
        (normal, normal.dot(&self.vertices[0].coords))
    }

    pub(crate) fn scale_about(&mut self, pivot: &Point3<f64>, factor: f64) {
        for vertex in &mut self.vertices {
            *vertex = pivot + (*vertex - pivot) * factor;
        }
    }

    /// One plane line of a brushDef block.
    ///
    /// The texture matrix is the rotation divided column-wise by texture
    /// size times face scale; the offset column is `-offset / size`.
    pub fn serialize(&self, resolver: &dyn TextureSizeResolver) -> String {
        let texture_size = size_or_fallback(resolver, &self.texture);
        let rotation = uv_rotation(self.angle);
        let divisor = texture_size.component_mul(&self.scale);
        let rs = |row: usize, col: usize| rotation[(row, col)] / divisor[col];
        let offset = -self.offset.component_div(&texture_size);

        format!(
            "{} {} {} (( {} {} {} )( {} {} {} )) {} 0 0 0\n",
            point_to_str(&self.vertices[0]),
            point_to_str(&self.vertices[1]),
            point_to_str(&self.vertices[2]),
            rs(0, 0),
            rs(0, 1),
            offset.x,
            rs(1, 0),
            rs(1, 1),
            offset.y,
            self.texture
        )
    }
}

/// Format a point as `( x y z )`
pub fn point_to_str(point: &Point3<f64>) -> String {
    format!("( {} {} {} )", point.x, point.y, point.z)
}

/// A convex solid described by its bounding planes.
///
/// Closure and convexity are not checked; construction only enforces the
/// minimum face count and that every face spans a plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    faces: Vec<Face>,
}

impl Brush {
    pub fn new(faces: Vec<Face>) -> BrushResult<Self> {
        validate_faces(&faces)?;
        Ok(Self { faces })
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn set_faces(&mut self, faces: Vec<Face>) -> BrushResult<()> {
        validate_faces(&faces)?;
        self.faces = faces;
        Ok(())
    }

    pub fn into_faces(self) -> Vec<Face> {
        self.faces
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for face in &mut self.faces {
            face.translate(offset);
        }
    }

    pub fn rotate(&mut self, pivot: &Point3<f64>, rotation: &Matrix3<f64>) {
        for face in &mut self.faces {
            face.rotate(pivot, rotation);
        }
    }

    /// A new brush made of a copy of these faces plus `new_faces`
    pub fn cutted<I>(&self, new_faces: I) -> BrushResult<Self>
    where
        I: IntoIterator<Item = Face>,
    {
        let mut faces = self.faces.clone();
        faces.extend(new_faces);
        Self::new(faces)
    }

    pub fn copy_brush(&self) -> Self {
        self.clone()
    }

    /// True if any face has `point` in front of it
    pub fn is_point_outside(&self, point: &Point3<f64>) -> bool {
        self.faces.iter().any(|face| face.is_point_in_front(point))
    }

    /// Corners of the solid.
    ///
    /// Every three face planes meeting in a single point give a candidate;
    /// candidates outside any other plane are cut away.
    pub fn vertices(&self) -> Vec<Point3<f64>> {
        let planes: Vec<(Vector3<f64>, f64)> = self.faces.iter().map(Face::plane).collect();
        let mut vertices: Vec<Point3<f64>> = Vec::new();
        for i in 0..planes.len() {
            for j in i + 1..planes.len() {
                for k in j + 1..planes.len() {
                    let Some(point) = intersect_planes(&planes[i], &planes[j], &planes[k]) else {
                        continue;
                    };
                    let outside = planes
                        .iter()
                        .any(|(normal, d)| d - normal.dot(&point.coords) > CUT_THRESHOLD);
                    if outside {
                        continue;
                    }
                    if !vertices.iter().any(|v| (v - point).norm() <= CUT_THRESHOLD) {
                        vertices.push(point);
                    }
                }
            }
        }
        vertices
    }

    /// Axis-aligned bounds of the solid's corners.
    ///
    /// Falls back to the face-defining points when the planes do not meet
    /// in any corner, which only happens for brushes that are not closed.
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        let mut corners = self.vertices();
        if corners.is_empty() {
            log::debug!("brush planes enclose no corner, using defining points");
            corners = self.faces.iter().flat_map(|face| face.vertices).collect();
        }
        let first = corners[0];
        corners
            .iter()
            .fold((first, first), |(min, max), v| (min.inf(v), max.sup(v)))
    }

    pub fn center(&self) -> Point3<f64> {
        let (min, max) = self.bounds();
        nalgebra::center(&min, &max)
    }

    pub fn size(&self) -> Vector3<f64> {
        let (min, max) = self.bounds();
        max - min
    }

    /// Scale every defining point about the brush center
    pub fn scale(&mut self, factor: f64) -> BrushResult<()> {
        check_scale_factor(factor)?;
        let pivot = self.center();
        for face in &mut self.faces {
            face.scale_about(&pivot, factor);
        }
        Ok(())
    }

    pub fn serialize(&self, resolver: &dyn TextureSizeResolver) -> String {
        let data: String = self
            .faces
            .iter()
            .map(|face| face.serialize(resolver))
            .collect();
        format!("// brush\n{{\nbrushDef\n{{\n{}}}\n}}\n", data)
    }
}

fn intersect_planes(
    a: &(Vector3<f64>, f64),
    b: &(Vector3<f64>, f64),
    c: &(Vector3<f64>, f64),
) -> Option<Point3<f64>> {
    let normals = Matrix3::from_rows(&[a.0.transpose(), b.0.transpose(), c.0.transpose()]);
    if normals.determinant().abs() < EPSILON {
        return None;
    }
    normals
        .lu()
        .solve(&Vector3::new(a.1, b.1, c.1))
        .map(Point3::from)
}

fn validate_faces(faces: &[Face]) -> BrushResult<()> {
    if faces.len() < MIN_BRUSH_FACES {
        return Err(BrushError::TooFewFaces {
            required: MIN_BRUSH_FACES,
            actual: faces.len(),
        });
    }
    faces.iter().try_for_each(Face::validate)
}

impl Placeable for Brush {
    fn is_groupable(&self) -> bool {
        true
    }

    fn center(&self) -> Point3<f64> {
        Brush::center(self)
    }

    fn size(&self) -> Vector3<f64> {
        Brush::size(self)
    }

    fn translate(&mut self, offset: &Vector3<f64>) {
        Brush::translate(self, offset);
    }

    fn rotate(&mut self, pivot: &Point3<f64>, rotation: &Matrix3<f64>) -> BrushResult<()> {
        Brush::rotate(self, pivot, rotation);
        Ok(())
    }

    fn scale(&mut self, factor: f64) -> BrushResult<()> {
        Brush::scale(self, factor)
    }

    fn serialize(&self, resolver: &dyn TextureSizeResolver) -> BrushResult<String> {
        Ok(Brush::serialize(self, resolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{FallbackResolver, TextureSizeTable};
    use crate::transform::rotation_z;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    /// Unit tetrahedron at the origin with inward normals
    fn tetrahedron() -> Brush {
        Brush::new(vec![
            Face::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            Face::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            Face::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            Face::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_normal_and_front_test() {
        let face = Face::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_eq!(face.normal(), Vector3::new(0.0, 0.0, 1.0));
        assert!(face.is_point_in_front(&Point3::new(0.0, 0.0, -1.0)));
        assert!(!face.is_point_in_front(&Point3::new(0.0, 0.0, 1.0)));
        // points on the plane are not in front
        assert!(!face.is_point_in_front(&Point3::new(5.0, 5.0, 0.0)));
    }

    #[test]
    fn test_double_flip_is_identity() {
        let face = Face::textured([0.0, 0.0, 0.0], [4.0, 0.0, 1.0], [0.0, 3.0, 2.0], "a/b");
        let flipped = face.flipped();
        assert_eq!(flipped.normal(), -face.normal());
        assert_eq!(flipped.flipped(), face);

        let mut in_place = face.clone();
        in_place.flip();
        in_place.flip();
        assert_eq!(in_place, face);
    }

    #[test]
    fn test_translation_composes() {
        let face = Face::new([1.0, 2.0, 3.0], [4.0, 0.0, 1.0], [0.0, 3.0, 2.0]);
        let o1 = Vector3::new(1.5, -2.0, 8.0);
        let o2 = Vector3::new(-0.5, 7.0, 0.25);

        let mut stepwise = face.clone();
        stepwise.translate(&o1);
        stepwise.translate(&o2);

        let mut combined = face;
        combined.translate(&(o1 + o2));

        for (a, b) in stepwise.vertices.iter().zip(combined.vertices.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rotated_leaves_original() {
        let face = Face::new([1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 1.0, 0.0]);
        let rotated = face.rotated(&Point3::origin(), &rotation_z(FRAC_PI_2));
        assert_eq!(face.vertices[0], Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(rotated.vertices[0], Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(rotated.vertices[1], Point3::new(0.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(rotated.vertices[2], Point3::new(-1.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_validate_rejects_degenerate_faces() {
        let coincident = Face::new([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 0.0]);
        assert!(matches!(coincident.validate(), Err(BrushError::DegenerateFace { .. })));

        let collinear = Face::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]);
        assert!(collinear.validate().is_err());

        let zero_scale =
            Face::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]).with_scale(0.0, 1.0);
        assert!(zero_scale.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_small_faces() {
        let tiny = Face::new([0.0, 0.0, 0.0], [1e-5, 0.0, 0.0], [0.0, 1e-5, 0.0]);
        assert!(tiny.normal().norm() < EPSILON);
        assert!(tiny.validate().is_ok());

        let sliver = Face::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 1e-12, 0.0]);
        assert!(sliver.validate().is_err());
    }

    #[test]
    fn test_vertices_of_tetrahedron() {
        let vertices = tetrahedron().vertices();
        assert_eq!(vertices.len(), 4);
        for corner in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
            let corner = Point3::from(corner);
            assert!(vertices.iter().any(|v| (v - corner).norm() < 1e-12));
        }
    }

    #[test]
    fn test_bounds_ignore_far_defining_points() {
        // the cutting plane x + y + z = 1 is defined by points far from the solid
        let corner = Brush::new(vec![
            Face::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            Face::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            Face::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            Face::new([100.0, -99.0, 0.0], [-99.0, 100.0, 0.0], [100.0, 0.0, -99.0]),
        ])
        .unwrap();
        assert!(!corner.is_point_outside(&Point3::new(0.2, 0.2, 0.2)));
        let (min, max) = corner.bounds();
        assert_relative_eq!(min, Point3::new(0.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(max, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_serialize_face_with_fallback_size() {
        let face = Face::textured([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], "missing/tex");
        assert_eq!(
            face.serialize(&FallbackResolver),
            "( 0 0 0 ) ( 1 0 0 ) ( 0 1 0 ) (( 0.015625 0 -0 )( -0 0.015625 -0 )) \
             missing/tex 0 0 0\n"
        );
    }

    #[test]
    fn test_serialize_face_texture_matrix() {
        let table = TextureSizeTable::new().with_size("base/wall", 128, 256);
        let face = Face::textured([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], "base/wall")
            .with_offset(32.0, -64.0)
            .with_scale(0.5, 2.0);
        let line = face.serialize(&table);
        assert_eq!(
            line,
            "( 0 0 0 ) ( 1 0 0 ) ( 0 1 0 ) (( 0.015625 0 -0.25 )( -0 0.001953125 0.25 )) \
             base/wall 0 0 0\n"
        );
    }

    #[test]
    fn test_serialize_face_rotation() {
        let table = TextureSizeTable::new().with_size("base/wall", 64, 64);
        let face = Face::textured([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], "base/wall")
            .with_angle(90.0);
        let line = face.serialize(&table);
        let numbers: Vec<f64> = line
            .split("((")
            .nth(1)
            .unwrap()
            .split("))")
            .next()
            .unwrap()
            .split(|c: char| c == '(' || c == ')' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(numbers.len(), 6);
        assert_relative_eq!(numbers[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(numbers[1], 1.0 / 64.0, epsilon = 1e-12);
        assert_relative_eq!(numbers[3], -1.0 / 64.0, epsilon = 1e-12);
        assert_relative_eq!(numbers[4], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_brush_face_count() {
        let faces = tetrahedron().into_faces();
        assert!(Brush::new(faces.clone()).is_ok());

        let err = Brush::new(faces[..3].to_vec()).unwrap_err();
        assert!(matches!(err, BrushError::TooFewFaces { required: 4, actual: 3 }));
        assert!(Brush::new(Vec::new()).is_err());
    }

    #[test]
    fn test_brush_rejects_degenerate_member() {
        let mut faces = tetrahedron().into_faces();
        faces.push(Face::new([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]));
        assert!(matches!(Brush::new(faces), Err(BrushError::DegenerateFace { .. })));

        let mut brush = tetrahedron();
        assert!(brush.set_faces(Vec::new()).is_err());
        assert_eq!(brush.faces().len(), 4);
    }

    #[test]
    fn test_is_point_outside() {
        let brush = tetrahedron();
        assert!(!brush.is_point_outside(&Point3::new(0.1, 0.1, 0.1)));
        assert!(brush.is_point_outside(&Point3::new(1.0, 1.0, 1.0)));
        assert!(brush.is_point_outside(&Point3::new(-0.1, 0.1, 0.1)));
    }

    #[test]
    fn test_cutted_copies_faces() {
        let brush = tetrahedron();
        // plane x + y + z = 0.5 with normal pointing towards the origin
        let cut = Face::new([0.5, 0.0, 0.0], [0.0, 0.0, 0.5], [0.0, 0.5, 0.0]);
        let mut cut_brush = brush.cutted([cut.clone()]).unwrap();
        assert_eq!(cut_brush.faces().len(), 5);
        assert_eq!(brush.faces().len(), 4);
        assert_eq!(cut_brush.faces()[4], cut);
        assert!(cut_brush.is_point_outside(&Point3::new(0.3, 0.3, 0.3)));
        assert!(!brush.is_point_outside(&Point3::new(0.3, 0.3, 0.3)));

        cut_brush.translate(&Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(brush.faces()[0].vertices[0], Point3::origin());
    }

    #[test]
    fn test_copy_brush_is_independent() {
        let brush = tetrahedron();
        let mut copy = brush.copy_brush();
        copy.rotate(&Point3::origin(), &rotation_z(FRAC_PI_2));
        copy.translate(&Vector3::new(0.0, 0.0, 3.0));
        assert_ne!(copy, brush);
        assert_eq!(brush, tetrahedron());
    }

    #[test]
    fn test_bounds_and_scale() {
        let mut brush = tetrahedron();
        assert_relative_eq!(brush.center(), Point3::new(0.5, 0.5, 0.5), epsilon = 1e-12);
        assert_relative_eq!(brush.size(), Vector3::new(1.0, 1.0, 1.0), epsilon = 1e-12);

        brush.scale(2.0).unwrap();
        assert_relative_eq!(brush.center(), Point3::new(0.5, 0.5, 0.5), epsilon = 1e-12);
        assert_relative_eq!(brush.size(), Vector3::new(2.0, 2.0, 2.0), epsilon = 1e-12);
        assert!(brush.scale(0.0).is_err());
        assert!(brush.scale(-1.0).is_err());
    }

    #[test]
    fn test_serialize_brush_block() {
        let text = tetrahedron().serialize(&FallbackResolver);
        assert!(text.starts_with("// brush\n{\nbrushDef\n{\n( 0 0 0 ) ( 1 0 0 ) ( 0 1 0 )"));
        assert!(text.ends_with("common/caulk 0 0 0\n}\n}\n"));
        assert_eq!(text.lines().count(), 4 + 4 + 2);
    }
}
