//! Capability contract shared by everything that can be written to a map

use nalgebra::{Matrix3, Point3, Vector3};

use crate::error::BrushResult;
use crate::texture::TextureSizeResolver;

/// An entity that can be placed, transformed and serialized into a map.
///
/// Brushes, parametric primitives and modifiers all implement this, so
/// modifiers can wrap any of them (including other modifiers) and the
/// writer can take a heterogeneous list.
pub trait Placeable {
    /// Whether the entity belongs in the named func_group block
    /// rather than in worldspawn.
    fn is_groupable(&self) -> bool;

    fn center(&self) -> Point3<f64>;

    /// Extent along each axis.
    fn size(&self) -> Vector3<f64>;

    fn translate(&mut self, offset: &Vector3<f64>);

    /// Rotate about `pivot` using a row-vector rotation matrix.
    fn rotate(&mut self, pivot: &Point3<f64>, rotation: &Matrix3<f64>) -> BrushResult<()>;

    /// Scale about the entity's own center.
    fn scale(&mut self, factor: f64) -> BrushResult<()>;

    /// Map text for the entity: one or more brushDef blocks.
    fn serialize(&self, resolver: &dyn TextureSizeResolver) -> BrushResult<String>;
}

/// Forces the wrapped entity into the worldspawn block.
#[derive(Debug, Clone, PartialEq)]
pub struct Ungrouped<T>(pub T);

impl<T: Placeable> Placeable for Ungrouped<T> {
    fn is_groupable(&self) -> bool {
        false
    }

    fn center(&self) -> Point3<f64> {
        self.0.center()
    }

    fn size(&self) -> Vector3<f64> {
        self.0.size()
    }

    fn translate(&mut self, offset: &Vector3<f64>) {
        self.0.translate(offset);
    }

    fn rotate(&mut self, pivot: &Point3<f64>, rotation: &Matrix3<f64>) -> BrushResult<()> {
        self.0.rotate(pivot, rotation)
    }

    fn scale(&mut self, factor: f64) -> BrushResult<()> {
        self.0.scale(factor)
    }

    fn serialize(&self, resolver: &dyn TextureSizeResolver) -> BrushResult<String> {
        self.0.serialize(resolver)
    }
}

pub(crate) fn check_scale_factor(factor: f64) -> BrushResult<()> {
    if factor > 0.0 && factor.is_finite() {
        Ok(())
    } else {
        Err(crate::error::BrushError::invalid(
            "scale factor",
            factor,
            "must be positive and finite",
        ))
    }
}
