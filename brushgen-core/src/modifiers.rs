//! Modifiers that derive collections of transformed copies

use nalgebra::{Matrix3, Point3, Vector3};
use rand::prelude::*;

use crate::entity::Placeable;
use crate::error::{BrushError, BrushResult};
use crate::texture::TextureSizeResolver;

/// `count` copies of an entity, each shifted by one more `offset`.
///
/// Copies are derived on access; nothing is cached. Indices wrap modulo
/// `count`, so `at(count)` is the same copy as `at(0)` and `at(-1)` is the
/// last one.
#[derive(Debug, Clone, PartialEq)]
pub struct Array<T> {
    object: T,
    count: usize,
    offset: Vector3<f64>,
    relative: bool,
}

impl<T: Placeable + Clone> Array<T> {
    /// With `relative` set, `offset` is measured in multiples of the
    /// wrapped entity's size along each axis.
    pub fn new(
        object: T,
        count: usize,
        offset: impl Into<Vector3<f64>>,
        relative: bool,
    ) -> BrushResult<Self> {
        if count == 0 {
            return Err(BrushError::invalid("array count", count, "must be at least 1"));
        }
        Ok(Self {
            object,
            count,
            offset: offset.into(),
            relative,
        })
    }

    pub fn object(&self) -> &T {
        &self.object
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Offset between consecutive copies
    pub fn step(&self) -> Vector3<f64> {
        if self.relative {
            self.offset.component_mul(&self.object.size())
        } else {
            self.offset
        }
    }

    pub fn at(&self, index: i64) -> T {
        let wrapped = index.rem_euclid(self.count as i64);
        let mut copy = self.object.clone();
        copy.translate(&(self.step() * wrapped as f64));
        copy
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.count).map(move |i| self.at(i as i64))
    }

    fn last(&self) -> T {
        self.at(self.count as i64 - 1)
    }
}

impl<T: Placeable + Clone> Placeable for Array<T> {
    fn is_groupable(&self) -> bool {
        self.object.is_groupable()
    }

    /// Midpoint between the first and the last copy
    fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.at(0).center(), &self.last().center())
    }

    fn size(&self) -> Vector3<f64> {
        self.last().center() - self.at(0).center() + self.object.size()
    }

    fn translate(&mut self, offset: &Vector3<f64>) {
        self.object.translate(offset);
    }

    fn rotate(&mut self, _pivot: &Point3<f64>, _rotation: &Matrix3<f64>) -> BrushResult<()> {
        Err(BrushError::Unsupported {
            operation: "rotation",
            entity: "Array",
        })
    }

    fn scale(&mut self, _factor: f64) -> BrushResult<()> {
        Err(BrushError::Unsupported {
            operation: "scaling",
            entity: "Array",
        })
    }

    fn serialize(&self, resolver: &dyn TextureSizeResolver) -> BrushResult<String> {
        self.iter().map(|copy| copy.serialize(resolver)).collect()
    }
}

/// `count` copies of an entity with random offsets and scales.
///
/// Every materialization draws new copies. Set a seed to make the output
/// reproducible, or pass an explicit generator to `materialize_with`.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomScatter<T> {
    object: T,
    count: usize,
    max_offset: Vector3<f64>,
    scale_variation: f64,
    seed: Option<u64>,
}

impl<T: Placeable + Clone> RandomScatter<T> {
    /// Offsets are drawn from `[-max_offset, max_offset]` per axis and
    /// scale factors from `[1 - scale_variation, 1 + scale_variation]`.
    pub fn new(
        object: T,
        count: usize,
        max_offset: impl Into<Vector3<f64>>,
        scale_variation: f64,
    ) -> BrushResult<Self> {
        let max_offset = max_offset.into();
        if max_offset.iter().any(|v| !(*v >= 0.0 && v.is_finite())) {
            return Err(BrushError::invalid(
                "scatter max offset",
                format!("{}, {}, {}", max_offset.x, max_offset.y, max_offset.z),
                "components must be zero or positive",
            ));
        }
        if !(0.0..1.0).contains(&scale_variation) {
            return Err(BrushError::invalid(
                "scatter scale variation",
                scale_variation,
                "must be in [0, 1)",
            ));
        }
        Ok(Self {
            object,
            count,
            max_offset,
            scale_variation,
            seed: None,
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn object(&self) -> &T {
        &self.object
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Draw `count` copies from the configured seed, or from the thread
    /// generator when no seed is set.
    pub fn materialize(&self) -> BrushResult<Vec<T>> {
        let mut rng: Box<dyn RngCore> = if let Some(seed) = self.seed {
            Box::new(StdRng::seed_from_u64(seed))
        } else {
            Box::new(thread_rng())
        };
        self.materialize_with(&mut rng)
    }

    pub fn materialize_with<R: Rng>(&self, rng: &mut R) -> BrushResult<Vec<T>> {
        let mut copies = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let mut copy = self.object.clone();
            let offset = self
                .max_offset
                .map(|max| rng.gen_range(-1.0..=1.0) * max);
            copy.translate(&offset);
            if self.scale_variation > 0.0 {
                let factor = 1.0 + rng.gen_range(-1.0..=1.0) * self.scale_variation;
                copy.scale(factor)?;
            }
            copies.push(copy);
        }
        Ok(copies)
    }
}

impl<T: Placeable + Clone> Placeable for RandomScatter<T> {
    fn is_groupable(&self) -> bool {
        self.object.is_groupable()
    }

    fn center(&self) -> Point3<f64> {
        self.object.center()
    }

    fn size(&self) -> Vector3<f64> {
        self.max_offset + self.object.size()
    }

    fn translate(&mut self, offset: &Vector3<f64>) {
        self.object.translate(offset);
    }

    fn rotate(&mut self, _pivot: &Point3<f64>, _rotation: &Matrix3<f64>) -> BrushResult<()> {
        Err(BrushError::Unsupported {
            operation: "rotation",
            entity: "RandomScatter",
        })
    }

    fn scale(&mut self, _factor: f64) -> BrushResult<()> {
        Err(BrushError::Unsupported {
            operation: "scaling",
            entity: "RandomScatter",
        })
    }

    fn serialize(&self, resolver: &dyn TextureSizeResolver) -> BrushResult<String> {
        self.materialize()?
            .iter()
            .map(|copy| copy.serialize(resolver))
            .collect()
    }
}
