//! Texture size lookup used for UV scaling
//!
//! Faces only need the pixel dimensions of their texture. Where those come
//! from (shader archives, loose image folders, a hand-written table) is up
//! to the `TextureSizeResolver` implementation.

use std::cell::RefCell;
use std::collections::HashMap;

use nalgebra::Vector2;
use nom::{
    bytes::complete::{tag, take_till1},
    character::complete::{digit1, space0, space1},
    combinator::{eof, map_res, opt, rest},
    sequence::{preceded, tuple},
    IResult,
};

use crate::config::FALLBACK_TEXTURE_SIZE;
use crate::error::TextureError;

/// Resolves a texture identifier to its pixel dimensions
pub trait TextureSizeResolver {
    fn resolve(&self, texture: &str) -> Result<(u32, u32), TextureError>;
}

impl<R: TextureSizeResolver + ?Sized> TextureSizeResolver for &R {
    fn resolve(&self, texture: &str) -> Result<(u32, u32), TextureError> {
        (**self).resolve(texture)
    }
}

/// Look up a texture size, substituting the fallback size on failure
pub fn size_or_fallback(resolver: &dyn TextureSizeResolver, texture: &str) -> Vector2<f64> {
    let (width, height) = match resolver.resolve(texture) {
        Ok(size) => size,
        Err(err) => {
            log::warn!(
                "{}, using a size of ({}, {})",
                err,
                FALLBACK_TEXTURE_SIZE.0,
                FALLBACK_TEXTURE_SIZE.1
            );
            FALLBACK_TEXTURE_SIZE
        }
    };
    Vector2::new(f64::from(width), f64::from(height))
}

/// Resolver that knows no textures; every face gets the fallback size
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResolver;

impl TextureSizeResolver for FallbackResolver {
    fn resolve(&self, texture: &str) -> Result<(u32, u32), TextureError> {
        Err(TextureError::NotFound(texture.to_string()))
    }
}

/// In-memory table of texture sizes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureSizeTable {
    sizes: HashMap<String, (u32, u32)>,
}

impl TextureSizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, texture: impl Into<String>, width: u32, height: u32) {
        self.sizes.insert(texture.into(), (width, height));
    }

    pub fn with_size(mut self, texture: impl Into<String>, width: u32, height: u32) -> Self {
        self.insert(texture, width, height);
        self
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Parse a table with one `name width height` entry per line.
    ///
    /// Blank lines and lines starting with `//` are skipped. Later entries
    /// override earlier ones.
    pub fn parse(input: &str) -> Result<Self, TextureError> {
        let mut table = Self::new();
        for (index, line) in input.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            let (name, width, height) = match parse_entry(trimmed) {
                Ok((_, entry)) => entry,
                Err(e) => {
                    return Err(TextureError::Parse {
                        line: index + 1,
                        message: format!("expected `name width height`: {:?}", e),
                    })
                }
            };
            if width == 0 || height == 0 {
                return Err(TextureError::Parse {
                    line: index + 1,
                    message: format!("size of `{}` must be positive", name),
                });
            }
            table.insert(name, width, height);
        }
        Ok(table)
    }
}

impl TextureSizeResolver for TextureSizeTable {
    fn resolve(&self, texture: &str) -> Result<(u32, u32), TextureError> {
        self.sizes
            .get(texture)
            .copied()
            .ok_or_else(|| TextureError::NotFound(texture.to_string()))
    }
}

fn parse_entry(input: &str) -> IResult<&str, (&str, u32, u32)> {
    let (input, name) = take_till1(|c: char| c.is_whitespace())(input)?;
    let (input, (_, width, _, height)) = tuple((space1, parse_u32, space1, parse_u32))(input)?;
    let (input, _) = preceded(space0, opt(preceded(tag("//"), rest)))(input)?;
    let (input, _) = eof(input)?;
    Ok((input, (name, width, height)))
}

fn parse_u32(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>())(input)
}

/// Memoizing wrapper around another resolver
///
/// Both hits and misses are cached, so a missing texture is only looked up
/// (and reported by the backing store) once.
#[derive(Debug)]
pub struct CachedResolver<R> {
    backing: R,
    cache: RefCell<HashMap<String, Result<(u32, u32), TextureError>>>,
}

impl<R: TextureSizeResolver> CachedResolver<R> {
    pub fn new(backing: R) -> Self {
        Self {
            backing,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn into_inner(self) -> R {
        self.backing
    }
}

impl<R: TextureSizeResolver> TextureSizeResolver for CachedResolver<R> {
    fn resolve(&self, texture: &str) -> Result<(u32, u32), TextureError> {
        if let Some(hit) = self.cache.borrow().get(texture) {
            return hit.clone();
        }
        let result = self.backing.resolve(texture);
        self.cache
            .borrow_mut()
            .insert(texture.to_string(), result.clone());
        result
    }
}
