//! Command-line front end: builds a primitive or preset and writes a map

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

use brushgen_core::config::{DEFAULT_GROUP_NAME, DEFAULT_TEXTURE};
use brushgen_core::{
    Array, Brush, BrushError, CachedResolver, Cuboid, CylinderBrush, EllipsoidBrush, Face,
    FallbackResolver, ObjectWriter, Placeable, TextureError, TextureSizeResolver, TextureSizeTable,
    Ungrouped,
};
use nalgebra::{Point3, Vector3};
use thiserror::Error;

pub mod logging;

pub const USAGE: &str = "\
Usage: brushgen <cuboid|cylinder|ellipsoid|stairs> [OPTIONS]

Options:
  --center x,y,z     Center of the shape (default: 0,0,0)
  --size x,y,z       Cuboid or ellipsoid size (default: 64,64,64)
  --radius r         Cylinder radius (default: 32)
  --height h         Cylinder height (default: 64)
  --sides n          Cylinder side count (default: 8)
  --segments n       Ellipsoid segments (default: 8)
  --rings n          Ellipsoid rings (default: 4)
  --steps n          Stair step count (default: 16)
  --texture name     Texture for every face (default: common/caulk)
  --textures file    Texture size table, one `name width height` per line
  --group name       func_group targetname (default: Group)
  --world            Write into worldspawn instead of a func_group
  --out file         Output file (default: stdout)
";

const VALUE_FLAGS: &[&str] = &[
    "--center", "--size", "--radius", "--height", "--sides", "--segments", "--rings", "--steps",
    "--texture", "--textures", "--group", "--out",
];

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("invalid value `{value}` for {flag}")]
    InvalidValue { flag: &'static str, value: String },

    #[error(transparent)]
    Brush(#[from] BrushError),

    #[error("failed to load texture sizes: {0}")]
    Texture(#[from] TextureError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Cuboid,
    Cylinder,
    Ellipsoid,
    Stairs,
}

impl FromStr for Shape {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cuboid" => Ok(Self::Cuboid),
            "cylinder" => Ok(Self::Cylinder),
            "ellipsoid" => Ok(Self::Ellipsoid),
            "stairs" => Ok(Self::Stairs),
            other => Err(CliError::Usage(format!("unknown shape `{}`", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub shape: Shape,
    pub center: Point3<f64>,
    pub size: Vector3<f64>,
    pub radius: f64,
    pub height: f64,
    pub sides: u32,
    pub segments: u32,
    pub rings: u32,
    pub steps: usize,
    pub texture: String,
    pub textures: Option<PathBuf>,
    pub group: String,
    pub world: bool,
    pub out: Option<PathBuf>,
}

impl Options {
    /// Parse arguments, excluding the program name
    pub fn from_args(args: &[String]) -> Result<Self, CliError> {
        let shape = match args.first() {
            Some(first) if !first.starts_with("--") => first.parse()?,
            _ => return Err(CliError::Usage("missing shape".to_string())),
        };

        let flags = FlagValues::collect(&args[1..])?;
        Ok(Self {
            shape,
            center: flags
                .vec3("--center")?
                .map(Point3::from)
                .unwrap_or_else(Point3::origin),
            size: flags.vec3("--size")?.unwrap_or_else(|| Vector3::repeat(64.0)),
            radius: flags.parse("--radius")?.unwrap_or(32.0),
            height: flags.parse("--height")?.unwrap_or(64.0),
            sides: flags.parse("--sides")?.unwrap_or(8),
            segments: flags.parse("--segments")?.unwrap_or(8),
            rings: flags.parse("--rings")?.unwrap_or(4),
            steps: flags.parse("--steps")?.unwrap_or(16),
            texture: flags.string("--texture").unwrap_or(DEFAULT_TEXTURE).to_string(),
            textures: flags.string("--textures").map(PathBuf::from),
            group: flags.string("--group").unwrap_or(DEFAULT_GROUP_NAME).to_string(),
            world: flags.world,
            out: flags.string("--out").map(PathBuf::from),
        })
    }
}

/// Flag values gathered in one left-to-right pass. The argument after a
/// value flag is always its value, and a repeated flag keeps the last one.
struct FlagValues<'a> {
    values: HashMap<&'static str, &'a str>,
    world: bool,
}

impl<'a> FlagValues<'a> {
    fn collect(args: &'a [String]) -> Result<Self, CliError> {
        let mut values = HashMap::new();
        let mut world = false;
        let mut rest = args.iter();
        while let Some(arg) = rest.next() {
            if arg == "--world" {
                world = true;
                continue;
            }
            let Some(&flag) = VALUE_FLAGS.iter().find(|flag| **flag == arg.as_str()) else {
                return Err(CliError::Usage(format!("unexpected argument `{}`", arg)));
            };
            let value = rest
                .next()
                .ok_or_else(|| CliError::Usage(format!("missing value for {}", flag)))?;
            values.insert(flag, value.as_str());
        }
        Ok(Self { values, world })
    }

    fn string(&self, flag: &str) -> Option<&'a str> {
        self.values.get(flag).copied()
    }

    fn parse<T: FromStr>(&self, flag: &'static str) -> Result<Option<T>, CliError> {
        self.string(flag)
            .map(|value| {
                value.parse().map_err(|_| CliError::InvalidValue {
                    flag,
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    fn vec3(&self, flag: &'static str) -> Result<Option<Vector3<f64>>, CliError> {
        let Some(value) = self.string(flag) else {
            return Ok(None);
        };
        let invalid = || CliError::InvalidValue {
            flag,
            value: value.to_string(),
        };
        let components: Vec<f64> = value
            .split(',')
            .map(|c| c.trim().parse())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        match components[..] {
            [x, y, z] => Ok(Some(Vector3::new(x, y, z))),
            _ => Err(invalid()),
        }
    }
}

/// Build the writer holding the requested shape
pub fn build_scene(options: &Options) -> Result<ObjectWriter, CliError> {
    let mut writer = ObjectWriter::new(Vec::new()).with_group(options.group.clone());
    let texture = options.texture.as_str();

    match options.shape {
        Shape::Cuboid => {
            let cuboid = Cuboid::new(options.center, options.size, texture)?;
            place(&mut writer, cuboid, options.world);
        }
        Shape::Cylinder => {
            let cylinder = CylinderBrush::new(
                options.center,
                options.radius,
                options.height,
                0.0,
                options.sides,
                texture,
            )?;
            place(&mut writer, cylinder, options.world);
        }
        Shape::Ellipsoid => {
            let ellipsoid = EllipsoidBrush::new(
                options.center,
                options.size,
                options.segments,
                options.rings,
                texture,
            )?;
            place(&mut writer, ellipsoid, options.world);
        }
        Shape::Stairs => {
            let (mut steps, mut beam) = stairs(options.steps, texture)?;
            let offset = options.center.coords;
            steps.translate(&offset);
            beam.translate(&offset);
            place(&mut writer, steps, options.world);
            place(&mut writer, beam, options.world);
        }
    }

    log::debug!("scene holds {} entities", writer.len());
    Ok(writer)
}

fn place(writer: &mut ObjectWriter, object: impl Placeable + 'static, world: bool) {
    if world {
        writer.push(Ungrouped(object));
    } else {
        writer.push(object);
    }
}

/// Straight staircase: 32x128x16 steps rising 24 units per step, carried by
/// a beam cut along the slope underneath.
pub fn stairs(count: usize, texture: &str) -> Result<(Array<Cuboid>, Brush), CliError> {
    let step = Cuboid::new([0.0, 0.0, 8.0], [32.0, 128.0, 16.0], texture)?;
    let steps = Array::new(step, count, [1.0, 0.0, 1.5], true)?;

    let length = 32.0 * count as f64 - 16.0;
    let rise = 24.0 * count as f64 - 16.0;
    let beam = Cuboid::new([length / 2.0, 0.0, rise / 2.0], [length, 16.0, rise], texture)?.cutted([
        Face::textured([8.0, 0.0, 8.0], [8.0, 32.0, 8.0], [40.0, 0.0, 32.0], texture),
        Face::textured(
            [length, 0.0, rise - 16.0],
            [length, 32.0, rise - 16.0],
            [24.0, 0.0, 0.0],
            texture,
        ),
    ])?;
    Ok((steps, beam))
}

/// Load the texture size table, or fall back to the default size everywhere
pub fn load_resolver(options: &Options) -> Result<Box<dyn TextureSizeResolver>, CliError> {
    match &options.textures {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
                context: format!("failed to read {}", path.display()),
                source,
            })?;
            let table = TextureSizeTable::parse(&text)?;
            log::info!("loaded {} texture sizes from {}", table.len(), path.display());
            Ok(Box::new(CachedResolver::new(table)))
        }
        None => Ok(Box::new(FallbackResolver)),
    }
}

pub fn run(options: &Options) -> Result<(), CliError> {
    let writer = build_scene(options)?;
    let resolver = load_resolver(options)?;

    match &options.out {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Io {
                context: format!("failed to create {}", path.display()),
                source,
            })?;
            let mut sink = BufWriter::new(file);
            writer.write(&mut sink, resolver.as_ref())?;
            sink.flush().map_err(BrushError::from)?;
            log::info!("wrote {} entities to {}", writer.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut sink = stdout.lock();
            writer.write(&mut sink, resolver.as_ref())?;
            writeln!(sink).map_err(BrushError::from)?;
        }
    }
    Ok(())
}
