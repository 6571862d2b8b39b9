//! Reader for the brushDef map text produced by the writer

use nalgebra::Point3;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_till1},
    character::complete::{char, multispace1, not_line_ending},
    combinator::{recognize, value},
    multi::{many0, many0_count},
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::{BrushResult, ParseError};
use crate::geometry::{Brush, Face};

/// One `{ ... }` entity block with its key/value pairs and brushes.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntity {
    pub properties: Vec<(String, String)>,
    pub brushes: Vec<ParsedBrush>,
}

impl MapEntity {
    /// First value stored under `key`
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn classname(&self) -> Option<&str> {
        self.property("classname")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBrush {
    pub faces: Vec<ParsedFace>,
}

impl ParsedBrush {
    /// Rebuild a brush from the face planes. Texture alignment is reset
    /// to defaults since the stored matrix depends on the texture size.
    pub fn to_brush(&self) -> BrushResult<Brush> {
        let faces = self
            .faces
            .iter()
            .map(|face| {
                let [v0, v1, v2] = face.vertices;
                Face::textured(v0, v1, v2, face.texture.clone())
            })
            .collect();
        Brush::new(faces)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFace {
    pub vertices: [Point3<f64>; 3],
    /// Rows of the `(( a b c )( d e f ))` texture projection.
    pub texture_matrix: [[f64; 3]; 2],
    pub texture: String,
}

/// Parse a whole map file into its entities.
pub fn parse_map(input: &str) -> Result<Vec<MapEntity>, ParseError> {
    let syntax_error = |rest: &str, message: String| ParseError::Syntax {
        offset: input.len() - rest.len(),
        message,
    };

    match parse_map_impl(input) {
        Ok(("", entities)) => {
            log::debug!("parsed {} map entities", entities.len());
            Ok(entities)
        }
        Ok((rest, _)) => Err(syntax_error(rest, "unexpected trailing input".to_string())),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(syntax_error(e.input, format!("{:?}", e.code)))
        }
        Err(nom::Err::Incomplete(_)) => {
            Err(syntax_error("", "unexpected end of input".to_string()))
        }
    }
}

fn parse_map_impl(input: &str) -> IResult<&str, Vec<MapEntity>> {
    let (input, entities) = many0(parse_entity)(input)?;
    let (input, _) = ws(input)?;
    Ok((input, entities))
}

/// Whitespace and `//` line comments
fn ws(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0_count(alt((
            multispace1,
            recognize(pair(tag("//"), not_line_ending)),
        ))),
    )(input)
}

fn parse_entity(input: &str) -> IResult<&str, MapEntity> {
    let (input, _) = preceded(ws, char('{'))(input)?;
    let (input, properties) = many0(parse_property)(input)?;
    let (input, brushes) = many0(parse_brush)(input)?;
    let (input, _) = preceded(ws, char('}'))(input)?;
    Ok((input, MapEntity { properties, brushes }))
}

fn parse_property(input: &str) -> IResult<&str, (String, String)> {
    let (input, key) = preceded(ws, parse_quoted)(input)?;
    let (input, value) = preceded(ws, parse_quoted)(input)?;
    Ok((input, (key.to_string(), value.to_string())))
}

fn parse_quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till(|c| c == '"'), char('"'))(input)
}

fn parse_brush(input: &str) -> IResult<&str, ParsedBrush> {
    let (input, _) = preceded(ws, char('{'))(input)?;
    let (input, _) = preceded(ws, tag("brushDef"))(input)?;
    let (input, _) = preceded(ws, char('{'))(input)?;
    let (input, faces) = many0(parse_face)(input)?;
    let (input, _) = preceded(ws, char('}'))(input)?;
    let (input, _) = preceded(ws, char('}'))(input)?;
    Ok((input, ParsedBrush { faces }))
}

fn parse_face(input: &str) -> IResult<&str, ParsedFace> {
    let (input, v0) = parse_point(input)?;
    let (input, v1) = parse_point(input)?;
    let (input, v2) = parse_point(input)?;
    let (input, _) = preceded(ws, char('('))(input)?;
    let (input, row0) = parse_triple(input)?;
    let (input, row1) = parse_triple(input)?;
    let (input, _) = preceded(ws, char(')'))(input)?;
    let (input, texture) = preceded(ws, take_till1(|c: char| c.is_whitespace()))(input)?;
    // content, surface and value flags
    let (input, _) = preceded(ws, double)(input)?;
    let (input, _) = preceded(ws, double)(input)?;
    let (input, _) = preceded(ws, double)(input)?;

    Ok((
        input,
        ParsedFace {
            vertices: [v0, v1, v2],
            texture_matrix: [row0, row1],
            texture: texture.to_string(),
        },
    ))
}

fn parse_point(input: &str) -> IResult<&str, Point3<f64>> {
    let (input, [x, y, z]) = parse_triple(input)?;
    Ok((input, Point3::new(x, y, z)))
}

fn parse_triple(input: &str) -> IResult<&str, [f64; 3]> {
    let (input, _) = preceded(ws, char('('))(input)?;
    let (input, x) = preceded(ws, double)(input)?;
    let (input, y) = preceded(ws, double)(input)?;
    let (input, z) = preceded(ws, double)(input)?;
    let (input, _) = preceded(ws, char(')'))(input)?;
    Ok((input, [x, y, z]))
}
