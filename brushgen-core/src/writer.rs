//! Map writer that places entities into group and worldspawn blocks

use std::io::Write;

use crate::config::DEFAULT_GROUP_NAME;
use crate::entity::Placeable;
use crate::error::BrushResult;
use crate::texture::TextureSizeResolver;

/// Collects placeable entities and writes them as map text.
///
/// Groupable entities go into one `func_group` named after `group`, the
/// rest into worldspawn. Both keep their relative order, and an empty
/// partition writes no block at all.
pub struct ObjectWriter {
    objects: Vec<Box<dyn Placeable>>,
    group: String,
}

impl ObjectWriter {
    pub fn new(objects: Vec<Box<dyn Placeable>>) -> Self {
        Self {
            objects,
            group: DEFAULT_GROUP_NAME.to_string(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn push(&mut self, object: impl Placeable + 'static) {
        self.objects.push(Box::new(object));
    }

    pub fn with(mut self, object: impl Placeable + 'static) -> Self {
        self.push(object);
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Append the serialized map to `sink`
    pub fn write<W: Write>(
        &self,
        sink: &mut W,
        resolver: &dyn TextureSizeResolver,
    ) -> BrushResult<()> {
        let (groupables, others): (Vec<&dyn Placeable>, Vec<&dyn Placeable>) = self
            .objects
            .iter()
            .map(|object| object.as_ref())
            .partition(|object| object.is_groupable());
        log::debug!(
            "writing {} grouped and {} worldspawn entities",
            groupables.len(),
            others.len()
        );

        if !groupables.is_empty() {
            write!(
                sink,
                "{{\n\"classname\" \"func_group\"\n\"targetname\" \"{}\"\n",
                self.group
            )?;
            write_entities(sink, &groupables, resolver)?;
            sink.write_all(b"\n}")?;
        }
        if !others.is_empty() {
            sink.write_all(b"//entity 0\n{\n\"classname\" \"worldspawn\"\n")?;
            write_entities(sink, &others, resolver)?;
            sink.write_all(b"\n}")?;
        }
        Ok(())
    }

    pub fn to_map_string(&self, resolver: &dyn TextureSizeResolver) -> BrushResult<String> {
        let mut buffer = Vec::new();
        self.write(&mut buffer, resolver)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn write_entities<W: Write>(
    sink: &mut W,
    entities: &[&dyn Placeable],
    resolver: &dyn TextureSizeResolver,
) -> BrushResult<()> {
    for entity in entities {
        sink.write_all(entity.serialize(resolver)?.as_bytes())?;
    }
    Ok(())
}
