//! CSV rendering of extracted vehicle-position records.
//!
//! Output is a header row followed by one row per entity, `\n`-terminated.
//! Values are written verbatim: no quoting and no escaping. Every column comes
//! from a numeric, enum or identifier field, so an embedded comma is not
//! expected, but one would shift the remaining columns of that row.

use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;
use tracing::debug;

use crate::fields::FieldSpec;
use crate::gtfs_rt::FeedEntity;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to write CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Writes the header and one record per entity to `writer`.
///
/// Returns the number of records written, not counting the header.
pub fn write_records<W: Write>(
    writer: W,
    spec: &FieldSpec,
    entities: &[FeedEntity],
) -> Result<usize, FormatError> {
    let mut builder = WriterBuilder::new();
    builder
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'));
    let mut writer = builder.from_writer(writer);

    writer.write_record(spec.names())?;
    debug!(header = %spec.names().collect::<Vec<_>>().join(","), "CSV header written");

    for entity in entities {
        let record = spec.render(entity);
        debug!(entity_id = %entity.id, record = %record.join(","), "CSV record");
        if is_lone_empty(&record) {
            // csv always quotes a lone empty field as `""`; emit the bare terminator.
            let mut inner = writer.into_inner().map_err(|e| e.into_error())?;
            inner.write_all(b"\n")?;
            writer = builder.from_writer(inner);
            continue;
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(entities.len())
}

fn is_lone_empty(record: &[String]) -> bool {
    matches!(record, [only] if only.is_empty())
}

/// Renders the header and records into a single text block.
pub fn format_records(spec: &FieldSpec, entities: &[FeedEntity]) -> Result<String, FormatError> {
    let mut buf = Vec::new();
    write_records(&mut buf, spec, entities)?;
    Ok(String::from_utf8(buf)?)
}
