//! Stylesheet injection for color-scheme aware SVG icons.
//!
//! Icons that follow the color scheme contain a `<style>` element with the id
//! `current-color-scheme`. Recoloring replaces the body of that element with a
//! stylesheet generated from the active palette and leaves every other byte of
//! the document as it was.

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::{RenderError, RenderResult};

/// The `id` of the style element whose contents get replaced.
pub const COLOR_SCHEME_STYLE_ID: &str = "current-color-scheme";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read an SVG or SVGZ file, decompressing it when needed.
pub fn read_svg_source(path: &Path) -> RenderResult<Vec<u8>> {
    let data = std::fs::read(path).map_err(|e| RenderError::io(path, e))?;
    if !data.starts_with(&GZIP_MAGIC) {
        return Ok(data);
    }

    let mut decoder = GzDecoder::new(data.as_slice());
    let mut result = Vec::new();
    decoder
        .read_to_end(&mut result)
        .map_err(|e| RenderError::io(path, e))?;
    Ok(result)
}

/// Load an SVG file and inject `stylesheet` into it.
///
/// Returns an empty buffer when the file cannot be read or parsed, so callers
/// can fall back to decoding the file normally.
pub fn recolor_svg_file(path: &Path, stylesheet: &str) -> Vec<u8> {
    let result = read_svg_source(path).and_then(|data| recolor_svg(&data, stylesheet));
    match result {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!(target: "horizon_icons_render::recolor", path = %path.display(), error = %e, "Could not recolor SVG");
            Vec::new()
        }
    }
}

/// Replace the contents of the color-scheme style element with `stylesheet`.
///
/// If the document has no such element the input is returned unchanged.
pub fn recolor_svg(data: &[u8], stylesheet: &str) -> RenderResult<Vec<u8>> {
    let mut reader = Reader::from_reader(data);
    let mut writer = Writer::new(Vec::with_capacity(data.len() + stylesheet.len()));
    let mut buf = Vec::new();
    // Nesting depth inside the replaced element; zero when copying through.
    let mut skip_depth = 0usize;
    let mut replaced = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| RenderError::Svg(format!("at position {}: {}", reader.error_position(), e)))?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
            continue;
        }

        match event {
            Event::Eof => break,
            Event::Start(ref start) if is_color_scheme_style(start) => {
                write_style(&mut writer, start, stylesheet)?;
                skip_depth = 1;
                replaced = true;
            }
            Event::Empty(ref start) if is_color_scheme_style(start) => {
                write_style(&mut writer, start, stylesheet)?;
                replaced = true;
            }
            other => writer.write_event(other).map_err(write_error)?,
        }
        buf.clear();
    }

    if !replaced {
        return Ok(data.to_vec());
    }
    Ok(writer.into_inner())
}

fn is_color_scheme_style(start: &BytesStart<'_>) -> bool {
    start.local_name().as_ref() == b"style"
        && start.attributes().flatten().any(|attr| {
            attr.key.as_ref() == b"id" && attr.value.as_ref() == COLOR_SCHEME_STYLE_ID.as_bytes()
        })
}

fn write_style(
    writer: &mut Writer<Vec<u8>>,
    start: &BytesStart<'_>,
    stylesheet: &str,
) -> RenderResult<()> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    writer
        .write_event(Event::Start(start.clone()))
        .map_err(write_error)?;
    writer
        .write_event(Event::Text(BytesText::new(stylesheet)))
        .map_err(write_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_error)?;
    Ok(())
}

fn write_error(e: impl std::fmt::Display) -> RenderError {
    RenderError::Svg(format!("failed to write document: {}", e))
}
