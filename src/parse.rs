// parse.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Structural GIF parsing producing a frame index
use crate::block::{
    BlockCode, ColorTable, ExtensionCode, Frame, GifDocument, GraphicControl,
    LogicalScreenDesc,
};
use crate::error::{Error, Result};
use crate::scan::read_app_extension;
use crate::source::{skip_sub_blocks, Source};
use log::debug;

/// Default maximum frame size, in pixels
const MAX_FRAME_SZ: usize = 1 << 25;

/// Structural parser for GIF documents.
///
/// Walks the same block sequence as [classify](fn.classify.html), but records
/// the logical screen, color tables and a frame index instead of returning
/// early.  Raster data is skipped, not decoded; each frame remembers where
/// its compressed data lives so it can be decoded on demand.
pub struct Parser {
    /// Maximum frame size, in pixels
    max_frame_sz: Option<usize>,
}

impl Default for Parser {
    fn default() -> Self {
        Parser {
            max_frame_sz: Some(MAX_FRAME_SZ),
        }
    }
}

impl Parser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum frame size (in pixels) to allow for decoding.
    pub fn max_frame_sz(mut self, max_frame_sz: Option<usize>) -> Self {
        self.max_frame_sz = max_frame_sz;
        self
    }

    /// Parse a GIF document from a source.
    pub fn parse<S: Source>(&self, src: &mut S) -> Result<GifDocument> {
        let screen = read_screen_desc(src)?;
        let global_color_table = if screen.has_color_table() {
            Some(read_color_table(src, screen.color_table_len())?)
        } else {
            None
        };
        let mut doc = GifDocument {
            screen,
            global_color_table,
            frames: Vec::new(),
            loop_count: 1,
        };
        let mut pending_gce: Option<GraphicControl> = None;
        loop {
            let b = src.read_u8()?;
            match BlockCode::from_u8(b) {
                Some(BlockCode::ImageDesc_) => {
                    let frame =
                        self.read_image(src, &doc.screen, pending_gce.take())?;
                    doc.frames.push(frame);
                }
                Some(BlockCode::Extension_) => {
                    read_extension(src, &mut doc, &mut pending_gce)?;
                }
                Some(BlockCode::Trailer_) => break,
                None if b == 0x00 => {
                    // tolerate stray zero bytes between blocks
                    debug!("stray zero byte before {:?}", src.position());
                }
                None => return Err(Error::InvalidBlockCode),
            }
        }
        Ok(doc)
    }

    /// Read an image descriptor, its color table and raster span.
    fn read_image<S: Source>(
        &self,
        src: &mut S,
        screen: &LogicalScreenDesc,
        graphic_control_ext: Option<GraphicControl>,
    ) -> Result<Frame> {
        let left = src.read_u16_le()?;
        let top = src.read_u16_le()?;
        let width = src.read_u16_le()?;
        let height = src.read_u16_le()?;
        let flags = src.read_u8()?;
        if u32::from(left) + u32::from(width) > u32::from(screen.screen_width())
            || u32::from(top) + u32::from(height)
                > u32::from(screen.screen_height())
        {
            return Err(Error::InvalidFrameDimensions);
        }
        let image_sz = usize::from(width) * usize::from(height);
        if let Some(sz) = self.max_frame_sz {
            if image_sz > sz {
                return Err(Error::TooLargeFrame);
            }
        }
        let interlaced = flags & 0b0100_0000 != 0;
        let local_color_table = if flags & 0b1000_0000 != 0 {
            let entries = 2usize << (flags & 0b0000_0111) as usize;
            Some(read_color_table(src, entries)?)
        } else {
            None
        };
        let raster_offset = src.position();
        let min_code_size = src.read_u8()?;
        if min_code_size < 2 || min_code_size > 8 {
            return Err(Error::InvalidCodeSize);
        }
        debug!(
            "frame {}x{} at {},{}, raster offset {}",
            width, height, left, top, raster_offset
        );
        skip_sub_blocks(src)?;
        Ok(Frame {
            left,
            top,
            width,
            height,
            interlaced,
            local_color_table,
            graphic_control_ext,
            min_code_size,
            raster_offset,
        })
    }
}

/// Parse a GIF document from a source, with default limits.
pub fn parse<S: Source>(src: &mut S) -> Result<GifDocument> {
    Parser::new().parse(src)
}

/// Read the header and logical screen descriptor.
fn read_screen_desc<S: Source>(src: &mut S) -> Result<LogicalScreenDesc> {
    let mut sig = [0u8; 6];
    src.read_exact(&mut sig)?;
    if &sig[..3] != b"GIF" {
        return Err(Error::MalformedHeader);
    }
    let version = [sig[3], sig[4], sig[5]];
    match &version {
        b"87a" | b"89a" => {}
        _ => return Err(Error::UnsupportedVersion(version)),
    }
    let width = src.read_u16_le()?;
    let height = src.read_u16_le()?;
    let flags = src.read_u8()?;
    let bg_color = src.read_u8()?;
    let aspect = src.read_u8()?;
    Ok(LogicalScreenDesc::default()
        .with_screen_width(width)
        .with_screen_height(height)
        .with_flags(flags)
        .with_background_color_idx(bg_color)
        .with_pixel_aspect_ratio(aspect))
}

/// Read a color table of the given entry count.
fn read_color_table<S: Source>(
    src: &mut S,
    entries: usize,
) -> Result<ColorTable> {
    let mut colors = vec![0u8; entries * 3];
    src.read_exact(&mut colors)?;
    Ok(ColorTable::with_colors(&colors))
}

/// Read one extension block after its introducer byte.
fn read_extension<S: Source>(
    src: &mut S,
    doc: &mut GifDocument,
    pending_gce: &mut Option<GraphicControl>,
) -> Result<()> {
    match ExtensionCode::from(src.read_u8()?) {
        ExtensionCode::GraphicControl_ => {
            if pending_gce.is_some() {
                debug!("graphic control extension superseded");
            }
            *pending_gce = Some(read_graphic_control(src)?);
        }
        ExtensionCode::Application_ => {
            if let Some(loop_count) = read_app_extension(src)? {
                doc.loop_count = loop_count;
            }
        }
        code => {
            debug!("skipping extension: {:?}", code);
            skip_sub_blocks(src)?;
        }
    }
    Ok(())
}

/// Read a graphic control extension after its label byte.
fn read_graphic_control<S: Source>(src: &mut S) -> Result<GraphicControl> {
    if src.read_u8()? != 4 {
        return Err(Error::MalformedGraphicControlExtension);
    }
    let mut buf = [0u8; 4];
    src.read_exact(&mut buf)?;
    let mut control = GraphicControl::default();
    control.set_flags(buf[0]);
    control.set_delay_time_cs(u16::from(buf[1]) | u16::from(buf[2]) << 8);
    control.set_transparent_color_idx(buf[3]);
    skip_sub_blocks(src)?;
    Ok(control)
}
