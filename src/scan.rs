// scan.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Fast GIF classification without full parsing
use crate::block::ExtensionCode;
use crate::error::Result;
use crate::source::{skip_sub_blocks, Source};
use log::debug;

/// Result of classifying a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Stream does not start with a GIF signature.
    NotGif,
    /// A GIF with a single image and no animation extensions.
    StaticGif {
        /// Always 1 for a static image
        loop_count: u16,
    },
    /// A GIF with animation extensions before the first image.
    AnimatedGif {
        /// NETSCAPE2.0 loop count; zero means loop forever, and 1 is the
        /// default when the extension is absent
        loop_count: u16,
    },
}

/// Classify a byte stream with the minimum number of bytes consumed.
///
/// A stream not starting with `GIF87a` or `GIF89a` is
/// [NotGif](enum.Classification.html#variant.NotGif); no more than the six
/// signature bytes are read to decide that.  A GIF is animated when a graphic
/// control or application extension appears before the first image
/// descriptor.  Any EOF after a valid signature is
/// [UnexpectedEndOfFile](enum.Error.html#variant.UnexpectedEndOfFile).
pub fn classify<S: Source>(src: &mut S) -> Result<Classification> {
    if !read_signature(src)? {
        return Ok(Classification::NotGif);
    }
    skip_screen_desc(src)?;
    let mut animated = false;
    loop {
        match src.read_u8()? {
            0x2C => break, // image separator
            0x21 => match ExtensionCode::from(src.read_u8()?) {
                ExtensionCode::GraphicControl_ => {
                    animated = true;
                    skip_sub_blocks(src)?;
                }
                ExtensionCode::Application_ => {
                    animated = true;
                    if let Some(loop_count) = read_app_extension(src)? {
                        return Ok(Classification::AnimatedGif { loop_count });
                    }
                }
                code => {
                    debug!("skipping extension: {:?}", code);
                    skip_sub_blocks(src)?;
                }
            },
            _ => break, // trailer or unknown block
        }
    }
    Ok(if animated {
        Classification::AnimatedGif { loop_count: 1 }
    } else {
        Classification::StaticGif { loop_count: 1 }
    })
}

/// Read the 6-byte signature, one byte at a time.
///
/// Stops at the first mismatching byte; a stream ending inside the signature
/// is a mismatch, not an error.
fn read_signature<S: Source>(src: &mut S) -> Result<bool> {
    const MAGIC: &[u8; 4] = b"GIF8";
    for i in 0..6 {
        let b = match src.read_u8() {
            Ok(b) => b,
            Err(crate::error::Error::UnexpectedEndOfFile) => return Ok(false),
            Err(e) => return Err(e),
        };
        let ok = match i {
            0..=3 => b == MAGIC[i],
            4 => b == b'7' || b == b'9',
            _ => b == b'a',
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Skip the logical screen descriptor and global color table.
fn skip_screen_desc<S: Source>(src: &mut S) -> Result<()> {
    src.skip(4)?; // screen width and height
    let flags = src.read_u8()?;
    src.skip(2)?; // background color index and pixel aspect ratio
    if flags & 0x80 != 0 {
        let entries = 2usize << (flags & 0x07) as usize;
        src.skip(3 * entries)?;
    }
    Ok(())
}

/// Check an application ID / auth code for the looping convention.
pub(crate) fn is_looping(app_id: &[u8]) -> bool {
    app_id == b"NETSCAPE2.0" || app_id == b"ANIMEXTS1.0"
}

/// Read an application extension after its label byte.
///
/// Returns the loop count when the extension is a looping one; otherwise the
/// whole sub-block chain is skipped.
pub(crate) fn read_app_extension<S: Source>(src: &mut S) -> Result<Option<u16>> {
    let len = usize::from(src.read_u8()?);
    if len == 0 {
        return Ok(None);
    }
    let mut app_id = [0u8; 255];
    let app_id = &mut app_id[..len];
    src.read_exact(app_id)?;
    if is_looping(app_id) {
        Ok(Some(read_loop_count(src)?))
    } else {
        skip_sub_blocks(src)?;
        Ok(None)
    }
}

/// Read the looping extension's remaining sub-blocks.
///
/// The count is in a sub-block whose first byte is 0x01, bytes 1..3
/// little-endian.  Without one, zero (loop forever) is returned.
pub(crate) fn read_loop_count<S: Source>(src: &mut S) -> Result<u16> {
    let mut loop_count = 0;
    let mut block = [0u8; 255];
    loop {
        let len = usize::from(src.read_u8()?);
        if len == 0 {
            return Ok(loop_count);
        }
        let block = &mut block[..len];
        src.read_exact(block)?;
        if block[0] == 0x01 && len >= 3 {
            loop_count = u16::from(block[1]) | u16::from(block[2]) << 8;
        }
    }
}
