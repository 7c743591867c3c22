// session.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Frame decoding and animation playback sessions
use crate::block::{ColorTable, DisposalMethod, GifDocument};
use crate::error::{Error, Result};
use crate::lzw::Decompressor;
use crate::parse::parse;
use crate::scan::{classify, Classification};
use crate::source::{BufferSource, SeekableSource, Source, StreamSource};
use log::warn;
use std::io::Read;

/// One fully decoded frame: color table indices plus playback metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameIndices {
    /// Frame width
    pub width: u16,
    /// Frame height
    pub height: u16,
    /// Color table indices, row-major from the top, width * height long
    pub indices: Vec<u8>,
    /// Color table for this frame (local if present, else global)
    pub palette: ColorTable,
    /// Transparent color index, if set
    pub transparent_color: Option<u8>,
    /// Display delay in milliseconds
    pub delay_millis: u32,
    /// Disposal method
    pub disposal_method: DisposalMethod,
}

/// Decode one frame of a parsed document into color table indices.
///
/// Seeks to the frame's raster span, so repeated calls for the same index
/// decode to identical buffers.  Interlaced rasters are reordered into
/// row-major order.
pub fn decode_frame<S: SeekableSource>(
    src: &mut S,
    doc: &GifDocument,
    index: usize,
) -> Result<FrameIndices> {
    let mut decompressor = Decompressor::new(2);
    decode_frame_with(&mut decompressor, src, doc, index)
}

/// Decode one frame with a reusable decompressor.
fn decode_frame_with<S: SeekableSource>(
    decompressor: &mut Decompressor,
    src: &mut S,
    doc: &GifDocument,
    index: usize,
) -> Result<FrameIndices> {
    let frame = doc.frame(index).ok_or(Error::FrameIndexOutOfBounds)?;
    let palette = doc
        .frame_palette(index)
        .cloned()
        .ok_or(Error::MissingColorTable)?;
    let npix = frame.image_sz();
    src.seek_to(frame.raster_offset)?;
    src.skip(1)?; // min code size byte, validated at parse time
    decompressor.reset(frame.min_code_size);
    let mut indices = Vec::with_capacity(npix);
    let mut block = [0u8; 255];
    while indices.len() < npix && !decompressor.has_ended() {
        let len = usize::from(src.read_u8()?);
        if len == 0 {
            break;
        }
        let block = &mut block[..len];
        src.read_exact(block)?;
        decompressor.decompress(block, &mut indices, npix)?;
    }
    if indices.len() < npix {
        return Err(Error::IncompleteFrameData);
    }
    if decompressor.dropped() > 0 {
        warn!("extra raster data: {} pixels", decompressor.dropped());
    }
    if frame.interlaced {
        indices = deinterlace(&indices, usize::from(frame.width));
    }
    Ok(FrameIndices {
        width: frame.width,
        height: frame.height,
        indices,
        palette,
        transparent_color: frame.transparent_color(),
        delay_millis: frame.delay_millis(),
        disposal_method: frame.disposal_method(),
    })
}

/// Reorder interlaced rows into row-major order.
///
/// Rows arrive in the standard four-pass interleave: every 8th row from the
/// top, every 8th from row 4, every 4th from row 2, every 2nd from row 1.
fn deinterlace(indices: &[u8], width: usize) -> Vec<u8> {
    let mut out = vec![0u8; indices.len()];
    let height = if width > 0 { indices.len() / width } else { 0 };
    let mut from = 0;
    for &(start, step) in &[(0, 8), (4, 8), (2, 4), (1, 2)] {
        let mut row = start;
        while row < height {
            let src = &indices[from * width..(from + 1) * width];
            out[row * width..(row + 1) * width].copy_from_slice(src);
            from += 1;
            row += step;
        }
    }
    out
}

/// Playback session over an animated GIF held in memory.
///
/// Presents a pull-model frame cursor: the host polls
/// [advance](struct.Animation.html#method.advance) and
/// [decode_current](struct.Animation.html#method.decode_current) on its own
/// schedule, and the session never calls back.
pub struct Animation {
    /// Raw GIF data
    data: Vec<u8>,
    /// Parsed document
    doc: GifDocument,
    /// Current frame cursor
    cursor: usize,
    /// Raster decompressor, reused across frames
    decompressor: Decompressor,
}

impl Animation {
    /// Create an animation from GIF data in memory.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let doc = {
            let mut src = BufferSource::new(&data);
            parse(&mut src)?
        };
        Ok(Animation {
            data,
            doc,
            cursor: 0,
            decompressor: Decompressor::new(2),
        })
    }

    /// Create an animation by reading a stream to its end.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::new(data)
    }

    /// Get the parsed document.
    pub fn document(&self) -> &GifDocument {
        &self.doc
    }

    /// Get the number of frames.
    pub fn frame_count(&self) -> usize {
        self.doc.frame_count()
    }

    /// Get the loop count; zero means loop forever.
    pub fn loop_count(&self) -> u16 {
        self.doc.loop_count
    }

    /// Get the display delay of a frame, in milliseconds.
    pub fn delay_millis(&self, i: usize) -> Option<u32> {
        self.doc.delay_millis(i)
    }

    /// Get the current frame cursor.
    pub fn current_frame(&self) -> usize {
        self.cursor
    }

    /// Move the frame cursor forward, wrapping at the end.
    pub fn advance(&mut self) {
        let count = self.doc.frame_count();
        if count > 0 {
            self.cursor = (self.cursor + 1) % count;
        }
    }

    /// Decode the frame under the cursor.
    ///
    /// Repeated calls without an intervening
    /// [advance](struct.Animation.html#method.advance) decode the same frame
    /// to the same indices.
    pub fn decode_current(&mut self) -> Result<FrameIndices> {
        let mut src = BufferSource::new(&self.data);
        decode_frame_with(&mut self.decompressor, &mut src, &self.doc, self.cursor)
    }
}

/// Decoder for static (non-animated) images.
///
/// The GIF core never rasterizes static images itself; a platform bitmap
/// decoder is plugged in behind this trait.
pub trait StaticDecoder {
    /// Decoded image type
    type Output;

    /// Decode a static image from raw data.
    fn decode_static(&mut self, data: &[u8]) -> Result<Self::Output>;
}

/// An image decoded by [decode_image](fn.decode_image.html) or
/// [decode_stream](fn.decode_stream.html).
pub enum Image<T> {
    /// Animated GIF playback session
    Animated(Animation),
    /// Statically decoded image
    Static(T),
}

/// Decode an image from bytes in memory.
///
/// Animated GIFs become [Animation](struct.Animation.html) sessions;
/// everything else, including static GIFs, is handed to the static decoder.
pub fn decode_image<D: StaticDecoder>(
    data: &[u8],
    decoder: &mut D,
) -> Result<Image<D::Output>> {
    let mut src = BufferSource::new(data);
    match classify(&mut src)? {
        Classification::AnimatedGif { .. } => {
            Ok(Image::Animated(Animation::new(data.to_vec())?))
        }
        _ => Ok(Image::Static(decoder.decode_static(data)?)),
    }
}

/// Decode an image from a forward-only stream.
///
/// The stream is classified first, then rewound and read to its end.
pub fn decode_stream<R: Read, D: StaticDecoder>(
    reader: R,
    decoder: &mut D,
) -> Result<Image<D::Output>> {
    let mut src = StreamSource::new(reader);
    let classification = classify(&mut src)?;
    src.rewind();
    let data = src.collect()?;
    match classification {
        Classification::AnimatedGif { .. } => {
            Ok(Image::Animated(Animation::new(data)?))
        }
        _ => Ok(Image::Static(decoder.decode_static(&data)?)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fixture::*;
    use std::io::Cursor;

    fn two_frame_gif() -> Vec<u8> {
        let mut gif = screen_2x2(true);
        gif.extend(netscape(0));
        gif.extend(graphic_control(1));
        gif.extend(image_2x2(false));
        gif.extend(graphic_control(2));
        gif.extend(image_2x2(true));
        gif.push(TRAILER);
        gif
    }

    #[test]
    fn decode_single_frame() {
        let mut gif = screen_2x2(true);
        gif.extend(image_2x2(false));
        gif.push(TRAILER);
        let mut src = BufferSource::new(&gif);
        let doc = parse(&mut src).unwrap();
        let f = decode_frame(&mut src, &doc, 0).unwrap();
        assert_eq!((f.width, f.height), (2, 2));
        assert_eq!(f.indices, PIXELS_2X2);
        assert_eq!(f.palette.len(), 2);
        assert_eq!(f.delay_millis, 0);
        assert_eq!(f.transparent_color, None);
    }

    #[test]
    fn decode_is_idempotent() {
        let gif = two_frame_gif();
        let mut src = BufferSource::new(&gif);
        let doc = parse(&mut src).unwrap();
        let a = decode_frame(&mut src, &doc, 1).unwrap();
        let b = decode_frame(&mut src, &doc, 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn frame_index_out_of_bounds() {
        let gif = two_frame_gif();
        let mut src = BufferSource::new(&gif);
        let doc = parse(&mut src).unwrap();
        assert!(matches!(
            decode_frame(&mut src, &doc, 2),
            Err(Error::FrameIndexOutOfBounds)
        ));
    }

    #[test]
    fn local_color_table_preferred() {
        let gif = two_frame_gif();
        let mut src = BufferSource::new(&gif);
        let doc = parse(&mut src).unwrap();
        let f = decode_frame(&mut src, &doc, 1).unwrap();
        assert_eq!(f.palette.rgb(0), Some([0x10, 0x20, 0x30]));
        let f = decode_frame(&mut src, &doc, 0).unwrap();
        assert_eq!(f.palette.rgb(0), Some([0x00, 0x00, 0x00]));
    }

    #[test]
    fn missing_color_table() {
        let mut gif = screen_2x2(false);
        gif.extend(image_2x2(false));
        gif.push(TRAILER);
        let mut src = BufferSource::new(&gif);
        let doc = parse(&mut src).unwrap();
        assert!(matches!(
            decode_frame(&mut src, &doc, 0),
            Err(Error::MissingColorTable)
        ));
    }

    #[test]
    fn raster_ends_early() {
        let mut gif = screen_2x2(true);
        gif.extend_from_slice(&[
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00,
        ]);
        // only a clear code and one literal before the chain terminator
        gif.extend_from_slice(&[0x02, 0x01, 0x0C, 0x00]);
        gif.push(TRAILER);
        let mut src = BufferSource::new(&gif);
        let doc = parse(&mut src).unwrap();
        assert!(matches!(
            decode_frame(&mut src, &doc, 0),
            Err(Error::IncompleteFrameData)
        ));
    }

    #[test]
    fn hostile_code_in_raster() {
        let mut gif = screen_2x2(true);
        gif.extend_from_slice(&[
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00,
        ]);
        // clear code followed by a code past the dictionary
        gif.extend_from_slice(&[0x02, 0x01, 0x3C, 0x00]);
        gif.push(TRAILER);
        let mut src = BufferSource::new(&gif);
        let doc = parse(&mut src).unwrap();
        assert!(matches!(
            decode_frame(&mut src, &doc, 0),
            Err(Error::InvalidLzwData)
        ));
    }

    #[test]
    fn interlaced_rows_reordered() {
        let mut gif = b"GIF89a".to_vec();
        gif.extend_from_slice(&[0x02, 0x00, 0x04, 0x00, 0x80, 0x00, 0x00]);
        gif.extend_from_slice(&[0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF]);
        // 2x4 interlaced frame
        gif.extend_from_slice(&[
            0x2C, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x04, 0x00, 0x40,
        ]);
        gif.extend_from_slice(&[0x02, 0x05, 0x04, 0x12, 0x10, 0x01, 0x05, 0x00]);
        gif.push(TRAILER);
        let mut src = BufferSource::new(&gif);
        let doc = parse(&mut src).unwrap();
        assert!(doc.frames[0].interlaced);
        let f = decode_frame(&mut src, &doc, 0).unwrap();
        // rows decoded in pass order 0, 2, 1, 3
        assert_eq!(f.indices, vec![0, 0, 0, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn deinterlace_row_order() {
        let rows: Vec<u8> = (0..8).collect();
        assert_eq!(deinterlace(&rows, 1), vec![0, 4, 2, 5, 1, 6, 3, 7]);
    }

    #[test]
    fn animation_playback() {
        let mut anim = Animation::new(two_frame_gif()).unwrap();
        assert_eq!(anim.frame_count(), 2);
        assert_eq!(anim.loop_count(), 0);
        assert_eq!(anim.delay_millis(0), Some(10));
        assert_eq!(anim.delay_millis(1), Some(20));
        assert_eq!(anim.delay_millis(2), None);
        assert_eq!(anim.current_frame(), 0);
        let first = anim.decode_current().unwrap();
        assert_eq!(first.indices, PIXELS_2X2);
        assert_eq!(first.delay_millis, 10);
        anim.advance();
        assert_eq!(anim.current_frame(), 1);
        let second = anim.decode_current().unwrap();
        assert_eq!(second.delay_millis, 20);
        anim.advance();
        assert_eq!(anim.current_frame(), 0);
        assert_eq!(anim.decode_current().unwrap(), first);
    }

    #[test]
    fn animation_from_reader() {
        let anim = Animation::from_reader(Cursor::new(two_frame_gif())).unwrap();
        assert_eq!(anim.frame_count(), 2);
    }

    /// Stand-in for a platform bitmap decoder
    struct LenDecoder;

    impl StaticDecoder for LenDecoder {
        type Output = usize;

        fn decode_static(&mut self, data: &[u8]) -> Result<usize> {
            if data.starts_with(b"\x89PNG") || data.starts_with(b"GIF") {
                Ok(data.len())
            } else {
                Err(Error::UnsupportedImage)
            }
        }
    }

    #[test]
    fn dispatch_animated() {
        let gif = two_frame_gif();
        match decode_image(&gif, &mut LenDecoder).unwrap() {
            Image::Animated(anim) => assert_eq!(anim.frame_count(), 2),
            Image::Static(_) => panic!("animated GIF decoded as static"),
        }
    }

    #[test]
    fn dispatch_static() {
        let png = b"\x89PNG\r\n\x1a\n more";
        match decode_image(&png[..], &mut LenDecoder).unwrap() {
            Image::Static(len) => assert_eq!(len, png.len()),
            Image::Animated(_) => panic!("PNG decoded as animation"),
        }
        // static GIFs also go to the static decoder
        let mut gif = screen_2x2(true);
        gif.extend(image_2x2(false));
        gif.push(TRAILER);
        assert!(matches!(
            decode_image(&gif, &mut LenDecoder).unwrap(),
            Image::Static(_)
        ));
    }

    #[test]
    fn dispatch_unsupported() {
        assert!(matches!(
            decode_image(b"garbage", &mut LenDecoder),
            Err(Error::UnsupportedImage)
        ));
    }

    #[test]
    fn dispatch_stream() {
        let gif = two_frame_gif();
        match decode_stream(Cursor::new(gif), &mut LenDecoder).unwrap() {
            Image::Animated(anim) => assert_eq!(anim.loop_count(), 0),
            Image::Static(_) => panic!("animated GIF decoded as static"),
        }
    }
}
