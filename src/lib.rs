// lib.rs      giflet crate.
//
// Copyright (c) 2026  Douglas Lau
//
//! A library for classifying and decoding animated GIF images.
//!
//! [classify](fn.classify.html) answers, with the minimum bytes consumed,
//! whether a stream is a GIF, whether it is animated, and what its loop
//! count is.  [parse](fn.parse.html) walks the whole structure into a
//! [GifDocument](block/struct.GifDocument.html) without touching raster
//! data, and [decode_frame](fn.decode_frame.html) expands one frame's LZW
//! raster into color table indices on demand.  Rasterization to RGBA and
//! frame scheduling are left to the caller; an
//! [Animation](struct.Animation.html) session provides the frame cursor a
//! scheduler polls.
//!
//! ## Example: parse and decode every frame
//! ```
//! # fn main() -> Result<(), giflet::Error> {
//! # let gif = &[
//! #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
//! #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
//! #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
//! #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
//! #   0x10, 0x05, 0x00, 0x3b,
//! # ][..];
//! use giflet::{decode_frame, parse, BufferSource};
//!
//! let mut src = BufferSource::new(gif);
//! let doc = parse(&mut src)?;
//! for i in 0..doc.frame_count() {
//!     let frame = decode_frame(&mut src, &doc, i)?;
//!     // ... hand indices and palette to a rasterizer
//!     assert_eq!(frame.indices.len(), 4);
//! }
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

pub mod block;
mod error;
#[cfg(test)]
mod fixture;
mod lzw;
mod parse;
mod scan;
mod session;
mod source;

pub use crate::error::{Error, Result};
pub use crate::parse::{parse, Parser};
pub use crate::scan::{classify, Classification};
pub use crate::session::{
    decode_frame, decode_image, decode_stream, Animation, FrameIndices, Image,
    StaticDecoder,
};
pub use crate::source::{BufferSource, SeekableSource, Source, StreamSource};
