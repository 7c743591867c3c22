// lzw.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Lempel-Ziv-Welch decompression for GIF rasters
use crate::error::{Error, Result};

/// Maximum code bits allowed for GIF
const MAX_CODE_BITS: u8 = 12;

/// Number of dictionary entries
const MAX_ENTRIES: usize = 1 << MAX_CODE_BITS;

/// Code type
type Code = u16;

/// LZW decompressor for GIF raster data.
///
/// The dictionary tables are allocated once and reused from frame to frame;
/// [reset](struct.Decompressor.html#method.reset) re-initializes all state
/// for a new raster without reallocating.
pub struct Decompressor {
    /// Prefix code of each dictionary entry
    prefix: Box<[Code; MAX_ENTRIES]>,
    /// Suffix byte of each dictionary entry
    suffix: Box<[u8; MAX_ENTRIES]>,
    /// Expansion stack
    stack: Vec<u8>,
    /// Minimum code bits
    min_code_size: u8,
    /// Current code bits
    code_size: u8,
    /// Mask for the current code size
    code_mask: u32,
    /// Dictionary reset code
    clear_code: Code,
    /// Stream end code
    end_code: Code,
    /// Next available dictionary entry
    next_code: Code,
    /// Previously decoded code
    previous: Option<Code>,
    /// First byte of the previous expansion
    first_byte: u8,
    /// Bit accumulator, lowest bit first
    bit_buffer: u32,
    /// Number of bits loaded into the accumulator
    n_bits: u8,
    /// End code seen
    ended: bool,
    /// Pixels discarded past the end of the output
    dropped: usize,
}

impl Decompressor {
    /// Create a new decompressor.
    pub fn new(min_code_size: u8) -> Self {
        let mut dec = Decompressor {
            prefix: Box::new([0; MAX_ENTRIES]),
            suffix: Box::new([0; MAX_ENTRIES]),
            stack: Vec::with_capacity(MAX_ENTRIES + 1),
            min_code_size,
            code_size: 0,
            code_mask: 0,
            clear_code: 0,
            end_code: 0,
            next_code: 0,
            previous: None,
            first_byte: 0,
            bit_buffer: 0,
            n_bits: 0,
            ended: false,
            dropped: 0,
        };
        dec.reset(min_code_size);
        dec
    }

    /// Reset all state for a new raster.
    pub fn reset(&mut self, min_code_size: u8) {
        self.min_code_size = min_code_size;
        self.clear_code = 1 << min_code_size;
        self.end_code = self.clear_code + 1;
        for i in 0..usize::from(self.clear_code) {
            self.prefix[i] = 0;
            self.suffix[i] = i as u8;
        }
        self.clear();
        self.bit_buffer = 0;
        self.n_bits = 0;
        self.ended = false;
        self.dropped = 0;
        self.stack.clear();
    }

    /// Reset the dictionary on a clear code.
    fn clear(&mut self) {
        self.code_size = self.min_code_size + 1;
        self.code_mask = (1 << self.code_size) - 1;
        self.next_code = self.end_code + 1;
        self.previous = None;
    }

    /// Check whether the end code has been decoded.
    pub fn has_ended(&self) -> bool {
        self.ended
    }

    /// Get the count of pixels discarded past the end of the output.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Decompress a buffer of raster data into `out`.
    ///
    /// Sub-block boundaries are invisible to the code stream; feed each
    /// sub-block's bytes in order.  At most `npix` pixels are written; any
    /// further expansion is discarded and counted in
    /// [dropped](struct.Decompressor.html#method.dropped).
    pub fn decompress(
        &mut self,
        bytes: &[u8],
        out: &mut Vec<u8>,
        npix: usize,
    ) -> Result<()> {
        for &byte in bytes {
            if self.ended {
                break;
            }
            self.bit_buffer |= u32::from(byte) << self.n_bits;
            self.n_bits += 8;
            while self.n_bits >= self.code_size {
                let code = (self.bit_buffer & self.code_mask) as Code;
                self.bit_buffer >>= self.code_size;
                self.n_bits -= self.code_size;
                self.step(code, out, npix)?;
                if self.ended {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Process one code.
    fn step(&mut self, code: Code, out: &mut Vec<u8>, npix: usize) -> Result<()> {
        if code == self.clear_code {
            self.clear();
            return Ok(());
        }
        if code == self.end_code {
            self.ended = true;
            return Ok(());
        }
        let previous = match self.previous {
            Some(p) => p,
            None => {
                // first code after a clear must be a literal
                if code >= self.clear_code {
                    return Err(Error::InvalidLzwData);
                }
                self.first_byte = self.suffix[usize::from(code)];
                self.emit(self.first_byte, out, npix);
                self.previous = Some(code);
                return Ok(());
            }
        };
        let mut cur = code;
        if code >= self.next_code {
            if code > self.next_code {
                return Err(Error::InvalidLzwData);
            }
            // previous expansion followed by its own first byte
            self.stack.push(self.first_byte);
            cur = previous;
        }
        while cur >= self.clear_code {
            // clear and end codes never appear in prefix chains
            self.stack.push(self.suffix[usize::from(cur)]);
            cur = self.prefix[usize::from(cur)];
        }
        self.first_byte = self.suffix[usize::from(cur)];
        self.stack.push(self.first_byte);
        while let Some(b) = self.stack.pop() {
            self.emit(b, out, npix);
        }
        if usize::from(self.next_code) < MAX_ENTRIES {
            self.prefix[usize::from(self.next_code)] = previous;
            self.suffix[usize::from(self.next_code)] = self.first_byte;
            self.next_code += 1;
            if u32::from(self.next_code) == self.code_mask + 1
                && self.code_size < MAX_CODE_BITS
            {
                self.code_size += 1;
                self.code_mask = (1 << self.code_size) - 1;
            }
        }
        self.previous = Some(code);
        Ok(())
    }

    /// Emit one pixel, discarding past the end of the output.
    fn emit(&mut self, byte: u8, out: &mut Vec<u8>, npix: usize) {
        if out.len() < npix {
            out.push(byte);
        } else {
            self.dropped += 1;
        }
    }
}
