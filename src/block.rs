// block.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Data model for parsed GIF structures
use pix::rgb::SRgb8;
use pix::Palette;

/// Color channels in a color table entry
const CHANNELS: usize = 3;

/// Top-level block introducers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b',' => Some(ImageDesc_), // (0x2C) Image separator
            b'!' => Some(Extension_), // (0x21) Extension introducer
            b';' => Some(Trailer_),   // (0x3B) GIF trailer
            _ => None,
        }
    }
}

/// Extension block labels
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    PlainText_,
    GraphicControl_,
    Comment_,
    Application_,
    Unknown_(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0x01 => PlainText_,
            0xF9 => GraphicControl_,
            0xFE => Comment_,
            0xFF => Application_,
            _ => Unknown_(n),
        }
    }
}

/// Method to dispose of a frame before the next one is drawn
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisposalMethod {
    /// No disposal specified
    NoAction,
    /// Keep the frame in place
    Keep,
    /// Restore to the background color
    Background,
    /// Restore to the previous frame
    Previous,
    /// Reserved methods
    Reserved(u8),
}

impl Default for DisposalMethod {
    fn default() -> Self {
        DisposalMethod::NoAction
    }
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            _ => Reserved(n),
        }
    }
}

/// Logical Screen Descriptor
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8, // index into global color table
    pixel_aspect_ratio: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn with_background_color_idx(mut self, background_color_idx: u8) -> Self {
        self.background_color_idx = background_color_idx;
        self
    }
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }
    pub fn with_pixel_aspect_ratio(mut self, pixel_aspect_ratio: u8) -> Self {
        self.pixel_aspect_ratio = pixel_aspect_ratio;
        self
    }
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
    /// Check whether a global color table is present.
    pub fn has_color_table(&self) -> bool {
        self.flags & Self::COLOR_TABLE_PRESENT != 0
    }
    /// Get the global color table length (number of entries).
    pub fn color_table_len(&self) -> usize {
        if self.has_color_table() {
            2 << (self.flags & Self::COLOR_TABLE_SIZE) as usize
        } else {
            0
        }
    }
    /// Get the global color table size in bytes.
    pub fn color_table_size_bytes(&self) -> usize {
        self.color_table_len() * CHANNELS
    }
}

/// Color table of RGB entries, global or local.
///
/// The entry count is always a power of two between 2 and 256.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<u8>,
}

impl ColorTable {
    /// Create a color table from raw RGB triples.
    pub fn with_colors(colors: &[u8]) -> Self {
        assert_eq!(colors.len() / CHANNELS * CHANNELS, colors.len());
        let colors = colors.to_vec();
        ColorTable { colors }
    }
    /// Get the number of color entries.
    pub fn len(&self) -> usize {
        self.colors.len() / CHANNELS
    }
    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
    /// Get the raw RGB triples.
    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
    /// Get one RGB entry.
    pub fn rgb(&self, i: usize) -> Option<[u8; 3]> {
        let c = self.colors.get(i * CHANNELS..i * CHANNELS + CHANNELS)?;
        Some([c[0], c[1], c[2]])
    }
    /// Convert into a [Palette] for rasterization.
    ///
    /// [Palette]: https://docs.rs/pix/latest/pix/struct.Palette.html
    pub fn palette(&self) -> Palette {
        let mut palette = Palette::new(self.len());
        for rgb in self.colors.chunks_exact(CHANNELS) {
            palette.set_entry(SRgb8::new(rgb[0], rgb[1], rgb[2]));
        }
        palette
    }
}

/// Graphic Control extension values
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
    pub fn set_delay_time_cs(&mut self, delay_time_cs: u16) {
        self.delay_time_cs = delay_time_cs;
    }
    pub fn transparent_color(&self) -> Option<u8> {
        if self.flags & Self::TRANSPARENT_COLOR != 0 {
            Some(self.transparent_color_idx)
        } else {
            None
        }
    }
    pub fn set_transparent_color_idx(&mut self, transparent_color_idx: u8) {
        self.transparent_color_idx = transparent_color_idx;
    }
}

/// One frame of a parsed GIF document.
///
/// Raster data is not copied at parse time; `raster_offset` records where the
/// frame's compressed data begins in the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Left position on the logical screen
    pub left: u16,
    /// Top position on the logical screen
    pub top: u16,
    /// Frame width
    pub width: u16,
    /// Frame height
    pub height: u16,
    /// Interlaced raster flag
    pub interlaced: bool,
    /// Local color table, if present
    pub local_color_table: Option<ColorTable>,
    /// Graphic control extension preceding the image, if any
    pub graphic_control_ext: Option<GraphicControl>,
    /// LZW minimum code size
    pub min_code_size: u8,
    /// Stream position of the LZW minimum code size byte
    pub raster_offset: u64,
}

impl Frame {
    /// Get the frame size in pixels.
    pub fn image_sz(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
    /// Get the display delay in milliseconds.
    ///
    /// The stored centisecond delay is preserved verbatim; zero-delay frames
    /// are not clamped here, that is a scheduling decision.
    pub fn delay_millis(&self) -> u32 {
        let cs = self
            .graphic_control_ext
            .map(|g| g.delay_time_cs())
            .unwrap_or(0);
        u32::from(cs) * 10
    }
    /// Get the disposal method.
    pub fn disposal_method(&self) -> DisposalMethod {
        self.graphic_control_ext
            .map(|g| g.disposal_method())
            .unwrap_or_default()
    }
    /// Get the transparent color index, if set.
    pub fn transparent_color(&self) -> Option<u8> {
        self.graphic_control_ext.and_then(|g| g.transparent_color())
    }
}

/// Parsed structure of a whole GIF file, without raster data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifDocument {
    /// Logical screen descriptor
    pub screen: LogicalScreenDesc,
    /// Global color table, if present
    pub global_color_table: Option<ColorTable>,
    /// Frames in order of appearance
    pub frames: Vec<Frame>,
    /// Animation loop count; zero means loop forever
    pub loop_count: u16,
}

impl GifDocument {
    /// Get the number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
    /// Get one frame.
    pub fn frame(&self, i: usize) -> Option<&Frame> {
        self.frames.get(i)
    }
    /// Get the display delay of a frame, in milliseconds.
    pub fn delay_millis(&self, i: usize) -> Option<u32> {
        self.frames.get(i).map(Frame::delay_millis)
    }
    /// Get the color table for a frame: local if present, else global.
    pub fn frame_palette(&self, i: usize) -> Option<&ColorTable> {
        let frame = self.frames.get(i)?;
        frame
            .local_color_table
            .as_ref()
            .or_else(|| self.global_color_table.as_ref())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn disposal_bits() {
        assert_eq!(DisposalMethod::from(0), DisposalMethod::NoAction);
        assert_eq!(DisposalMethod::from(1), DisposalMethod::Keep);
        assert_eq!(DisposalMethod::from(2), DisposalMethod::Background);
        assert_eq!(DisposalMethod::from(3), DisposalMethod::Previous);
        assert_eq!(DisposalMethod::from(5), DisposalMethod::Reserved(5));
    }

    #[test]
    fn graphic_control_flags() {
        let mut g = GraphicControl::default();
        g.set_flags(0b0000_1001); // keep + transparent
        g.set_transparent_color_idx(7);
        assert_eq!(g.disposal_method(), DisposalMethod::Background);
        assert_eq!(g.transparent_color(), Some(7));
        g.set_flags(0b0000_0100);
        assert_eq!(g.disposal_method(), DisposalMethod::Keep);
        assert_eq!(g.transparent_color(), None);
    }

    #[test]
    fn screen_color_table() {
        let d = LogicalScreenDesc::default().with_flags(0x91);
        assert!(d.has_color_table());
        assert_eq!(d.color_table_len(), 4);
        assert_eq!(d.color_table_size_bytes(), 12);
        let d = LogicalScreenDesc::default().with_flags(0x07);
        assert!(!d.has_color_table());
        assert_eq!(d.color_table_len(), 0);
    }

    #[test]
    fn color_table_entries() {
        let t = ColorTable::with_colors(&[0, 0, 0, 0xFF, 0xFF, 0xFF]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rgb(1), Some([0xFF, 0xFF, 0xFF]));
        assert_eq!(t.rgb(2), None);
        let p = t.palette();
        assert!(p.entry(1).is_some());
        assert!(p.entry(2).is_none());
    }

    #[test]
    fn frame_delay() {
        let mut g = GraphicControl::default();
        g.set_delay_time_cs(7);
        let f = Frame {
            left: 0,
            top: 0,
            width: 4,
            height: 2,
            interlaced: false,
            local_color_table: None,
            graphic_control_ext: Some(g),
            min_code_size: 2,
            raster_offset: 0,
        };
        assert_eq!(f.delay_millis(), 70);
        assert_eq!(f.image_sz(), 8);
    }
}
