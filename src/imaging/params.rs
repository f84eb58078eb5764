//! Encoding parameters.
//!
//! [`Quality`] is the only knob the JPEG encoder exposes here. Cache files are
//! written at [`Quality::MAX`] by default: they are a normalized copy of the
//! user's photo, not a thumbnail, and a second lossy pass is already happening.

/// JPEG encoding quality (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: Quality = Quality(100);

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::MAX
    }
}
