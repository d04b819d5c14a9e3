pub use kurbo::{Point, Size, Vec2};

/// Opaque identity of an [`ImageDocument`](crate::ImageDocument) within one workbench.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct DocId(pub u64);

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Straight (non-premultiplied) RGBA8 identity color drawn around a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BorderColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl BorderColor {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::opaque(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        }
    }
}

/// The fixed identity palette; documents take colors from it round-robin in creation order.
pub const DEFAULT_PALETTE: [BorderColor; 8] = [
    BorderColor::opaque(0x0a, 0x84, 0xff), // blue
    BorderColor::opaque(0xff, 0x45, 0x3a), // red
    BorderColor::opaque(0x30, 0xd1, 0x58), // green
    BorderColor::opaque(0xff, 0x9f, 0x0a), // orange
    BorderColor::opaque(0xbf, 0x5a, 0xf2), // purple
    BorderColor::opaque(0xff, 0xd6, 0x0a), // yellow
    BorderColor::opaque(0x64, 0xd2, 0xff), // cyan
    BorderColor::opaque(0xff, 0x37, 0x5f), // pink
];
