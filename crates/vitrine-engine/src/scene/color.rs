/// Linear RGBA color (straight alpha).
///
/// Constructors taking hex or byte values interpret them as sRGB and convert
/// to linear, so `Color::from_hex(0xff0000)` matches a CSS `red`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::linear(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::linear(0.0, 0.0, 0.0);

    /// Opaque color from linear components.
    #[inline]
    pub const fn linear(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Opaque color from sRGB bytes.
    #[inline]
    pub fn from_srgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self::linear(
            srgb_to_linear(r as f32 / 255.0),
            srgb_to_linear(g as f32 / 255.0),
            srgb_to_linear(b as f32 / 255.0),
        )
    }

    /// Opaque color from a `0xRRGGBB` sRGB literal.
    #[inline]
    pub fn from_hex(hex: u32) -> Self {
        Self::from_srgb_u8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// CSS color keywords used by the demos.
    pub fn named(name: &str) -> Option<Self> {
        let hex = match name {
            "white" => 0xffffff,
            "black" => 0x000000,
            "red" => 0xff0000,
            "orange" => 0xffa500,
            "yellow" => 0xffff00,
            "green" => 0x008000,
            "blue" => 0x0000ff,
            "purple" => 0x800080,
            "gray" => 0x808080,
            _ => return None,
        };
        Some(Self::from_hex(hex))
    }

    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Multiplies rgb by `k`, leaving alpha untouched.
    #[inline]
    pub fn scaled(self, k: f32) -> Self {
        Self {
            r: self.r * k,
            g: self.g * k,
            b: self.b * k,
            a: self.a,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub(crate) fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
