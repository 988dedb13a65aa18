use std::cell::OnceCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{ensure, Result};
use glam::Vec2;

use crate::render::GpuTexture;

/// Stable identity for a texture, used as a GPU cache key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// sRGB RGBA8 image with a full mip chain built on the CPU.
///
/// Like `Geometry`, the GPU copy is created on first draw and released with
/// the texture.
pub struct Texture {
    id: TextureId,
    label: &'static str,
    width: u32,
    height: u32,
    /// Level 0 first, each level half the size of the previous one.
    levels: Vec<Vec<u8>>,
    pub(crate) gpu: OnceCell<GpuTexture>,
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("size", &(self.width, self.height))
            .field("mip_levels", &self.levels.len())
            .field("uploaded", &self.gpu.get().is_some())
            .finish()
    }
}

impl Texture {
    /// Wraps tightly packed RGBA8 pixels and derives the mip chain.
    pub fn from_rgba8(label: &'static str, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        ensure!(width > 0 && height > 0, "texture {label:?} has zero size");
        let expected = width as usize * height as usize * 4;
        ensure!(
            pixels.len() == expected,
            "texture {label:?} is {width}x{height} but has {} bytes (expected {expected})",
            pixels.len()
        );

        let mut levels = vec![pixels];
        let (mut w, mut h) = (width, height);
        while w > 1 || h > 1 {
            let Some(last) = levels.last() else { break };
            let next = downsample(last, w, h);
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            levels.push(next);
        }

        Ok(Self {
            id: TextureId::next(),
            label,
            width,
            height,
            levels,
            gpu: OnceCell::new(),
        })
    }

    /// Square checkerboard of `size` texels split into `cells` per side.
    pub fn checker(size: u32, cells: u32, dark: [u8; 4], light: [u8; 4]) -> Result<Self> {
        ensure!(cells > 0 && size >= cells, "checker needs at least one texel per cell");
        let cell = size / cells;
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let texel = if (x / cell + y / cell) % 2 == 0 { dark } else { light };
                pixels.extend_from_slice(&texel);
            }
        }
        Self::from_rgba8("checker", size, size, pixels)
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn level(&self, mip: u32) -> Option<&[u8]> {
        self.levels.get(mip as usize).map(Vec::as_slice)
    }

    /// Every level back to back, level 0 first.
    pub(crate) fn mip_chain(&self) -> Vec<u8> {
        self.levels.concat()
    }
}

/// 2x2 box filter; odd edges reuse the last row or column.
fn downsample(src: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (w, h) = ((width / 2).max(1), (height / 2).max(1));
    let texel = |x: u32, y: u32, c: usize| {
        let (x, y) = (x.min(width - 1), y.min(height - 1));
        src[(y * width + x) as usize * 4 + c] as u32
    };

    let mut out = Vec::with_capacity(w as usize * h as usize * 4);
    for y in 0..h {
        for x in 0..w {
            let (sx, sy) = (x * 2, y * 2);
            for c in 0..4 {
                let sum = texel(sx, sy, c) + texel(sx + 1, sy, c) + texel(sx, sy + 1, c) + texel(sx + 1, sy + 1, c);
                out.push(((sum + 2) / 4) as u8);
            }
        }
    }
    out
}

/// A repeating texture applied to a material, with its sampler settings.
#[derive(Debug, Clone)]
pub struct TextureMap {
    pub texture: Rc<Texture>,
    /// Tiles per geometry UV unit on each axis.
    pub repeat: Vec2,
    /// Maximum anisotropic filtering samples, `1..=16`.
    pub anisotropy: u16,
}

impl TextureMap {
    pub fn new(texture: Rc<Texture>) -> Self {
        Self {
            texture,
            repeat: Vec2::ONE,
            anisotropy: 1,
        }
    }

    pub fn repeat(mut self, u: f32, v: f32) -> Self {
        self.repeat = Vec2::new(u, v);
        self
    }

    pub fn anisotropy(mut self, samples: u16) -> Self {
        self.anisotropy = samples;
        self
    }

    /// Anisotropy as the sampler accepts it.
    pub fn anisotropy_clamp(&self) -> u16 {
        self.anisotropy.clamp(1, 16)
    }
}

impl PartialEq for TextureMap {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.texture, &other.texture) && self.repeat == other.repeat && self.anisotropy == other.anisotropy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARK: [u8; 4] = [0, 0, 0, 255];
    const LIGHT: [u8; 4] = [255, 255, 255, 255];

    fn texel(t: &Texture, mip: u32, x: u32, y: u32) -> [u8; 4] {
        let w = (t.size().0 >> mip).max(1);
        let at = (y * w + x) as usize * 4;
        let level = t.level(mip).unwrap();
        [level[at], level[at + 1], level[at + 2], level[at + 3]]
    }

    #[test]
    fn checker_alternates_cells() {
        let t = Texture::checker(8, 4, DARK, LIGHT).unwrap();
        assert_eq!(texel(&t, 0, 0, 0), DARK);
        assert_eq!(texel(&t, 0, 1, 1), DARK);
        assert_eq!(texel(&t, 0, 2, 0), LIGHT);
        assert_eq!(texel(&t, 0, 0, 2), LIGHT);
        assert_eq!(texel(&t, 0, 2, 2), DARK);
    }

    #[test]
    fn mip_chain_halves_down_to_one_texel() {
        let t = Texture::checker(8, 4, DARK, LIGHT).unwrap();
        assert_eq!(t.mip_level_count(), 4);
        let sizes: Vec<usize> = (0..4).map(|m| t.level(m).unwrap().len()).collect();
        assert_eq!(sizes, [256, 64, 16, 4]);
        assert_eq!(t.mip_chain().len(), 340);
    }

    #[test]
    fn mips_below_the_cell_size_average_to_gray() {
        let t = Texture::checker(8, 4, DARK, LIGHT).unwrap();
        // 2x2 cells fold into one texel at level 1
        assert_eq!(texel(&t, 1, 0, 0), DARK);
        assert_eq!(texel(&t, 2, 0, 0), [128, 128, 128, 255]);
    }

    #[test]
    fn non_square_chain_keeps_one_texel_rows() {
        let t = Texture::from_rgba8("strip", 4, 1, vec![255; 16]).unwrap();
        assert_eq!(t.mip_level_count(), 3);
        assert_eq!(t.level(2).unwrap(), &[255, 255, 255, 255]);
    }

    #[test]
    fn pixel_count_must_match_size() {
        let err = Texture::from_rgba8("short", 2, 2, vec![0; 12]).unwrap_err();
        assert!(err.to_string().contains("expected 16"));
        assert!(Texture::checker(2, 4, DARK, LIGHT).is_err());
    }

    #[test]
    fn anisotropy_is_clamped_for_the_sampler() {
        let texture = Rc::new(Texture::checker(4, 2, DARK, LIGHT).unwrap());
        assert_eq!(TextureMap::new(texture.clone()).anisotropy(0).anisotropy_clamp(), 1);
        assert_eq!(TextureMap::new(texture.clone()).anisotropy(64).anisotropy_clamp(), 16);
        assert_eq!(TextureMap::new(texture).anisotropy(16).anisotropy_clamp(), 16);
    }
}
