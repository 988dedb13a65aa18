use std::collections::BTreeSet;

use bytemuck::{Pod, Zeroable};

use super::BlendFunction;
use crate::scene::{Color, MeshId};

/// Meshes that receive an outline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<MeshId>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: MeshId) -> bool {
        self.0.insert(id)
    }

    pub fn remove(&mut self, id: MeshId) -> bool {
        self.0.remove(&id)
    }

    pub fn contains(&self, id: MeshId) -> bool {
        self.0.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = MeshId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<MeshId> for Selection {
    fn from_iter<I: IntoIterator<Item = MeshId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OutlineSettings {
    pub blend: BlendFunction,
    pub edge_strength: f32,
    /// Brightness follows `cos(t * pulse_speed * 10)`; `0` disables pulsing.
    pub pulse_speed: f32,
    pub visible_edge_color: Color,
    pub hidden_edge_color: Color,
    /// Draw the hidden edge color where the selection is occluded.
    pub x_ray: bool,
    /// Hull offset along vertex normals, in object units.
    pub thickness: f32,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            blend: BlendFunction::Screen,
            edge_strength: 1.0,
            pulse_speed: 0.0,
            visible_edge_color: Color::from_hex(0xffffff),
            hidden_edge_color: Color::from_hex(0x22090a),
            x_ray: true,
            thickness: 0.03,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct OutlineUniforms {
    pub visible: [f32; 4],
    pub hidden: [f32; 4],
    /// `thickness`, unused ×3.
    pub params: [f32; 4],
}

impl OutlineSettings {
    /// Brightness multiplier at `time` seconds, in `0.25..=1.0`.
    pub fn pulse(&self, time: f32) -> f32 {
        if self.pulse_speed > 0.0 {
            (time * self.pulse_speed * 10.0).cos() * 0.375 + 0.625
        } else {
            1.0
        }
    }

    pub fn uniforms(&self, time: f32) -> OutlineUniforms {
        let k = self.edge_strength.max(0.0) * self.pulse(time);
        OutlineUniforms {
            visible: self.visible_edge_color.scaled(k).with_alpha(1.0).to_array(),
            hidden: self.hidden_edge_color.scaled(k).with_alpha(1.0).to_array(),
            params: [self.thickness.max(0.0), 0.0, 0.0, 0.0],
        }
    }
}

/// Outline effect: settings plus the meshes it applies to.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    pub settings: OutlineSettings,
    pub selection: Selection,
}

impl Outline {
    pub fn new(settings: OutlineSettings) -> Self {
        Self {
            settings,
            selection: Selection::new(),
        }
    }

    pub fn with_selection(mut self, selection: impl IntoIterator<Item = MeshId>) -> Self {
        self.selection = selection.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── pulse ────────────────────────────────────────────────────────────

    #[test]
    fn zero_speed_does_not_pulse() {
        let s = OutlineSettings::default();
        assert_eq!(s.pulse(0.0), 1.0);
        assert_eq!(s.pulse(12.3), 1.0);
    }

    #[test]
    fn pulse_oscillates_between_quarter_and_full() {
        let s = OutlineSettings {
            pulse_speed: 0.5,
            ..Default::default()
        };
        assert!((s.pulse(0.0) - 1.0).abs() < 1e-6);
        // cos(pi) at t * 5 = pi
        assert!((s.pulse(std::f32::consts::PI / 5.0) - 0.25).abs() < 1e-5);
        for i in 0..100 {
            let p = s.pulse(i as f32 * 0.037);
            assert!((0.25..=1.0 + 1e-6).contains(&p));
        }
    }

    // ── uniforms ─────────────────────────────────────────────────────────

    #[test]
    fn uniforms_scale_colors_by_strength_and_pulse() {
        let s = OutlineSettings {
            edge_strength: 7.0,
            visible_edge_color: Color::from_hex(0x00ff00),
            hidden_edge_color: Color::from_hex(0x00ff00),
            ..Default::default()
        };
        let u = s.uniforms(0.0);
        assert_eq!(u.visible, [0.0, 7.0, 0.0, 1.0]);
        assert_eq!(u.hidden, u.visible);
        assert_eq!(u.params[0], 0.03);
    }

    #[test]
    fn uniform_block_is_std140_sized() {
        assert_eq!(std::mem::size_of::<OutlineUniforms>(), 48);
    }

    // ── selection ────────────────────────────────────────────────────────

    #[test]
    fn selection_deduplicates() {
        let mut sel = Selection::new();
        assert!(sel.add(MeshId(3)));
        assert!(!sel.add(MeshId(3)));
        assert!(sel.add(MeshId(1)));
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![MeshId(1), MeshId(3)]);
        assert!(sel.remove(MeshId(1)));
        assert_eq!(sel.len(), 1);
    }
}
