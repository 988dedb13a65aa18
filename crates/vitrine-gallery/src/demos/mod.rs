//! Gallery demos. Each demo produces the cards (windows) it opens.

mod animations;
mod material;
mod multiple;
mod post_process;

use anyhow::Result;
use clap::ValueEnum;
use vitrine_engine::controls::OrbitControls;
use vitrine_engine::mount::{MountMode, MountParts};
use vitrine_engine::render::WgpuBackend;
use vitrine_engine::window::WindowConfig;
use winit::dpi::{LogicalPosition, LogicalSize};

pub type CardParts = MountParts<WgpuBackend, OrbitControls>;
pub type CardBuilder = Box<dyn FnMut() -> Result<CardParts>>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum Demo {
    /// A grid of cards, each showing a random primitive.
    Multiple,
    /// Continuously spinning meshes.
    Animations,
    /// Outlined selection plus a center-circle overlay.
    PostProcess,
    /// A checker floor with and without anisotropic filtering, side by side.
    Material,
}

/// One window and the view mounted into it.
pub struct CardSpec {
    pub window: WindowConfig,
    pub mode: MountMode,
    pub build: CardBuilder,
}

pub fn cards(demo: Demo, count: usize, seed: Option<u64>) -> Vec<CardSpec> {
    match demo {
        Demo::Multiple => multiple::cards(count, seed),
        Demo::Animations => vec![animations::card()],
        Demo::PostProcess => vec![post_process::card()],
        Demo::Material => vec![material::card()],
    }
}

const CARD_SIZE: f64 = 220.0;
const CARD_GAP: f64 = 24.0;
const CARDS_PER_ROW: usize = 6;

/// Window settings for the `index`-th card of a grid.
fn grid_window(title: String, index: usize) -> WindowConfig {
    let col = (index % CARDS_PER_ROW) as f64;
    let row = (index / CARDS_PER_ROW) as f64;
    WindowConfig {
        title,
        initial_size: LogicalSize::new(CARD_SIZE, CARD_SIZE),
        position: Some(LogicalPosition::new(
            CARD_GAP + col * (CARD_SIZE + CARD_GAP),
            CARD_GAP + row * (CARD_SIZE + CARD_GAP * 2.0),
        )),
        resizable: true,
    }
}
