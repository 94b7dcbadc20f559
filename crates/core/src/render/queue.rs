//! Layered draw-command queue.
//!
//! Commands are keyed by `(x, y, layer)`; a second command at the same key
//! replaces the first. The queue is cleared at the start of every frame and
//! drained back-to-front onto a [`DrawSurface`].

use crate::render::surface::DrawSurface;
use bitflags::bitflags;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Opaque palette index. The display adapter decides what each value means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorId(pub u8);

impl ColorId {
    pub const BLACK: ColorId = ColorId(0);
    pub const RED: ColorId = ColorId(1);
    pub const GREEN: ColorId = ColorId(2);
    pub const YELLOW: ColorId = ColorId(3);
    pub const BLUE: ColorId = ColorId(4);
    pub const MAGENTA: ColorId = ColorId(5);
    pub const CYAN: ColorId = ColorId(6);
    pub const WHITE: ColorId = ColorId(7);
}

impl Default for ColorId {
    fn default() -> Self {
        ColorId::WHITE
    }
}

bitflags! {
    /// Text styling passed through to the display adapter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextAttributes: u8 {
        const BOLD = 1;
        const DIM = 1 << 1;
        const UNDERLINE = 1 << 2;
        const REVERSE = 1 << 3;
    }
}

/// Draw order, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayer {
    Background,
    Clouds,
    Precipitation,
    Effects,
    Creatures,
    UiBackground,
    UiForeground,
    Debug,
}

impl RenderLayer {
    pub const ALL: [RenderLayer; 8] = [
        RenderLayer::Background,
        RenderLayer::Clouds,
        RenderLayer::Precipitation,
        RenderLayer::Effects,
        RenderLayer::Creatures,
        RenderLayer::UiBackground,
        RenderLayer::UiForeground,
        RenderLayer::Debug,
    ];

    /// Ordering value; gaps leave room for layers in between.
    pub fn value(self) -> u8 {
        match self {
            RenderLayer::Background => 0,
            RenderLayer::Clouds => 10,
            RenderLayer::Precipitation => 20,
            RenderLayer::Effects => 30,
            RenderLayer::Creatures => 40,
            RenderLayer::UiBackground => 50,
            RenderLayer::UiForeground => 60,
            RenderLayer::Debug => 100,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderLayer::Background => "background",
            RenderLayer::Clouds => "clouds",
            RenderLayer::Precipitation => "precipitation",
            RenderLayer::Effects => "effects",
            RenderLayer::Creatures => "creatures",
            RenderLayer::UiBackground => "ui_background",
            RenderLayer::UiForeground => "ui_foreground",
            RenderLayer::Debug => "debug",
        }
    }
}

/// One cell to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCommand {
    pub x: i32,
    pub y: i32,
    pub layer: RenderLayer,
    pub glyph: char,
    pub color: ColorId,
    pub attrs: TextAttributes,
}

impl RenderCommand {
    pub fn new(x: i32, y: i32, glyph: char, color: ColorId, layer: RenderLayer) -> Self {
        Self {
            x,
            y,
            layer,
            glyph,
            color,
            attrs: TextAttributes::empty(),
        }
    }

    pub fn with_attrs(mut self, attrs: TextAttributes) -> Self {
        self.attrs = attrs;
        self
    }
}

/// Per-frame map of draw commands.
#[derive(Debug, Default, Clone)]
pub struct RenderQueue {
    commands: FxHashMap<(i32, i32, RenderLayer), RenderCommand>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command, replacing any earlier one at the same `(x, y, layer)`.
    pub fn push(&mut self, command: RenderCommand) {
        self.commands
            .insert((command.x, command.y, command.layer), command);
    }

    pub fn add(&mut self, x: i32, y: i32, glyph: char, color: ColorId, layer: RenderLayer) {
        self.push(RenderCommand::new(x, y, glyph, color, layer));
    }

    /// Queue one command per character, left to right from `(x, y)`.
    pub fn add_text(&mut self, x: i32, y: i32, text: &str, color: ColorId, layer: RenderLayer) {
        for (offset, glyph) in (0_i32..).zip(text.chars()) {
            self.add(x + offset, y, glyph, color, layer);
        }
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get(&self, x: i32, y: i32, layer: RenderLayer) -> Option<&RenderCommand> {
        self.commands.get(&(x, y, layer))
    }

    /// Number of commands on each layer.
    pub fn layer_counts(&self) -> FxHashMap<RenderLayer, usize> {
        let mut counts = FxHashMap::default();
        for layer in self.commands.keys().map(|k| k.2) {
            *counts.entry(layer).or_insert(0) += 1;
        }
        counts
    }

    /// All commands, back to front; ties broken by row then column.
    pub fn get_sorted(&self) -> Vec<RenderCommand> {
        let mut sorted: Vec<RenderCommand> = self.commands.values().copied().collect();
        sorted.sort_unstable_by_key(|c| (c.layer, c.y, c.x));
        sorted
    }

    /// Draw every command onto `surface`, back to front.
    ///
    /// Commands outside the surface, or refused by it, are skipped. Returns
    /// how many were drawn.
    pub fn execute<S: DrawSurface + ?Sized>(&self, surface: &mut S) -> usize {
        let (width, height) = surface.size();
        let mut drawn = 0;
        for cmd in self.get_sorted() {
            let (Ok(x), Ok(y)) = (u16::try_from(cmd.x), u16::try_from(cmd.y)) else {
                trace!("Skipping off-canvas draw at ({}, {})", cmd.x, cmd.y);
                continue;
            };
            if x >= width || y >= height {
                trace!("Skipping off-canvas draw at ({}, {})", cmd.x, cmd.y);
                continue;
            }
            if surface.put(x, y, cmd.glyph, cmd.color, cmd.attrs) {
                drawn += 1;
            } else {
                trace!("Surface rejected draw at ({}, {})", x, y);
            }
        }
        drawn
    }
}
