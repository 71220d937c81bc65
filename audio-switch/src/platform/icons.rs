//! Icon generation and loading utilities.
//!
//! Tray and menu glyphs are drawn as template-style RGBA (black with alpha),
//! so macOS can tint them for light and dark menu bars. A directory of PNG
//! files can override any of them.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Icon size in pixels.
pub const ICON_SIZE: u32 = 32;

/// Icon loading error types.
#[derive(Debug, Error)]
pub enum IconError {
    #[error("Failed to decode icon {name}: {source}")]
    Decode {
        name: &'static str,
        #[source]
        source: image::ImageError,
    },
}

/// Tray icon shown for the current input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrayIconKind {
    Headset,
    HeadsetMuted,
    Laptop,
    LaptopMuted,
}

impl TrayIconKind {
    pub fn select(is_muted: bool, is_headset: bool) -> Self {
        match (is_headset, is_muted) {
            (true, false) => TrayIconKind::Headset,
            (true, true) => TrayIconKind::HeadsetMuted,
            (false, false) => TrayIconKind::Laptop,
            (false, true) => TrayIconKind::LaptopMuted,
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            TrayIconKind::Headset => "headset",
            TrayIconKind::HeadsetMuted => "headset-muted",
            TrayIconKind::Laptop => "laptop",
            TrayIconKind::LaptopMuted => "laptop-muted",
        }
    }

    pub const ALL: [TrayIconKind; 4] = [
        TrayIconKind::Headset,
        TrayIconKind::HeadsetMuted,
        TrayIconKind::Laptop,
        TrayIconKind::LaptopMuted,
    ];
}

/// Glyphs on menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuIconKind {
    Mic,
    MicMuted,
    Switch,
}

impl MenuIconKind {
    pub fn file_stem(self) -> &'static str {
        match self {
            MenuIconKind::Mic => "mic",
            MenuIconKind::MicMuted => "mic-muted",
            MenuIconKind::Switch => "switch",
        }
    }

    pub const ALL: [MenuIconKind; 3] = [MenuIconKind::Mic, MenuIconKind::MicMuted, MenuIconKind::Switch];
}

/// Decoded RGBA icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// All icons the tray needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct IconSet {
    tray: HashMap<TrayIconKind, IconImage>,
    menu: HashMap<MenuIconKind, IconImage>,
}

impl IconSet {
    /// Generated glyphs, overridden by `<stem>.png` files in `dir` if given.
    pub fn load(dir: Option<&Path>) -> Result<Self, IconError> {
        let mut tray = HashMap::new();
        for kind in TrayIconKind::ALL {
            let image = match load_override(dir, kind.file_stem())? {
                Some(image) => image,
                None => generate_tray_icon(kind),
            };
            tray.insert(kind, image);
        }

        let mut menu = HashMap::new();
        for kind in MenuIconKind::ALL {
            let image = match load_override(dir, kind.file_stem())? {
                Some(image) => image,
                None => generate_menu_icon(kind),
            };
            menu.insert(kind, image);
        }

        Ok(Self { tray, menu })
    }

    pub fn tray(&self, kind: TrayIconKind) -> &IconImage {
        &self.tray[&kind]
    }

    pub fn menu(&self, kind: MenuIconKind) -> &IconImage {
        &self.menu[&kind]
    }
}

fn load_override(dir: Option<&Path>, name: &'static str) -> Result<Option<IconImage>, IconError> {
    let Some(dir) = dir else {
        return Ok(None);
    };
    let path = dir.join(format!("{name}.png"));
    if !path.exists() {
        return Ok(None);
    }

    let image = image::open(&path)
        .map_err(|source| IconError::Decode { name, source })?
        .into_rgba8();
    let (width, height) = image.dimensions();
    tracing::debug!(path = %path.display(), width, height, "Loaded icon override");

    Ok(Some(IconImage {
        rgba: image.into_raw(),
        width,
        height,
    }))
}

/// Blank canvas with an alpha-only painter.
struct Canvas {
    size: usize,
    rgba: Vec<u8>,
}

impl Canvas {
    fn new() -> Self {
        let size = ICON_SIZE as usize;
        Self {
            size,
            rgba: vec![0u8; size * size * 4],
        }
    }

    fn set(&mut self, x: usize, y: usize, alpha: u8) {
        if x < self.size && y < self.size {
            let idx = (y * self.size + x) * 4;
            self.rgba[idx + 3] = self.rgba[idx + 3].max(alpha);
        }
    }

    fn clear(&mut self, x: usize, y: usize) {
        if x < self.size && y < self.size {
            let idx = (y * self.size + x) * 4;
            self.rgba[idx + 3] = 0;
        }
    }

    fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize) {
        for y in y0..y1 {
            for x in x0..x1 {
                self.set(x, y, 255);
            }
        }
    }

    /// Ring between `inner` and `outer` radius, restricted to `y <= max_y`.
    fn arc(&mut self, cx: f32, cy: f32, inner: f32, outer: f32, max_y: f32) {
        for y in 0..self.size {
            for x in 0..self.size {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist >= inner && dist <= outer && (y as f32) <= max_y {
                    self.set(x, y, 255);
                }
            }
        }
    }

    fn disc(&mut self, cx: f32, cy: f32, radius: f32) {
        self.arc(cx, cy, 0.0, radius, self.size as f32);
    }

    /// Diagonal strike-through with a cleared gap so it reads on top of the glyph.
    fn strike(&mut self) {
        let size = self.size;
        for i in 3..(size - 3) {
            for t in 0..4 {
                self.clear(i + t, i);
            }
        }
        for i in 3..(size - 3) {
            for t in 0..2 {
                self.set(i, i + t, 255);
            }
        }
    }

    fn finish(self) -> IconImage {
        IconImage {
            rgba: self.rgba,
            width: ICON_SIZE,
            height: ICON_SIZE,
        }
    }
}

fn draw_headset(canvas: &mut Canvas) {
    let size = canvas.size as f32;
    // Headband
    canvas.arc(size / 2.0, size / 2.0 + 2.0, size / 2.0 - 6.0, size / 2.0 - 3.0, size / 2.0 + 2.0);
    // Ear cups
    canvas.fill_rect(3, 17, 10, 27);
    canvas.fill_rect(22, 17, 29, 27);
}

fn draw_laptop(canvas: &mut Canvas) {
    // Screen outline
    canvas.fill_rect(6, 7, 26, 9);
    canvas.fill_rect(6, 7, 8, 22);
    canvas.fill_rect(24, 7, 26, 22);
    canvas.fill_rect(6, 20, 26, 22);
    // Base
    canvas.fill_rect(2, 23, 30, 26);
}

fn draw_microphone(canvas: &mut Canvas) {
    let center = canvas.size as f32 / 2.0;
    // Capsule
    canvas.disc(center, 9.0, 5.0);
    canvas.fill_rect(11, 9, 21, 16);
    canvas.disc(center, 16.0, 5.0);
    // Holder, stand and base
    canvas.arc(center, 16.0, 8.0, 10.0, 32.0);
    canvas.fill_rect(15, 25, 17, 29);
    canvas.fill_rect(10, 28, 22, 30);
}

fn draw_switch(canvas: &mut Canvas) {
    // Upper arrow pointing right
    canvas.fill_rect(5, 9, 24, 12);
    for i in 0..6 {
        canvas.fill_rect(22 + i, 4 + i, 23 + i, 17 - i);
    }
    // Lower arrow pointing left
    canvas.fill_rect(8, 20, 27, 23);
    for i in 0..6 {
        canvas.fill_rect(9 - i, 15 + i, 10 - i, 28 - i);
    }
}

/// Generate a tray glyph.
pub fn generate_tray_icon(kind: TrayIconKind) -> IconImage {
    let mut canvas = Canvas::new();
    match kind {
        TrayIconKind::Headset | TrayIconKind::HeadsetMuted => draw_headset(&mut canvas),
        TrayIconKind::Laptop | TrayIconKind::LaptopMuted => draw_laptop(&mut canvas),
    }
    if matches!(kind, TrayIconKind::HeadsetMuted | TrayIconKind::LaptopMuted) {
        canvas.strike();
    }
    canvas.finish()
}

/// Generate a menu glyph.
pub fn generate_menu_icon(kind: MenuIconKind) -> IconImage {
    let mut canvas = Canvas::new();
    match kind {
        MenuIconKind::Mic => draw_microphone(&mut canvas),
        MenuIconKind::MicMuted => {
            draw_microphone(&mut canvas);
            canvas.strike();
        }
        MenuIconKind::Switch => draw_switch(&mut canvas),
    }
    canvas.finish()
}
