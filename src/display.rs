use crate::error::{Error, Result};
use std::str::FromStr;

/// logical CHIP-8 resolution
pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// how many surface cells one CHIP-8 pixel covers, each way
pub const DEFAULT_SCALE: usize = 8;

/// #26cdff
pub const DEFAULT_FOREGROUND: Rgb = Rgb(0x26, 0xcd, 0xff);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl FromStr for Rgb {
    type Err = Error;

    /// parses `#rrggbb`
    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| Error::Config(format!("colour must look like #rrggbb, got {:?}", s)))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::Config(format!("bad hex digits in colour {:?}", s)))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// something that can have scaled pixels painted onto it
pub trait Surface {
    /// paint a `side` by `side` square with its top-left corner at x, y
    fn fill_square(&mut self, x: usize, y: usize, side: usize, colour: Rgb);

    /// same square, back to background
    fn clear_square(&mut self, x: usize, y: usize, side: usize);
}

/// logical width, logical height, scale
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution(pub usize, pub usize, pub usize);

impl Default for Resolution {
    fn default() -> Self {
        Resolution(DISPLAY_WIDTH, DISPLAY_HEIGHT, DEFAULT_SCALE)
    }
}

impl Resolution {
    /// how long a pixel buffer must be
    pub fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    pub fn surface_width(&self) -> usize {
        self.0 * self.2
    }

    pub fn surface_height(&self) -> usize {
        self.1 * self.2
    }

    /// canvas bounds for presenting one point per logical pixel
    pub fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }
}

/// turns the VM's flat pixel buffer into squares on a surface. holds no
/// frame state; every call redraws everything
pub struct FrameRenderer {
    resolution: Resolution,
    foreground: Rgb,
}

impl FrameRenderer {
    pub fn new(resolution: Resolution, foreground: Rgb) -> Self {
        FrameRenderer {
            resolution,
            foreground,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn render(&self, pixels: &[u8], surface: &mut impl Surface) -> Result<()> {
        if pixels.len() != self.resolution.pixel_count() {
            return Err(Error::MalformedBuffer {
                expected: self.resolution.pixel_count(),
                actual: pixels.len(),
            });
        }

        let Resolution(w, _, scale) = self.resolution;
        for (index, pixel) in pixels.iter().enumerate() {
            let (row, column) = (index / w, index % w);
            match *pixel {
                0 => surface.clear_square(column * scale, row * scale, scale),
                _ => surface.fill_square(column * scale, row * scale, scale, self.foreground),
            }
        }
        Ok(())
    }
}

/// in-memory surface; `None` is background
pub struct Raster {
    resolution: Resolution,
    cells: Vec<Option<Rgb>>,
}

impl Raster {
    pub fn new(resolution: Resolution) -> Self {
        Raster {
            resolution,
            cells: vec![None; resolution.surface_width() * resolution.surface_height()],
        }
    }

    pub fn width(&self) -> usize {
        self.resolution.surface_width()
    }

    pub fn height(&self) -> usize {
        self.resolution.surface_height()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width() {
            return None;
        }
        self.cells.get(y * self.width() + x).copied().flatten()
    }

    /// one sample per logical pixel, taken at the top-left of its square,
    /// as canvas coordinates (y grows downward as negative)
    pub fn lit_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let Resolution(w, h, scale) = self.resolution;
        (0..w * h).filter_map(move |index| {
            let (row, column) = (index / w, index % w);
            self.get(column * scale, row * scale)
                .map(|_| (column as f64, -1.0 * row as f64))
        })
    }

    fn paint(&mut self, x: usize, y: usize, side: usize, value: Option<Rgb>) {
        let width = self.width();
        if x >= width {
            return;
        }
        let x_end = (x + side).min(width);
        let y_end = (y + side).min(self.height());
        for yy in y..y_end {
            self.cells[yy * width + x..yy * width + x_end].fill(value);
        }
    }
}

impl Surface for Raster {
    fn fill_square(&mut self, x: usize, y: usize, side: usize, colour: Rgb) {
        self.paint(x, y, side, Some(colour));
    }

    fn clear_square(&mut self, x: usize, y: usize, side: usize) {
        self.paint(x, y, side, None);
    }
}

/// remembers which squares were painted; useful for testing the renderer
#[derive(Default)]
pub struct CountingSurface {
    pub filled: Vec<(usize, usize, usize)>,
    pub cleared: Vec<(usize, usize, usize)>,
}

impl Surface for CountingSurface {
    fn fill_square(&mut self, x: usize, y: usize, side: usize, _colour: Rgb) {
        self.filled.push((x, y, side));
    }

    fn clear_square(&mut self, x: usize, y: usize, side: usize) {
        self.cleared.push((x, y, side));
    }
}
