use crate::error::{BindError, BindResult};
use crate::value::NdArray;
use serde::Serialize;

/// Display-ready pixels, row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    #[serde(skip)]
    pub pixels: Vec<[u8; 4]>,
}

impl RgbaImage {
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    pub fn flip(&mut self, flip: Flip) {
        if matches!(flip, Flip::Ud | Flip::UdLr) {
            let rows: Vec<Vec<[u8; 4]>> = self
                .pixels
                .chunks(self.width.max(1))
                .rev()
                .map(<[[u8; 4]]>::to_vec)
                .collect();
            self.pixels = rows.into_iter().flatten().collect();
        }
        if matches!(flip, Flip::Lr | Flip::UdLr) {
            for row in self.pixels.chunks_mut(self.width.max(1)) {
                row.reverse();
            }
        }
    }

    /// Paint the visible (alpha > 0) pixels of an H x W x 4 overlay on top.
    pub fn superimpose(&mut self, overlay: &NdArray) -> BindResult<()> {
        if overlay.rank() != 3 || overlay.last_dim() != 4 {
            return Err(BindError::shape(
                "Superimposed image needs transparency so it needs to be an RGBA (4 values in its 3rd dimension) matrix",
            ));
        }
        if overlay.shape[0] != self.height || overlay.shape[1] != self.width {
            return Err(BindError::shape(
                "Superimposed image should have the same x, y dimensions as base image",
            ));
        }
        for (pixel, rgba) in self.pixels.iter_mut().zip(overlay.data.chunks(4)) {
            if rgba[3] > 0.0 {
                pixel[0] = to_byte(rgba[0]);
                pixel[1] = to_byte(rgba[1]);
                pixel[2] = to_byte(rgba[2]);
            }
        }
        Ok(())
    }
}

fn to_byte(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flip {
    #[default]
    None,
    Ud,
    Lr,
    UdLr,
}

impl Flip {
    /// Parse an optional flip name; absent means no flip.
    pub fn named(name: Option<&str>) -> BindResult<Self> {
        name.map_or(Ok(Flip::None), str::parse)
    }
}

impl std::str::FromStr for Flip {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Flip::None),
            "ud" => Ok(Flip::Ud),
            "lr" => Ok(Flip::Lr),
            "udlr" => Ok(Flip::UdLr),
            other => Err(BindError::Config(format!(
                "flip must be one of ud, lr, udlr (got {other:?})"
            ))),
        }
    }
}

/// 256-entry colour lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut(Vec<[u8; 4]>);

const GRAY: &[(f64, u32)] = &[(0.0, 0x000000), (1.0, 0xFFFFFF)];
const HOT: &[(f64, u32)] = &[
    (0.0, 0x0B0000),
    (0.375, 0xFF0000),
    (0.75, 0xFFFF00),
    (1.0, 0xFFFFFF),
];
const VIRIDIS: &[(f64, u32)] = &[
    (0.0, 0x440154),
    (0.25, 0x3B528B),
    (0.5, 0x21918C),
    (0.75, 0x5EC962),
    (1.0, 0xFDE725),
];
const JET: &[(f64, u32)] = &[
    (0.0, 0x00007F),
    (0.11, 0x0000FF),
    (0.36, 0x00FFFF),
    (0.62, 0xFFFF00),
    (0.89, 0xFF0000),
    (1.0, 0x7F0000),
];

impl Lut {
    pub fn gray() -> Self {
        Self::from_anchors(GRAY)
    }

    pub fn named(name: &str) -> BindResult<Self> {
        let anchors = match name {
            "gray" | "grey" => GRAY,
            "hot" => HOT,
            "viridis" => VIRIDIS,
            "jet" => JET,
            other => return Err(BindError::Config(format!("unknown colormap {other:?}"))),
        };
        Ok(Self::from_anchors(anchors))
    }

    fn from_anchors(anchors: &[(f64, u32)]) -> Self {
        let table = (0..256)
            .map(|i| {
                let t = i as f64 / 255.0;
                let upper = anchors
                    .iter()
                    .position(|(pos, _)| *pos >= t)
                    .unwrap_or(anchors.len() - 1)
                    .max(1);
                let (p0, c0) = anchors[upper - 1];
                let (p1, c1) = anchors[upper];
                let f = if p1 > p0 { ((t - p0) / (p1 - p0)).clamp(0.0, 1.0) } else { 0.0 };
                let mix = |shift: u32| {
                    let a = ((c0 >> shift) & 0xFF) as f64;
                    let b = ((c1 >> shift) & 0xFF) as f64;
                    to_byte(a + (b - a) * f)
                };
                [mix(16), mix(8), mix(0), 255]
            })
            .collect();
        Self(table)
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.0.iter_mut().for_each(|entry| entry[3] = opacity);
        self
    }

    pub fn get(&self, index: usize) -> [u8; 4] {
        self.0[index.min(255)]
    }
}

/// How scalar frames are mapped to pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStyle {
    pub levels: Option<[f64; 2]>,
    pub lut: Lut,
    pub flip: Flip,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            levels: None,
            lut: Lut::gray(),
            flip: Flip::None,
        }
    }
}

impl ImageStyle {
    pub fn new(
        levels: Option<[f64; 2]>,
        colormap: Option<&str>,
        opacity: Option<u8>,
        flip: Flip,
    ) -> BindResult<Self> {
        if let Some([lo, hi]) = levels {
            if !(hi > lo) {
                return Err(BindError::Config(format!(
                    "image levels must be increasing, got [{lo}, {hi}]"
                )));
            }
        }
        let lut = match colormap {
            Some(name) => Lut::named(name)?,
            None => Lut::gray(),
        };
        Ok(Self {
            levels,
            lut: lut.with_opacity(opacity.unwrap_or(255)),
            flip,
        })
    }

    /// Render an H x W (scalar) or H x W x 3|4 (colour) frame. The lookup
    /// table only applies to scalar frames. The overlay is painted before
    /// flipping so it stays registered with the base frame.
    pub fn render(&self, frame: &NdArray, overlay: Option<&NdArray>) -> BindResult<RgbaImage> {
        let (height, width) = match frame.shape.as_slice() {
            [h, w] | [h, w, 3] | [h, w, 4] => (*h, *w),
            other => {
                return Err(BindError::shape(format!(
                    "Image needs shape H x W or H x W x 3|4, got {other:?}"
                )))
            }
        };
        let [lo, hi] = self
            .levels
            .or_else(|| frame.min_max().map(|(lo, hi)| [lo, hi]))
            .unwrap_or([0.0, 255.0]);
        let span = if hi > lo { hi - lo } else { 1.0 };
        let scale = |v: f64| ((v - lo) / span * 255.0).clamp(0.0, 255.0);
        let pixels = if frame.rank() == 2 {
            frame
                .data
                .iter()
                .map(|&v| self.lut.get(scale(v) as usize))
                .collect()
        } else {
            frame
                .data
                .chunks(frame.last_dim())
                .map(|c| {
                    let alpha = c.get(3).map(|&a| to_byte(a)).unwrap_or(255);
                    [to_byte(scale(c[0])), to_byte(scale(c[1])), to_byte(scale(c[2])), alpha]
                })
                .collect()
        };
        let mut image = RgbaImage {
            width,
            height,
            pixels,
        };
        if let Some(overlay) = overlay {
            image.superimpose(overlay)?;
        }
        image.flip(self.flip);
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> NdArray {
        NdArray::new(vec![2, 2], vec![0.0, 85.0, 170.0, 255.0]).unwrap()
    }

    #[test]
    fn scalar_frames_use_levels() {
        let style = ImageStyle::new(Some([0.0, 255.0]), None, None, Flip::None).unwrap();
        let image = style.render(&gradient(), None).unwrap();
        assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(image.pixel(1, 1), Some([255, 255, 255, 255]));
    }

    #[test]
    fn flips_mirror_rows_and_columns() {
        let style = ImageStyle::new(Some([0.0, 255.0]), None, None, Flip::UdLr).unwrap();
        let image = style.render(&gradient(), None).unwrap();
        assert_eq!(image.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn opacity_sets_alpha() {
        let style = ImageStyle::new(None, Some("hot"), Some(128), Flip::None).unwrap();
        let image = style.render(&gradient(), None).unwrap();
        assert!(image.pixels.iter().all(|p| p[3] == 128));
    }

    #[test]
    fn unknown_names_are_config_errors() {
        assert!(matches!(Lut::named("rainbowz"), Err(BindError::Config(_))));
        assert!("sideways".parse::<Flip>().is_err());
        assert_eq!("udlr".parse::<Flip>().unwrap(), Flip::UdLr);
    }

    #[test]
    fn overlay_replaces_visible_pixels() {
        let style = ImageStyle::new(Some([0.0, 255.0]), None, None, Flip::None).unwrap();
        let mut data = vec![0.0; 16];
        data[0..4].copy_from_slice(&[255.0, 0.0, 0.0, 255.0]);
        let overlay = NdArray::new(vec![2, 2, 4], data).unwrap();
        let image = style.render(&gradient(), Some(&overlay)).unwrap();
        assert_eq!(image.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(1, 0), Some([85, 85, 85, 255]));

        let flipped = ImageStyle { flip: Flip::Lr, ..style };
        let image = flipped.render(&gradient(), Some(&overlay)).unwrap();
        assert_eq!(image.pixel(1, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn overlay_shape_must_match() {
        let style = ImageStyle::default();
        let mut image = style.render(&gradient(), None).unwrap();
        let overlay = NdArray::new(vec![1, 1, 4], vec![0.0; 4]).unwrap();
        assert!(matches!(
            image.superimpose(&overlay),
            Err(BindError::ShapeMismatch { .. })
        ));
    }
}
