use anyhow::{anyhow, Result};
use plotters::prelude::*;
use replwatch_lib::image::RgbaImage;
use replwatch_lib::plot::{Figure, PlotBackend, Series};
use std::path::{Path, PathBuf};

/// Writes figures to PNG files through plotters' bitmap backend.
pub struct PngBackend {
    path: PathBuf,
    size: (u32, u32),
}

impl PngBackend {
    pub fn new(path: &Path, size: (u32, u32)) -> Self {
        Self {
            path: path.to_path_buf(),
            size,
        }
    }
}

fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let (x_min, x_max, y_min, y_max) = fig
            .bounds()
            .ok_or_else(|| anyhow!("figure has no finite points"))?;
        let (x_min, x_max) = widen(x_min, x_max);
        let (y_min, y_max) = widen(y_min, y_max);
        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Plot".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        chart.configure_mesh().draw()?;
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    chart.draw_series(LineSeries::new(
                        line.points.iter().map(|p| (p[0], p[1])),
                        &RGBColor(r, g, b),
                    ))?;
                }
                Series::Histogram(hist) => {
                    let (r, g, b) = hist.style.color.rgb();
                    let fill = RGBColor(r, g, b).mix(0.6).filled();
                    chart.draw_series(hist.edges.windows(2).zip(&hist.counts).map(
                        |(edge, &count)| Rectangle::new([(edge[0], 0.0), (edge[1], count)], fill),
                    ))?;
                }
            }
        }
        root.present()?;
        Ok(())
    }
}

pub fn draw_figure(path: &Path, size: (u32, u32), fig: &Figure) -> Result<()> {
    PngBackend::new(path, size).draw(fig)
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((channel as u32 * a + 255 * (255 - a)) / 255) as u8
}

/// Write an RGBA image, scaled up so small frames stay visible.
pub fn draw_image(path: &Path, image: &RgbaImage) -> Result<()> {
    if image.width == 0 || image.height == 0 {
        return Err(anyhow!("image is empty"));
    }
    let scale = (256 / image.width.max(image.height)).max(1) as i32;
    let size = (image.width as u32 * scale as u32, image.height as u32 * scale as u32);
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    for y in 0..image.height {
        for x in 0..image.width {
            let Some([r, g, b, a]) = image.pixel(x, y) else {
                continue;
            };
            let color = RGBColor(over_white(r, a), over_white(g, a), over_white(b, a));
            let (x0, y0) = (x as i32 * scale, y as i32 * scale);
            root.draw(&Rectangle::new([(x0, y0), (x0 + scale, y0 + scale)], color.filled()))?;
        }
    }
    root.present()?;
    Ok(())
}
