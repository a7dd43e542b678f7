use crate::axis::{AxisMode, AxisPlan};
use crate::value::NdArray;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Bars between consecutive edges; `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramSeries {
    pub name: String,
    pub edges: Vec<f64>,
    pub counts: Vec<f64>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Histogram(HistogramSeries),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// Data bounds over every series as `(x_min, x_max, y_min, y_max)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for series in &self.series {
            match series {
                Series::Line(line) => {
                    xs.extend(line.points.iter().map(|p| p[0]));
                    ys.extend(line.points.iter().map(|p| p[1]));
                }
                Series::Histogram(hist) => {
                    xs.extend(hist.edges.iter().copied());
                    ys.push(0.0);
                    ys.extend(hist.counts.iter().copied());
                }
            }
        }
        let (x_min, x_max) = finite_extent(&xs)?;
        let (y_min, y_max) = finite_extent(&ys)?;
        Some((x_min, x_max, y_min, y_max))
    }
}

fn finite_extent(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied().filter(|v| v.is_finite());
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        let sample = points[start];
        result.push(sample);
    }
    result
}

const LINE_COLORS: [u32; 6] = [0x1F77B4, 0xFF7F0E, 0x2CA02C, 0xD62728, 0x9467BD, 0x8C564B];
const HISTOGRAM_COLOR: u32 = 0x0000FF;

fn line_style(row: usize) -> Style {
    Style {
        width: 1.4,
        dash: None,
        color: Color(LINE_COLORS[row % LINE_COLORS.len()]),
    }
}

/// Plot `data` against a reconciled axis. Rank-2 data yields one series per
/// row so rows are never joined into a single line.
pub fn figure_from_plan(title: &str, plan: &AxisPlan, data: &NdArray, max_points: usize) -> Figure {
    let mut fig = Figure::new(Some(title.to_string()));
    let multi = data.rank() > 1;
    for (row, values) in data.rows().enumerate() {
        let name = if multi {
            format!("{title}[{row}]")
        } else {
            title.to_string()
        };
        let series = match plan.mode {
            AxisMode::Direct => {
                let points: Vec<[f64; 2]> = plan
                    .x
                    .iter()
                    .zip(values)
                    .map(|(&x, &y)| [x, y])
                    .collect();
                Series::Line(LineSeries {
                    name,
                    points: decimate_points(&points, max_points),
                    style: line_style(row),
                })
            }
            AxisMode::Histogram => Series::Histogram(HistogramSeries {
                name,
                edges: plan.x.clone(),
                counts: values.to_vec(),
                style: Style {
                    width: 1.0,
                    dash: None,
                    color: Color(HISTOGRAM_COLOR),
                },
            }),
        };
        fig.add_series(series);
    }
    fig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::reconcile;

    #[test]
    fn decimation_keeps_bucket_heads() {
        let points: Vec<[f64; 2]> = (0..10).map(|i| [i as f64, 0.0]).collect();
        let out = decimate_points(&points, 5);
        assert_eq!(out.len(), 5);
        assert_eq!(out[1], [2.0, 0.0]);
    }

    #[test]
    fn rank_two_data_draws_one_line_per_row() {
        let data = NdArray::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let plan = reconcile(&data.shape, None).unwrap();
        let fig = figure_from_plan("data1", &plan, &data, 100);
        assert_eq!(fig.series.len(), 2);
        let Series::Line(second) = &fig.series[1] else {
            panic!("expected line");
        };
        assert_eq!(second.points, vec![[0.0, 3.0], [1.0, 4.0]]);
    }

    #[test]
    fn histogram_plan_draws_bars() {
        let data = NdArray::from_vec(vec![4.0, 1.0]);
        let plan = reconcile(&data.shape, Some(&[0.0, 0.5, 1.0])).unwrap();
        let fig = figure_from_plan("h", &plan, &data, 100);
        assert!(matches!(&fig.series[0], Series::Histogram(h) if h.edges.len() == 3));
        assert_eq!(fig.bounds(), Some((0.0, 1.0, 0.0, 4.0)));
    }
}
