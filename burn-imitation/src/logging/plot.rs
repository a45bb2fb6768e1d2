use std::fmt::Display;
use std::path::Path;

use plotters::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("failed to draw {path}: {message}")]
    Draw { path: String, message: String },
}

/// Draws the loss history as a line on a logarithmic y-axis and writes it as SVG.
///
/// Non-positive and non-finite losses have no place on a log axis and are skipped.
pub fn plot_losses(path: &Path, losses: &[f64]) -> Result<(), PlotError> {
    let points: Vec<(usize, f64)> = losses
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, loss)| loss.is_finite() && *loss > 0.0)
        .collect();
    let (low, high) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), (_, loss)| {
            (low.min(*loss), high.max(*loss))
        });
    let (low, high) = match points.is_empty() {
        true => (0.1, 1.0),
        false if low == high => (low / 10.0, high * 10.0),
        false => (low, high),
    };

    let root = SVGBackend::new(path, (640, 480)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| draw_error(path, e))?;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0..losses.len().max(1), (low..high).log_scale())
        .map_err(|e| draw_error(path, e))?;
    chart
        .configure_mesh()
        .x_desc("evaluation")
        .y_desc("loss")
        .draw()
        .map_err(|e| draw_error(path, e))?;
    chart
        .draw_series(LineSeries::new(points, &BLUE))
        .map_err(|e| draw_error(path, e))?;
    root.present().map_err(|e| draw_error(path, e))?;
    Ok(())
}

fn draw_error(path: &Path, err: impl Display) -> PlotError {
    PlotError::Draw {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
