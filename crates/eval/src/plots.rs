use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

use crate::benchmark::EvaluationReport;

const PALETTE: [RGBColor; 4] = [BLUE, RED, GREEN, MAGENTA];

pub fn generate_plots(reports: &[EvaluationReport], output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    plot_scores(reports, &output_dir.join("scores_per_question.png"))?;
    plot_latency(reports, &output_dir.join("latency_per_question.png"))?;

    Ok(())
}

/// Judge score for every question, one series per system
fn plot_scores(reports: &[EvaluationReport], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let questions = reports.iter().map(|r| r.records.len()).max().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption("Judge Score per Question", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..(questions as f64 + 1.0), 0f64..5.5f64)?;

    chart
        .configure_mesh()
        .x_desc("Question")
        .y_desc("Score (1-5)")
        .draw()?;

    for (i, report) in reports.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let offset = (i as f64 - (reports.len() as f64 - 1.0) / 2.0) * 0.15;

        chart
            .draw_series(report.records.iter().enumerate().map(|(q, record)| {
                Circle::new((q as f64 + 1.0 + offset, record.score as f64), 6, color.filled())
            }))?
            .label(report.summary.system.clone())
            .legend(move |(x, y)| Circle::new((x + 5, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    info!(path = %path.display(), "Saved score plot");
    Ok(())
}

fn plot_latency(reports: &[EvaluationReport], path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let questions = reports.iter().map(|r| r.records.len()).max().unwrap_or(0).max(1);
    let max_latency = reports
        .iter()
        .flat_map(|r| r.records.iter().map(|rec| rec.latency))
        .fold(0.0f64, f64::max)
        .max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption("Latency per Question (s)", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..(questions as f64 + 1.0), 0f64..(max_latency * 1.2))?;

    chart
        .configure_mesh()
        .x_desc("Question")
        .y_desc("Latency (s)")
        .draw()?;

    let width = 0.8 / reports.len().max(1) as f64;
    for (i, report) in reports.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let left = -0.4 + i as f64 * width;

        chart
            .draw_series(report.records.iter().enumerate().map(|(q, record)| {
                let x = q as f64 + 1.0 + left;
                Rectangle::new([(x, 0.0), (x + width, record.latency)], color.filled())
            }))?
            .label(report.summary.system.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    info!(path = %path.display(), "Saved latency plot");
    Ok(())
}
