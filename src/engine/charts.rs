// Chart handlers and rendering plumbing.
//
// Three renderers (histogram with density overlay, categorical bars, box
// plots per category) share one visual theme: fixed 990x550 canvas,
// off-white background, one palette, bold sans-serif titles. Charts are
// drawn into an in-memory RGB buffer and PNG-encoded there; the engine
// never touches the filesystem for images.
//
// Every chart handler also produces text that restates the plotted values
// (caption or bullet list), so the answer and the image always agree.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::prelude::*;
use plotters::style::FontDesc;

use crate::atoms::constants::{
    AGE_HISTOGRAM_BINS, CHART_BACKGROUND, CHART_HEIGHT, CHART_PALETTE, CHART_WIDTH,
    FARE_HISTOGRAM_BINS,
};
use crate::atoms::error::{AgentError, AgentResult};
use crate::atoms::types::{PassengerClass, QueryResult};
use crate::engine::dataset::Dataset;
use crate::engine::stats::{mean, require_nonempty};

// ── Theme helpers ──────────────────────────────────────────────────────────

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

fn chart_err<E: std::fmt::Display>(e: E) -> AgentError {
    AgentError::Chart(e.to_string())
}

fn title_font() -> FontDesc<'static> {
    ("sans-serif", 28).into_font().style(FontStyle::Bold)
}

const AXIS_FONT: (&str, u32) = ("sans-serif", 18);

fn encode_png(raw: &[u8]) -> AgentResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    PngEncoder::new(&mut out)
        .write_image(raw, CHART_WIDTH, CHART_HEIGHT, ExtendedColorType::Rgb8)
        .map_err(|e| AgentError::Chart(format!("png encode: {e}")))?;
    Ok(out.into_inner())
}

// ── Density overlay ────────────────────────────────────────────────────────

/// Gaussian kernel density over `[lo, hi]`, scaled by `scale` so the curve
/// overlays a count histogram (scale = n * bin_width). Bandwidth per
/// Silverman's rule of thumb.
fn kde_curve(values: &[f64], lo: f64, hi: f64, scale: f64) -> Vec<(f64, f64)> {
    let n = values.len() as f64;
    let m = mean(values);
    let sd = (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n).sqrt();
    let bw = (0.9 * sd * n.powf(-0.2)).max(1e-6);
    let norm = n * bw * (2.0 * std::f64::consts::PI).sqrt();

    (0..=200)
        .map(|i| {
            let x = lo + (hi - lo) * i as f64 / 200.0;
            let density = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bw;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                / norm;
            (x, density * scale)
        })
        .collect()
}

// ── Renderers ──────────────────────────────────────────────────────────────

fn render_histogram(
    values: &[f64],
    bins: usize,
    color: (u8, u8, u8),
    title: &str,
    x_desc: &str,
) -> AgentResult<Vec<u8>> {
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    // Degenerate single-value distributions still get a visible bar.
    let (lo, hi) = if hi - lo < f64::EPSILON { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let bin_width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / bin_width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let density = kde_curve(values, lo, hi, values.len() as f64 * bin_width);
    let peak = counts.iter().copied().max().unwrap_or(0) as f64;
    let kde_peak = density.iter().map(|p| p.1).fold(0.0, f64::max);
    let y_max = peak.max(kde_peak) * 1.08;

    let color = rgb(color);
    let mut raw = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut raw, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&rgb(CHART_BACKGROUND)).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, title_font())
            .margin(12)
            .x_label_area_size(45)
            .y_label_area_size(55)
            .build_cartesian_2d(lo..hi, 0f64..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(x_desc)
            .y_desc("Count")
            .axis_desc_style(AXIS_FONT)
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(counts.iter().enumerate().map(|(i, &c)| {
                let x0 = lo + i as f64 * bin_width;
                Rectangle::new([(x0, 0.0), (x0 + bin_width, c as f64)], color.mix(0.75).filled())
            }))
            .map_err(chart_err)?;

        chart
            .draw_series(LineSeries::new(density, ShapeStyle::from(&color).stroke_width(2)))
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    encode_png(&raw)
}

fn render_bar_chart(
    labels: &[String],
    values: &[f64],
    palette: &[(u8, u8, u8)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> AgentResult<Vec<u8>> {
    let n = labels.len();
    let y_max = values.iter().cloned().fold(0.0, f64::max) * 1.12;

    let mut raw = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut raw, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&rgb(CHART_BACKGROUND)).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, title_font())
            .margin(12)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)
            .map_err(chart_err)?;

        let label_fmt = |seg: &SegmentValue<usize>| match seg {
            SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.max(2))
            .x_label_formatter(&label_fmt)
            .x_desc(x_desc)
            .y_desc(y_desc)
            .axis_desc_style(AXIS_FONT)
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(values.iter().enumerate().map(|(i, &v)| {
                let color = rgb(palette[i % palette.len()]);
                Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
                    color.filled(),
                )
            }))
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    encode_png(&raw)
}

fn render_box_plot(
    groups: &[(String, Vec<f64>)],
    title: &str,
    x_desc: &str,
    y_desc: &str,
) -> AgentResult<Vec<u8>> {
    let n = groups.len();
    let y_max = groups
        .iter()
        .flat_map(|(_, vs)| vs.iter().cloned())
        .fold(0.0, f64::max) as f32
        * 1.05;

    let mut raw = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];
    {
        let root =
            BitMapBackend::with_buffer(&mut raw, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&rgb(CHART_BACKGROUND)).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, title_font())
            .margin(12)
            .x_label_area_size(45)
            .y_label_area_size(55)
            .build_cartesian_2d((0..n).into_segmented(), 0f32..y_max)
            .map_err(chart_err)?;

        let label_fmt = |seg: &SegmentValue<usize>| match seg {
            SegmentValue::CenterOf(i) => groups.get(*i).map(|g| g.0.clone()).unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n.max(2))
            .x_label_formatter(&label_fmt)
            .x_desc(x_desc)
            .y_desc(y_desc)
            .axis_desc_style(AXIS_FONT)
            .draw()
            .map_err(chart_err)?;

        for (i, (_, vals)) in groups.iter().enumerate() {
            let vals: Vec<f32> = vals.iter().map(|&v| v as f32).collect();
            let quartiles = Quartiles::new(&vals);
            chart
                .draw_series(std::iter::once(
                    Boxplot::new_vertical(SegmentValue::CenterOf(i), &quartiles)
                        .width(50)
                        .whisker_width(0.6)
                        .style(rgb(CHART_PALETTE[i % CHART_PALETTE.len()])),
                ))
                .map_err(chart_err)?;
        }

        root.present().map_err(chart_err)?;
    }
    encode_png(&raw)
}

// ── Chart handlers ─────────────────────────────────────────────────────────

pub fn age_histogram(dataset: &Dataset) -> AgentResult<QueryResult> {
    let ages = dataset.known_ages();
    require_nonempty(&ages, "age")?;
    let png = render_histogram(
        &ages,
        AGE_HISTOGRAM_BINS,
        CHART_PALETTE[0],
        "Distribution of Passenger Ages",
        "Age",
    )?;
    let youngest = ages.iter().cloned().fold(f64::INFINITY, f64::min);
    let oldest = ages.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let text = format!(
        "Here's the age distribution. Average age: {:.1} years, youngest: {youngest:.1}, oldest: {oldest:.1}.",
        mean(&ages),
    );
    Ok(QueryResult::with_plot(text, png))
}

pub fn fare_histogram(dataset: &Dataset) -> AgentResult<QueryResult> {
    let fares = dataset.fares();
    require_nonempty(&fares, "fare")?;
    let png = render_histogram(
        &fares,
        FARE_HISTOGRAM_BINS,
        CHART_PALETTE[2],
        "Distribution of Ticket Fares",
        "Fare (£)",
    )?;
    let max = fares.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let text = format!(
        "Here's the fare distribution. Average fare: £{:.2}, max: £{max:.2}.",
        mean(&fares),
    );
    Ok(QueryResult::with_plot(text, png))
}

pub fn embark_chart(dataset: &Dataset) -> AgentResult<QueryResult> {
    let counts = dataset.town_counts();
    if counts.is_empty() {
        return Err(AgentError::Dataset("no embarkation data on record".into()));
    }
    let labels: Vec<String> = counts.iter().map(|(t, _)| t.label().to_string()).collect();
    let values: Vec<f64> = counts.iter().map(|&(_, n)| n as f64).collect();
    let png = render_bar_chart(
        &labels,
        &values,
        &CHART_PALETTE,
        "Passengers by Embarkation Port",
        "Port",
        "Number of Passengers",
    )?;

    let mut lines = vec!["Passengers by embarkation port:".to_string()];
    for (town, n) in &counts {
        lines.push(format!("  • {}: {n}", town.label()));
    }
    Ok(QueryResult::with_plot(lines.join("\n"), png))
}

pub fn class_chart(dataset: &Dataset) -> AgentResult<QueryResult> {
    let counts = dataset.class_counts();
    let labels: Vec<String> = counts.iter().map(|(c, _)| c.label().to_string()).collect();
    let values: Vec<f64> = counts.iter().map(|&(_, n)| n as f64).collect();
    let png = render_bar_chart(
        &labels,
        &values,
        &CHART_PALETTE,
        "Passengers by Class",
        "Class",
        "Count",
    )?;

    let mut lines = vec!["Passengers by class:".to_string()];
    for (class, n) in &counts {
        lines.push(format!("  • {}: {n}", class.label()));
    }
    Ok(QueryResult::with_plot(lines.join("\n"), png))
}

pub fn survival_by_gender(dataset: &Dataset) -> AgentResult<QueryResult> {
    let rates = dataset.survival_rate_by_sex();
    if rates.is_empty() {
        return Err(AgentError::Dataset("no passengers on record".into()));
    }
    let labels: Vec<String> = rates.iter().map(|(s, _)| s.label().to_string()).collect();
    let values: Vec<f64> = rates.iter().map(|&(_, r)| r).collect();
    // Two-bar palette: steel blue and red, as on every gender chart.
    let png = render_bar_chart(
        &labels,
        &values,
        &[CHART_PALETTE[0], CHART_PALETTE[2]],
        "Survival Rate by Gender",
        "Gender",
        "Survival Rate (%)",
    )?;

    let mut lines = vec!["Survival rate by gender:".to_string()];
    for (sex, rate) in &rates {
        lines.push(format!("  • {}: {rate:.1}%", sex.label()));
    }
    Ok(QueryResult::with_plot(lines.join("\n"), png))
}

pub fn survival_by_class(dataset: &Dataset) -> AgentResult<QueryResult> {
    let rates = dataset.survival_rate_by_class();
    if rates.is_empty() {
        return Err(AgentError::Dataset("no passengers on record".into()));
    }
    let labels: Vec<String> = rates.iter().map(|(c, _)| c.label().to_string()).collect();
    let values: Vec<f64> = rates.iter().map(|&(_, r)| r).collect();
    let png = render_bar_chart(
        &labels,
        &values,
        &CHART_PALETTE,
        "Survival Rate by Class",
        "Class",
        "Survival Rate (%)",
    )?;

    let mut lines = vec!["Survival rate by class:".to_string()];
    for (class, rate) in &rates {
        lines.push(format!("  • {}: {rate:.1}%", class.label()));
    }
    Ok(QueryResult::with_plot(lines.join("\n"), png))
}

pub fn age_by_class(dataset: &Dataset) -> AgentResult<QueryResult> {
    let groups = class_groups(dataset, Dataset::ages_for_class);
    if groups.is_empty() {
        return Err(AgentError::Dataset("no age values on record".into()));
    }
    let png = render_box_plot(&groups, "Age Distribution by Class", "Class", "Age")?;

    let mut lines = vec!["Average age by class:".to_string()];
    for (label, vals) in &groups {
        lines.push(format!("  • {label}: {:.1} years", mean(vals)));
    }
    Ok(QueryResult::with_plot(lines.join("\n"), png))
}

pub fn fare_by_class(dataset: &Dataset) -> AgentResult<QueryResult> {
    let groups = class_groups(dataset, Dataset::fares_for_class);
    if groups.is_empty() {
        return Err(AgentError::Dataset("no fare values on record".into()));
    }
    let png = render_box_plot(&groups, "Fare Distribution by Class", "Class", "Fare (£)")?;

    let mut lines = vec!["Average fare by class:".to_string()];
    for (label, vals) in &groups {
        lines.push(format!("  • {label}: £{:.2}", mean(vals)));
    }
    Ok(QueryResult::with_plot(lines.join("\n"), png))
}

/// Per-class value groups in class order, skipping classes with no data.
fn class_groups(
    dataset: &Dataset,
    select: impl Fn(&Dataset, PassengerClass) -> Vec<f64>,
) -> Vec<(String, Vec<f64>)> {
    PassengerClass::ALL
        .iter()
        .map(|&c| (c.label().to_string(), select(dataset, c)))
        .filter(|(_, vals)| !vals.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dataset::fixtures::full_dataset;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_age_histogram_produces_png() {
        let result = age_histogram(&full_dataset()).unwrap();
        let png = result.plot.expect("age histogram must carry a plot");
        assert_eq!(&png[..8], &PNG_MAGIC);
        assert!(result.text.starts_with("Here's the age distribution."));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let ds = full_dataset();
        let a = fare_histogram(&ds).unwrap().plot.unwrap();
        let b = fare_histogram(&ds).unwrap().plot.unwrap();
        assert_eq!(a, b, "identical dataset must render byte-identical charts");
    }

    #[test]
    fn test_embark_chart_text_matches_counts() {
        let result = embark_chart(&full_dataset()).unwrap();
        assert_eq!(
            result.text,
            "Passengers by embarkation port:\n  • Southampton: 644\n  • Cherbourg: 168\n  • Queenstown: 77"
        );
        assert!(result.plot.is_some());
    }

    #[test]
    fn test_class_chart_orders_by_descending_count() {
        let result = class_chart(&full_dataset()).unwrap();
        assert_eq!(
            result.text,
            "Passengers by class:\n  • Third: 491\n  • First: 216\n  • Second: 184"
        );
    }

    #[test]
    fn test_survival_by_gender_rates() {
        let result = survival_by_gender(&full_dataset()).unwrap();
        assert_eq!(
            result.text,
            "Survival rate by gender:\n  • female: 74.2%\n  • male: 18.9%"
        );
    }

    #[test]
    fn test_box_plot_caption_lists_class_means() {
        let result = age_by_class(&full_dataset()).unwrap();
        assert!(result.text.starts_with("Average age by class:"));
        assert_eq!(result.text.lines().count(), 4, "header plus one line per class");
        assert!(result.plot.is_some());
    }
}
