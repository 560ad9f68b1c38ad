//! Quantile-threshold hotspot classification.

use crime_hotspot_analytics_models::HotspotSummary;

use crate::AnalyticsError;

/// Quantile `q` of `values` by linear interpolation between order
/// statistics: with `h = (n - 1) * q`, the result lies between the
/// `floor(h)`-th and `ceil(h)`-th smallest values.
///
/// # Errors
///
/// * [`AnalyticsError::EmptyDensity`] for empty input
/// * [`AnalyticsError::Config`] if `q` is outside `[0, 1]`
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(values: &[f64], q: f64) -> Result<f64, AnalyticsError> {
    if values.is_empty() {
        return Err(AnalyticsError::EmptyDensity);
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(AnalyticsError::Config {
            message: format!("quantile must be in [0, 1], got {q}"),
        });
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let h = (sorted.len() - 1) as f64 * q;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = h - h.floor();
    Ok((sorted[upper] - sorted[lower]).mul_add(fraction, sorted[lower]))
}

/// Flags each incident whose density is at or above the `q` quantile.
///
/// # Errors
///
/// See [`quantile`].
pub fn classify(densities: &[u32], q: f64) -> Result<(Vec<bool>, HotspotSummary), AnalyticsError> {
    let values: Vec<f64> = densities.iter().map(|&d| f64::from(d)).collect();
    let threshold = quantile(&values, q)?;
    let flags: Vec<bool> = values.iter().map(|&d| d >= threshold).collect();
    let hotspots = flags.iter().filter(|&&f| f).count();

    log::info!(
        "Hotspot threshold (q={q}): density >= {threshold:.2}, {hotspots} of {} incidents",
        densities.len()
    );

    Ok((
        flags,
        HotspotSummary {
            quantile: q,
            threshold,
            hotspots,
            total: densities.len(),
        },
    ))
}
