//! Reporting utilities: summary statistics and formatted terminal output.

pub mod format;

pub use format::*;

/// Min/max/mean of a curve (non-finite samples ignored).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Root-mean-square deviation from `mean`.
    pub spread: f64,
}

pub fn summarize(values: &[f64]) -> Option<ValueSummary> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let spread = (finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    Some(ValueSummary {
        min: finite.iter().copied().fold(f64::INFINITY, f64::min),
        max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean,
        spread,
    })
}

/// Up to `rows` evenly spaced sample indices covering `0..len` (both ends included).
pub fn table_indices(len: usize, rows: usize) -> Vec<usize> {
    if len == 0 || rows == 0 {
        return Vec::new();
    }
    if rows >= len {
        return (0..len).collect();
    }
    if rows == 1 {
        return vec![0];
    }
    let mut out: Vec<usize> = (0..rows)
        .map(|i| ((len - 1) as f64 * i as f64 / (rows - 1) as f64).round() as usize)
        .collect();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_ignores_non_finite() {
        let s = summarize(&[1.0, f64::NAN, 3.0]).unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.spread, 1.0);
        assert!(summarize(&[f64::NAN]).is_none());
    }

    #[test]
    fn table_indices_cover_both_ends() {
        assert_eq!(table_indices(801, 5), vec![0, 200, 400, 600, 800]);
        assert_eq!(table_indices(3, 10), vec![0, 1, 2]);
        assert!(table_indices(0, 4).is_empty());
    }
}
