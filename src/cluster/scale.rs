/// Per-column standardization to zero mean and unit variance.
///
/// Uses the population standard deviation. Constant columns get a scale of
/// 1 so they map to 0 instead of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learns column means and scales from `rows`.
    ///
    /// All rows are expected to have the same width as the first one. An
    /// empty input yields a zero-width scaler.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        let mut scales = vec![1.0; width];
        if rows.is_empty() {
            return Self { means, scales };
        }

        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        for (c, scale) in scales.iter_mut().enumerate() {
            let var = rows.iter().map(|r| (r[c] - means[c]).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            *scale = if std > f64::EPSILON { std } else { 1.0 };
        }

        Self { means, scales }
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(self.means.iter().zip(&self.scales))
                    .map(|(v, (m, s))| (v - m) / s)
                    .collect()
            })
            .collect()
    }

    pub fn fit_transform(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        Self::fit(rows).transform(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardized_columns_have_zero_mean_unit_variance() {
        let rows = vec![vec![1.0, 100.0], vec![2.0, 200.0], vec![3.0, 300.0]];
        let scaled = StandardScaler::fit_transform(&rows);
        for c in 0..2 {
            let mean: f64 = scaled.iter().map(|r| r[c]).sum::<f64>() / 3.0;
            let var: f64 = scaled.iter().map(|r| (r[c] - mean).powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let rows = vec![vec![5.0], vec![5.0]];
        assert_eq!(StandardScaler::fit_transform(&rows), vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(StandardScaler::fit_transform(&[]).is_empty());
    }
}
