use rayon::prelude::*;

/// Mean silhouette coefficient of a labelling, in `[-1, 1]`.
///
/// For each point `a` is the mean distance to the rest of its cluster and
/// `b` the smallest mean distance to another cluster; the point scores
/// `(b - a) / max(a, b)`. Points in singleton clusters score 0.
///
/// Returns 0 when fewer than two clusters are present.
pub fn silhouette_score(points: &[Vec<f64>], labels: &[usize]) -> f64 {
    let k = labels.iter().max().map_or(0, |m| m + 1);
    let mut sizes = vec![0usize; k];
    for &l in labels {
        sizes[l] += 1;
    }
    if sizes.iter().filter(|s| **s > 0).count() < 2 {
        return 0.0;
    }

    // summed in input order; float addition is not associative
    let scores: Vec<f64> = points
        .par_iter()
        .zip(labels.par_iter())
        .map(|(p, &own)| {
            if sizes[own] < 2 {
                return 0.0;
            }
            let mut sums = vec![0.0; k];
            for (q, &l) in points.iter().zip(labels) {
                sums[l] += euclidean(p, q);
            }
            let a = sums[own] / (sizes[own] - 1) as f64;
            let b = (0..k)
                .filter(|&c| c != own && sizes[c] > 0)
                .map(|c| sums[c] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);
            let denom = a.max(b);
            if denom > 0.0 { (b - a) / denom } else { 0.0 }
        })
        .collect();

    scores.iter().sum::<f64>() / points.len() as f64
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    super::kmeans::squared_distance(a, b).sqrt()
}
