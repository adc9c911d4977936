//! Density-based clustering (DBSCAN) over the rows of a matrix.

use ndarray::{Array2, ArrayView1};

/// Label assigned to points that belong to no cluster.
pub const NOISE: i32 = -1;

/// Euclidean distance between two rows.
pub fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Cluster the rows of `points`.
///
/// A row's neighbourhood is every row within `eps` (inclusive), itself
/// included. Rows with at least `min_samples` neighbours are core points.
/// Clusters grow from core points in row order and are numbered from 0;
/// border rows join the first cluster that reaches them. Everything else is
/// [`NOISE`].
pub fn dbscan(points: &Array2<f64>, eps: f64, min_samples: usize) -> Vec<i32> {
    let n = points.nrows();
    let neighbours: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| euclidean(points.row(i), points.row(j)) <= eps)
                .collect()
        })
        .collect();
    let is_core: Vec<bool> = neighbours.iter().map(|nb| nb.len() >= min_samples).collect();

    let mut labels = vec![NOISE; n];
    let mut cluster = 0;
    for start in 0..n {
        if labels[start] != NOISE || !is_core[start] {
            continue;
        }
        labels[start] = cluster;
        let mut frontier = vec![start];
        while let Some(p) = frontier.pop() {
            for &q in &neighbours[p] {
                if labels[q] == NOISE {
                    labels[q] = cluster;
                    if is_core[q] {
                        frontier.push(q);
                    }
                }
            }
        }
        cluster += 1;
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn two_clusters_and_an_outlier() {
        let points = array![
            [0.0, 0.0],
            [0.5, 0.0],
            [10.0, 10.0],
            [10.0, 10.5],
            [50.0, 50.0],
        ];
        assert_eq!(dbscan(&points, 1.5, 2), vec![0, 0, 1, 1, NOISE]);
    }

    #[test]
    fn eps_is_inclusive() {
        let points = array![[0.0], [1.5]];
        assert_eq!(dbscan(&points, 1.5, 2), vec![0, 0]);
    }

    #[test]
    fn border_point_joins_cluster_without_expanding_it() {
        // 0 and 1 are core (min_samples = 3 counts self); 2 is reachable only from 1.
        let points = array![[0.0], [1.0], [2.0], [-1.0]];
        let labels = dbscan(&points, 1.0, 3);
        assert_eq!(labels, vec![0, 0, 0, 0]);

        let sparse = array![[0.0], [1.0], [5.0]];
        assert_eq!(dbscan(&sparse, 1.0, 3), vec![NOISE, NOISE, NOISE]);
    }

    #[test]
    fn min_samples_one_makes_every_point_a_cluster() {
        let points = array![[0.0], [100.0]];
        assert_eq!(dbscan(&points, 1.0, 1), vec![0, 1]);
    }
}
