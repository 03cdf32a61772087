//! Geographic partitioning of stops ahead of per-cluster routing.
//!
//! Stops are projected onto a local metric plane around the depot and grouped
//! by a deterministic k-means: farthest-point seeding starting from the stop
//! farthest from the depot, then Lloyd iterations until assignments settle.

use geo::Coord;
use log::debug;
use schoolrun_core::{
    Stop,
    geometry::{bearing_degrees, local_offset_meters, offset_to_coord},
};

/// Tuning for [`cluster_stops`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusteringConfig {
    /// Upper bound on Lloyd iterations.
    pub max_iterations: usize,
    /// Fixed cluster count. `None` derives it from demand and capacity.
    pub target_cluster_count: Option<usize>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            target_cluster_count: None,
        }
    }
}

impl ClusteringConfig {
    /// Override the Lloyd iteration bound.
    #[must_use]
    pub const fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Fix the number of clusters instead of deriving it.
    #[must_use]
    pub const fn with_target_cluster_count(mut self, count: usize) -> Self {
        self.target_cluster_count = Some(count);
        self
    }
}

/// A group of nearby stops routed independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// One-based position in centroid bearing order.
    pub id: usize,
    /// Mean stop position.
    pub centroid: Coord<f64>,
    /// Member stops in input order.
    pub stops: Vec<Stop>,
}

impl Cluster {
    /// Students boarding across the cluster.
    #[must_use]
    pub fn demand(&self) -> usize {
        self.stops.iter().map(Stop::demand).sum()
    }
}

/// Number of clusters for `stops`: total demand over bus capacity, rounded
/// up and clamped to `[1, stops.len()]`.
#[must_use]
pub fn cluster_count(stops: &[Stop], capacity: usize, config: &ClusteringConfig) -> usize {
    if stops.is_empty() {
        return 0;
    }
    let total: usize = stops.iter().map(Stop::demand).sum();
    config
        .target_cluster_count
        .unwrap_or_else(|| total.div_ceil(capacity.max(1)))
        .clamp(1, stops.len())
}

/// Partition `stops` into clusters ordered by centroid bearing from `depot`.
///
/// Every stop lands in exactly one cluster and no cluster is empty. The
/// result depends only on the inputs.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::Stop;
/// use schoolrun_solver::{ClusteringConfig, cluster_stops};
///
/// let depot = Coord { x: 0.0, y: 0.0 };
/// let stops = vec![
///     Stop::new(1, "a", Coord { x: 0.0, y: 0.05 }, vec![1, 2, 3]),
///     Stop::new(2, "b", Coord { x: 0.05, y: 0.0 }, vec![4, 5, 6]),
/// ];
/// let clusters = cluster_stops(&stops, depot, 3, &ClusteringConfig::default());
/// assert_eq!(clusters.len(), 2);
/// assert_eq!(clusters[0].stops[0].id, 1);
/// ```
#[must_use]
pub fn cluster_stops(
    stops: &[Stop],
    depot: Coord<f64>,
    capacity: usize,
    config: &ClusteringConfig,
) -> Vec<Cluster> {
    let k = cluster_count(stops, capacity, config);
    if k == 0 {
        return Vec::new();
    }
    let points: Vec<Coord<f64>> = stops
        .iter()
        .map(|stop| local_offset_meters(depot, stop.location()))
        .collect();

    let mut centroids = seed_centroids(&points, k);
    let mut assignment = assign(&points, &centroids);
    let mut iterations = 0;
    while iterations < config.max_iterations {
        iterations += 1;
        centroids = recompute(&points, &assignment, &centroids);
        let next = assign(&points, &centroids);
        if next == assignment {
            break;
        }
        assignment = next;
    }
    debug!(
        "clustered {} stops into {k} groups after {iterations} iterations",
        stops.len()
    );

    let mut groups: Vec<Vec<Stop>> = vec![Vec::new(); centroids.len()];
    for (stop, cluster) in stops.iter().zip(&assignment) {
        if let Some(group) = groups.get_mut(*cluster) {
            group.push(stop.clone());
        }
    }
    let mut clusters: Vec<(f64, Cluster)> = groups
        .into_iter()
        .zip(centroids)
        .filter(|(group, _)| !group.is_empty())
        .map(|(group, projected)| {
            let centroid = offset_to_coord(depot, projected);
            (
                bearing_degrees(depot, centroid),
                Cluster {
                    id: 0,
                    centroid,
                    stops: group,
                },
            )
        })
        .collect();
    clusters.sort_by(|a, b| {
        a.0.total_cmp(&b.0).then_with(|| {
            let first = |c: &Cluster| c.stops.first().map(|s| s.id);
            first(&a.1).cmp(&first(&b.1))
        })
    });
    clusters
        .into_iter()
        .enumerate()
        .map(|(position, (_, mut cluster))| {
            cluster.id = position + 1;
            cluster
        })
        .collect()
}

const fn squared_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Farthest-point seeding from the point farthest from the origin.
fn seed_centroids(points: &[Coord<f64>], k: usize) -> Vec<Coord<f64>> {
    let origin = Coord { x: 0.0, y: 0.0 };
    let mut seeds = Vec::with_capacity(k);
    let mut nearest_seed: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(*p, origin))
        .collect();
    while seeds.len() < k {
        // On the first pass `nearest_seed` holds distances to the depot.
        let Some(next) = argmax(&nearest_seed) else {
            break;
        };
        let Some(seed) = points.get(next).copied() else {
            break;
        };
        seeds.push(seed);
        for (distance, point) in nearest_seed.iter_mut().zip(points) {
            let to_seed = squared_distance(*point, seed);
            *distance = if seeds.len() == 1 {
                to_seed
            } else {
                distance.min(to_seed)
            };
        }
    }
    seeds
}

/// Index of the largest value, lowest index on ties.
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, value) in values.iter().copied().enumerate() {
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}

/// Nearest centroid per point, lowest centroid index on ties.
fn assign(points: &[Coord<f64>], centroids: &[Coord<f64>]) -> Vec<usize> {
    points
        .iter()
        .map(|point| {
            let distances: Vec<f64> = centroids
                .iter()
                .map(|c| -squared_distance(*point, *c))
                .collect();
            argmax(&distances).unwrap_or(0)
        })
        .collect()
}

/// Mean of each cluster's points. Empty clusters keep their centroid.
#[expect(clippy::cast_precision_loss, reason = "cluster sizes are far below 2^52")]
fn recompute(points: &[Coord<f64>], assignment: &[usize], previous: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut sums = vec![(0.0_f64, 0.0_f64, 0_usize); previous.len()];
    for (point, cluster) in points.iter().zip(assignment) {
        if let Some(sum) = sums.get_mut(*cluster) {
            sum.0 += point.x;
            sum.1 += point.y;
            sum.2 += 1;
        }
    }
    sums.into_iter()
        .zip(previous)
        .map(|((x, y, count), old)| {
            if count == 0 {
                *old
            } else {
                Coord {
                    x: x / count as f64,
                    y: y / count as f64,
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DEPOT: Coord<f64> = Coord { x: 0.0, y: 0.0 };

    fn stop(id: u64, lng: f64, lat: f64, demand: u64) -> Stop {
        Stop::new(
            id,
            format!("Stop {id}"),
            Coord { x: lng, y: lat },
            (id * 100..id * 100 + demand).collect(),
        )
    }

    #[rstest]
    #[case(&[10, 10, 10], 40, 1)]
    #[case(&[30, 30, 30], 40, 3)]
    #[case(&[50], 40, 1)]
    #[case(&[5, 5, 5, 5], 5, 4)]
    fn count_follows_demand_over_capacity(
        #[case] demands: &[u64],
        #[case] capacity: usize,
        #[case] expected: usize,
    ) {
        let stops: Vec<Stop> = demands
            .iter()
            .zip(1_u64..)
            .map(|(demand, id)| stop(id, 0.01, 0.01, *demand))
            .collect();
        assert_eq!(
            cluster_count(&stops, capacity, &ClusteringConfig::default()),
            expected
        );
    }

    #[rstest]
    fn no_stops_no_clusters() {
        assert!(cluster_stops(&[], DEPOT, 40, &ClusteringConfig::default()).is_empty());
    }

    #[rstest]
    fn separated_groups_stay_together() {
        let stops = vec![
            stop(1, 0.002, 0.05, 20),
            stop(2, 0.05, 0.001, 20),
            stop(3, 0.001, 0.051, 20),
            stop(4, 0.051, -0.001, 20),
        ];
        let clusters = cluster_stops(&stops, DEPOT, 40, &ClusteringConfig::default());
        let members: Vec<Vec<u64>> = clusters
            .iter()
            .map(|c| c.stops.iter().map(|s| s.id).collect())
            .collect();
        assert_eq!(members, vec![vec![1, 3], vec![2, 4]]);
        assert_eq!(clusters.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(clusters.iter().map(Cluster::demand).sum::<usize>(), 80);
    }

    #[rstest]
    #[expect(clippy::cast_precision_loss, reason = "fixture sizes are small")]
    fn every_stop_lands_in_one_cluster() {
        let stops: Vec<Stop> = (1..=12_u64)
            .map(|id| {
                let angle = (id as f64) * 0.5;
                stop(id, 0.02 * angle.cos(), 0.02 * angle.sin(), 7)
            })
            .collect();
        let clusters = cluster_stops(&stops, DEPOT, 20, &ClusteringConfig::default());
        assert!(!clusters.is_empty() && clusters.len() <= 5);
        let mut ids: Vec<u64> = clusters
            .iter()
            .flat_map(|c| c.stops.iter().map(|s| s.id))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
        assert!(clusters.iter().all(|c| !c.stops.is_empty()));
    }

    #[rstest]
    #[expect(clippy::cast_precision_loss, reason = "fixture sizes are small")]
    fn clustering_is_deterministic() {
        let stops: Vec<Stop> = (1..=20_u64)
            .map(|id| stop(id, 0.003 * id as f64, 0.002 * ((id * 7) % 11) as f64, 4))
            .collect();
        let config = ClusteringConfig::default();
        assert_eq!(
            cluster_stops(&stops, DEPOT, 15, &config),
            cluster_stops(&stops, DEPOT, 15, &config)
        );
    }

    #[rstest]
    fn target_count_overrides_demand() {
        let stops = vec![stop(1, 0.01, 0.0, 1), stop(2, 0.0, 0.01, 1)];
        let config = ClusteringConfig::default().with_target_cluster_count(2);
        assert_eq!(cluster_stops(&stops, DEPOT, 40, &config).len(), 2);
    }
}
