use std::collections::HashSet;
use std::f64::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use fixedcone_algorithms::{
    Cluster, ConePolicy, DistanceMetric, FixedConeClusterer, FixedConeConfig,
};
use fixedcone_core::HitData;

fn at(theta: f64, phi: f64, energy: f64) -> HitData {
    HitData::from_spherical(1500.0, theta, phi, energy)
}

fn equator(phi: f64, energy: f64) -> HitData {
    HitData::from_spherical(1500.0, FRAC_PI_2, phi, energy)
}

fn member_count(clusters: &[Cluster]) -> usize {
    clusters.iter().map(Cluster::len).sum()
}

fn assert_disjoint(clusters: &[Cluster]) {
    let mut seen = HashSet::new();
    for cluster in clusters {
        for &m in &cluster.members {
            assert!(seen.insert(m), "hit {m} appears in more than one cluster");
        }
    }
}

#[test]
fn test_two_close_seeds_keep_all_energy() {
    // The second seed lies 0.05 rad from the first, inside its 0.1 rad cone,
    // so it is collected while the first cone grows.
    let hits = vec![at(1.0, 0.0, 10.0), at(1.0, 0.05, 8.0)];
    let config = FixedConeConfig::fixed(0.1, 1.0, 0.5).with_metric(DistanceMetric::DPhiDTheta);
    let clusterer = FixedConeClusterer::new(config).unwrap();

    let clusters = clusterer.cluster_hits(&hits);

    assert_eq!(clusters.len(), 1);
    assert_eq!(member_count(&clusters), 2);
    assert_disjoint(&clusters);
    let total: f64 = clusters.iter().map(Cluster::energy).sum();
    assert_relative_eq!(total, 18.0, epsilon = 1e-12);
}

#[test]
fn test_two_overlapping_cones_are_resolved() {
    // 0.15 rad apart: outside each other's cone but closer than 2R.
    let hits = vec![at(1.0, 0.0, 10.0), at(1.0, 0.15, 8.0)];
    let config = FixedConeConfig::fixed(0.1, 1.0, 0.5).with_metric(DistanceMetric::DPhiDTheta);
    let clusterer = FixedConeClusterer::new(config).unwrap();
    let mut state = clusterer.create_state();

    let clusters = clusterer.cluster(&hits, &mut state);
    let stats = clusterer.statistics(&state);

    assert_eq!(clusters.len(), 2);
    assert_eq!(stats.overlapping_pairs, 1);
    assert_eq!(stats.hits_transferred, 0);
    assert_eq!(member_count(&clusters), 2);
    assert_relative_eq!(clusters[0].energy(), 10.0);
    assert_relative_eq!(clusters[1].energy(), 8.0);
}

#[test]
fn test_shared_hit_goes_to_nearer_cluster() {
    let hits = vec![
        at(1.0, 0.0, 10.0),
        at(1.0, 0.16, 8.0),
        // Collected by the first cone, but nearer the second axis.
        at(1.0, 0.09, 1.0),
    ];
    let config = FixedConeConfig::fixed(0.1, 1.0, 0.5).with_metric(DistanceMetric::DPhiDTheta);
    let clusterer = FixedConeClusterer::new(config).unwrap();
    let mut state = clusterer.create_state();

    let built = clusterer.build(&hits, &mut state);
    assert_eq!(built.len(), 2);
    assert_eq!(built[0].members, vec![0, 2]);

    let clusters = clusterer.cluster(&hits, &mut state);
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].members, vec![0]);
    assert!(clusters[1].contains(2));
    assert_relative_eq!(clusters[1].energy(), 9.0);
    assert_eq!(clusterer.statistics(&state).hits_transferred, 1);
}

#[test]
fn test_equidistant_hit_stays_with_first_cluster() {
    // Mirror-image seeds about phi = 0 with a zero-energy hit in between:
    // it does not move either axis and is exactly equidistant from both.
    let (s, c) = 0.06_f64.sin_cos();
    let hits = vec![
        HitData::new([1000.0 * c, -1000.0 * s, 0.0], 5.0),
        HitData::new([1000.0 * c, 1000.0 * s, 0.0], 5.0),
        HitData::new([1000.0, 0.0, 0.0], 0.0),
    ];
    let config = FixedConeConfig::fixed(0.1, 0.5, 0.1).with_metric(DistanceMetric::DPhiDTheta);
    let clusterer = FixedConeClusterer::new(config).unwrap();
    let mut state = clusterer.create_state();

    let clusters = clusterer.cluster(&hits, &mut state);

    assert_eq!(clusters.len(), 2);
    assert_eq!(clusterer.statistics(&state).overlapping_pairs, 1);
    assert_disjoint(&clusters);
    assert_eq!(member_count(&clusters), 3);
    let holders: Vec<&Cluster> = clusters.iter().filter(|c| c.contains(2)).collect();
    assert_eq!(holders.len(), 1);
    assert!(holders[0].contains(0), "tie should keep the hit with the first seed");
}

#[test]
fn test_chained_overlaps_see_earlier_transfers() {
    // Three cones in a row: the middle one overlaps both neighbours.
    let hits = vec![
        equator(0.0, 10.0),
        equator(0.16, 8.0),
        equator(0.32, 6.0),
        equator(0.09, 1.0),
        equator(0.25, 0.5),
    ];
    let config = FixedConeConfig::fixed(0.1, 2.0, 0.5).with_metric(DistanceMetric::DPhiDTheta);
    let clusterer = FixedConeClusterer::new(config).unwrap();
    let mut state = clusterer.create_state();

    let built = clusterer.build(&hits, &mut state);
    let built: Vec<Vec<usize>> = built.into_iter().map(|c| c.members).collect();
    assert_eq!(built, vec![vec![0, 3], vec![1, 4], vec![2]]);

    let clusters = clusterer.cluster(&hits, &mut state);
    let stats = clusterer.statistics(&state);

    // Hit 3 moves into the middle cluster on the first pair, and the middle
    // cluster, with that hit included, then hands hit 4 to the last one.
    assert_eq!(clusters.len(), 3);
    assert_eq!(clusters[0].members, vec![0]);
    assert_eq!(clusters[1].members, vec![1, 3]);
    assert_eq!(clusters[2].members, vec![2, 4]);
    assert_relative_eq!(clusters[0].energy(), 10.0, epsilon = 1e-12);
    assert_relative_eq!(clusters[1].energy(), 9.0, epsilon = 1e-12);
    assert_relative_eq!(clusters[2].energy(), 6.5, epsilon = 1e-12);
    assert_eq!(stats.overlapping_pairs, 2);
    assert_eq!(stats.hits_transferred, 2);
    assert_disjoint(&clusters);
}

#[test]
fn test_single_seed_without_neighbours() {
    let hits = vec![at(0.8, 1.0, 3.0), at(2.2, -2.0, 0.2), at(1.6, 0.0, 0.3)];
    let clusterer = FixedConeClusterer::with_radius(0.1, 1.0, 0.5).unwrap();

    let clusters = clusterer.cluster_hits(&hits);

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members, vec![0]);
    assert_relative_eq!(clusters[0].energy(), 3.0);
}

#[test]
fn test_negative_predicted_radius_yields_no_clusters() {
    let hits = vec![at(1.0, 0.0, 10.0), at(1.0, 1.0, 4.0), at(2.0, 2.0, 2.0)];
    let config = FixedConeConfig::predicted(1.0, [0.01, -0.5], [0.0, 0.0]);
    let clusterer = FixedConeClusterer::new(config).unwrap();
    let mut state = clusterer.create_state();

    let clusters = clusterer.cluster(&hits, &mut state);

    assert!(clusters.is_empty());
    assert!(clusterer.statistics(&state).aborted_on_radius);
}

#[test]
fn test_predicted_cone_and_cut() {
    // Default prediction: R(10 GeV) ~ 0.0693, cut(10 GeV) = 232 GeV.
    let hits = vec![at(1.0, 0.0, 10.0), at(1.0, 0.03, 2.0)];
    let clusterer = FixedConeClusterer::with_prediction(1.0, DistanceMetric::DotProduct).unwrap();
    assert!(clusterer.cluster_hits(&hits).is_empty());

    let mut clusterer = clusterer;
    clusterer
        .set_predict_functions(ConePolicy::DEFAULT_CONE_FUNCTION, [0.5, 0.0])
        .unwrap();
    let clusters = clusterer.cluster_hits(&hits);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 2);
    let expected = 0.011_347 * 10.0_f64.ln() + 0.043_117;
    assert_relative_eq!(clusters[0].cone_radius, expected, epsilon = 1e-12);
}

#[test]
fn test_repeated_runs_are_identical() {
    let hits: Vec<HitData> = (0..60)
        .map(|i| {
            let k = f64::from(i);
            at(0.6 + 0.03 * k, -1.5 + 0.05 * (k * 1.7).sin(), 0.1 + (k * 0.37).cos().abs())
        })
        .collect();
    for metric in [
        DistanceMetric::DotProduct,
        DistanceMetric::DPhiDCosTheta,
        DistanceMetric::DPhiDTheta,
    ] {
        let config = FixedConeConfig::fixed(0.12, 0.5, 0.3).with_metric(metric);
        let clusterer = FixedConeClusterer::new(config).unwrap();
        let first = clusterer.cluster_hits(&hits);
        let second = clusterer.cluster_hits(&hits);
        assert_eq!(first, second);
        assert_disjoint(&first);
    }
}
