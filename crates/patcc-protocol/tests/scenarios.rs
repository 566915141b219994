// crates/patcc-protocol/tests/scenarios.rs

//! End-to-end scenario tests driving the full decompose → triangulate →
//! reconcile → assemble pipeline over small synthetic grids, scaled-down
//! analogues of the reference scenarios.

use patcc_assemble::assemble;
use patcc_core::Config;
use patcc_decompose::{DisableCircle, Decomposer, GridProvider, SyntheticGrid};
use patcc_protocol::run_consistency;

fn run_pipeline(
    grid: &SyntheticGrid,
    workloads: &[f64],
) -> patcc_assemble::AssembledTriangulation {
    let config = Config::default();
    let spec = grid.load().expect("grid loads");
    let decomposer = Decomposer::new(config);
    let mut chunks = decomposer
        .decompose(&spec, workloads)
        .expect("decomposition succeeds");

    for chunk in &mut chunks {
        chunk
            .generate_local_triangulation(config.float_epsilon)
            .expect("local triangulation succeeds");
    }

    run_consistency(&mut chunks, &spec.boundary, spec.cyclic, &config)
        .expect("consistency reached");

    assemble(&chunks)
}

/// Scenario 1: a uniform cyclic lat-lon grid triangulates with a single
/// processing unit, and splitting it across several units reproduces the
/// same canonicalized triangle set (spec T5 at small scale).
#[test]
fn uniform_grid_multi_unit_matches_single_unit_reference() {
    let boundary = patcc_core::Boundary::new(0.0, 360.0, -89.0, 89.0);
    let grid = SyntheticGrid::uniform(24, 16, boundary, true).with_polar_points(0, 0);

    let single = run_pipeline(&grid, &[1.0]);
    let multi = run_pipeline(&grid, &[1.0, 1.0, 1.0, 1.0]);

    assert_eq!(single.triangles, multi.triangles);
    assert!(!single.triangles.is_empty());
}

/// Scenario 2: two coincident polar points at each pole means no polar
/// chunk is carved — every leaf is a common chunk.
#[test]
fn two_coincident_polar_points_carves_no_polar_chunk() {
    let boundary = patcc_core::Boundary::new(0.0, 360.0, -90.0, 90.0);
    let grid = SyntheticGrid::uniform(20, 14, boundary, true).with_polar_points(2, 2);
    let spec = grid.load().unwrap();
    let decomposer = Decomposer::new(Config::default());
    let chunks = decomposer.decompose(&spec, &[1.0, 1.0]).unwrap();
    assert!(chunks
        .iter()
        .all(|c| c.node_type == patcc_chunk::NodeType::Common));
}

/// Scenario 3: zero coincident polar points forces carving at both poles,
/// and each polar chunk triangulates successfully under its stereographic
/// projection.
#[test]
fn zero_polar_points_carves_both_caps_and_triangulates() {
    let boundary = patcc_core::Boundary::new(0.0, 360.0, -90.0, 90.0);
    let grid = SyntheticGrid::uniform(20, 14, boundary, true).with_polar_points(0, 0);
    let assembled = run_pipeline(&grid, &[1.0, 1.0]);
    assert!(!assembled.triangles.is_empty());
}

/// Scenario 4: a grid whose own boundary is non-monotonic in longitude
/// (wraps before reaching 360) gets split at the seam first; the result
/// still assembles into one consistent, deduplicated triangulation.
#[test]
fn non_monotonic_longitude_grid_splits_at_seam() {
    let boundary = patcc_core::Boundary::new(200.0, 160.0, -80.0, 80.0);
    let grid = SyntheticGrid::uniform(24, 14, boundary, true).with_polar_points(5, 5);
    assert!(boundary.is_cyclic());
    let assembled = run_pipeline(&grid, &[1.0, 1.0]);
    assert!(!assembled.triangles.is_empty());
}

/// Scenario 6: points inside exclusion circles never appear in any
/// emitted triangle.
#[test]
fn disabled_points_are_absent_from_assembled_triangles() {
    let boundary = patcc_core::Boundary::new(0.0, 360.0, -80.0, 80.0);
    let circles = vec![
        DisableCircle { center_lon: 80.0, center_lat: 65.6, radius_deg: 5.0 },
        DisableCircle { center_lon: 260.0, center_lat: 65.6, radius_deg: 5.0 },
    ];
    let full = SyntheticGrid::uniform(30, 18, boundary, true).with_polar_points(0, 0);
    let masked = full.clone().with_disable_circles(circles.clone());

    let full_spec = full.load().unwrap();
    let masked_spec = masked.load().unwrap();
    assert!(masked_spec.points.len() < full_spec.points.len());

    let assembled = run_pipeline(&masked, &[1.0, 1.0]);
    let surviving_ids: std::collections::HashSet<u32> =
        masked_spec.points.iter().map(|p| p.id).collect();
    for tri in &assembled.triangles {
        for id in tri.0 {
            assert!(surviving_ids.contains(&id));
        }
    }
}
