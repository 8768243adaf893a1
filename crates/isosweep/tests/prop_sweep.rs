use isosweep::case_tables::{edge_mask, is_uniform, triangle_edges};
use isosweep::*;
use isosweep_core::{CORNER_OFFSETS, EDGE_CORNERS};
use proptest::prelude::*;

fn corner(x: f32, value: f32) -> CornerVertex {
    CornerVertex::new(Vec3::new(x, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), value)
}

fn small_volume() -> impl Strategy<Value = DenseVolume> {
    (2_usize..5, 2_usize..5, 2_usize..5).prop_flat_map(|(nx, ny, nz)| {
        prop::collection::vec(0.0_f32..1.0, nx * ny * nz)
            .prop_map(move |values| DenseVolume::new([nx, ny, nz], values).unwrap())
    })
}

proptest! {
    // Crossings stay on the segment between the two corners
    #[test]
    fn interpolation_stays_on_edge(a in 0.0_f32..10.0, b in 0.0_f32..10.0, t in 0.0_f32..=1.0) {
        let level = a + (b - a) * t;
        let v = interpolate(level, &corner(0.0, a), &corner(1.0, b));
        prop_assert!(v.position.x >= -1e-5 && v.position.x <= 1.0 + 1e-5);
        prop_assert_eq!(v.position.y, 0.0);
        prop_assert!((v.normal.length() - 1.0).abs() < 1e-4);
    }

    // Every crossed edge has endpoints on opposite sides of the level
    #[test]
    fn edge_mask_matches_corner_signs(values in prop::array::uniform8(0.0_f32..1.0), level in 0.0_f32..1.0) {
        let corners: Vec<CornerVertex> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let [dx, dy, dz] = CORNER_OFFSETS[i];
                CornerVertex::new(Vec3::new(dx as f32, dy as f32, dz as f32), Vec3::Z, v)
            })
            .collect();
        let cell = Cell::try_from(corners.as_slice()).unwrap();
        let case = cell.case_index(level);
        let mask = edge_mask(case);
        for (edge, [a, b]) in EDGE_CORNERS.iter().enumerate() {
            let crossed = (values[*a] <= level) != (values[*b] <= level);
            prop_assert_eq!(mask & (1 << edge) != 0, crossed);
        }
        prop_assert_eq!(is_uniform(case), mask == 0);
        for tri in triangle_edges(case) {
            for edge in tri {
                prop_assert!(mask & (1 << edge) != 0);
            }
        }
    }

    // Indices are valid and the last snapshot is the final surface
    #[test]
    fn sweep_produces_consistent_mesh(volume in small_volume(), level in 0.05_f32..0.95) {
        let snapshots = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = snapshots.clone();
        let outcome = IsosurfaceRunner::new(ExtractionOptions::new(level).with_update(UpdateType::Cube))
            .unwrap()
            .on_mesh(move |mesh| sink.lock().unwrap().push(mesh))
            .run(&volume)
            .unwrap();
        let mesh = outcome.mesh().unwrap();

        prop_assert_eq!(mesh.indices().len() % 3, 0);
        prop_assert!(mesh.indices().iter().all(|&i| (i as usize) < mesh.num_vertices()));
        prop_assert_eq!(mesh.positions().len(), 2 * mesh.num_vertices());
        let snapshots = snapshots.lock().unwrap();
        prop_assert_eq!(snapshots.last(), Some(mesh));

        let [nx, ny, nz] = volume.dims();
        let stats = outcome.stats();
        prop_assert_eq!(stats.corners_computed as usize, nx * ny * nz);
        prop_assert_eq!(stats.cells_visited as usize, (nx - 1) * (ny - 1) * (nz - 1));

        let complete = IsosurfaceRunner::new(ExtractionOptions::new(level).with_update(UpdateType::Complete))
            .unwrap()
            .run(&volume)
            .unwrap();
        prop_assert_eq!(complete.mesh(), Some(mesh));
    }
}
