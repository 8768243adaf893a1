use isosweep_core::{extract_contour, PlaneSource};
use proptest::prelude::*;

#[derive(Debug)]
struct Grid {
    nx: usize,
    ny: usize,
    values: Vec<f32>,
}

impl PlaneSource for Grid {
    fn sample(&self, x: i32, y: i32) -> f32 {
        match (usize::try_from(x), usize::try_from(y)) {
            (Ok(x), Ok(y)) if x < self.nx && y < self.ny => self.values[x + y * self.nx],
            _ => 0.0,
        }
    }

    fn size_x(&self) -> usize {
        self.nx
    }

    fn size_y(&self) -> usize {
        self.ny
    }
}

fn arb_grid() -> impl Strategy<Value = Grid> {
    (2_usize..8, 2_usize..8).prop_flat_map(|(nx, ny)| {
        prop::collection::vec(0.0_f32..1.0, nx * ny).prop_map(move |values| Grid { nx, ny, values })
    })
}

fn on_lattice_line(v: f32) -> bool {
    (v - v.round()).abs() < 1e-5
}

proptest! {
    // Contour points lie on lattice edges inside the grid
    #[test]
    fn contour_points_on_lattice_edges(grid in arb_grid(), level in 0.05_f32..0.95) {
        let contour = extract_contour(&grid, level, 1).unwrap();
        for p in &contour.points {
            prop_assert!(on_lattice_line(p.x) || on_lattice_line(p.y));
            prop_assert!(p.x >= -1e-5 && p.x <= (grid.nx - 1) as f32 + 1e-5);
            prop_assert!(p.y >= -1e-5 && p.y <= (grid.ny - 1) as f32 + 1e-5);
        }
        prop_assert!(contour
            .segments
            .iter()
            .all(|&[a, b]| (a as usize) < contour.points.len() && (b as usize) < contour.points.len()));
    }

    // Every point is used by at least one segment and appears once
    #[test]
    fn contour_points_are_distinct(grid in arb_grid(), level in 0.05_f32..0.95) {
        let contour = extract_contour(&grid, level, 1).unwrap();
        let mut used = vec![false; contour.points.len()];
        for &[a, b] in &contour.segments {
            used[a as usize] = true;
            used[b as usize] = true;
        }
        prop_assert!(used.iter().all(|&u| u));
        for (i, p) in contour.points.iter().enumerate() {
            for q in &contour.points[i + 1..] {
                prop_assert!(p.x.to_bits() != q.x.to_bits() || p.y.to_bits() != q.y.to_bits());
            }
        }
    }
}
