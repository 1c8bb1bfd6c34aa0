//! Random wall layouts.
use log::info;
use rand::Rng;

use crate::pathing_grid::PathingGrid;

/// Clears the grid, turns every cell into a wall with probability `wall_density` and
/// then places start and end on two distinct open cells, if there are two.
pub fn generate_maze<R: Rng + ?Sized>(grid: &mut PathingGrid, wall_density: f64, rng: &mut R) {
    grid.clear_all();
    let density = wall_density.clamp(0.0, 1.0);
    for ix in 0..grid.nodes.len() {
        if rng.gen_bool(density) {
            grid.set_wall(ix, true);
        }
    }
    set_random_start_end(grid, rng);
    info!(
        "Generated maze with {} walls",
        grid.nodes().filter(|n| n.is_wall()).count()
    );
}

fn set_random_start_end<R: Rng + ?Sized>(grid: &mut PathingGrid, rng: &mut R) {
    let mut open = (0..grid.nodes.len())
        .filter(|&ix| !grid.nodes[ix].is_wall)
        .collect::<Vec<_>>();
    if open.len() < 2 {
        return;
    }
    let start = open.remove(rng.gen_range(0..open.len()));
    let end = open.remove(rng.gen_range(0..open.len()));
    grid.place_start(start);
    grid.place_end(end);
}
