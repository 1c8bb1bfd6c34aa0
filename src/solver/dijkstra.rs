use log::{debug, info};

use crate::frontier::{Frontier, SmallestCostHolder};
use crate::node::{Node, Position};
use crate::pathing_grid::PathingGrid;
use crate::solver::{GridSolver, SearchError, Trace};

/// Single-source shortest paths over the grid's implicit 4-connected graph. Entering a
/// cell costs its weight and walls are never entered. The search stops as soon as the
/// end is settled.
#[derive(Clone, Copy, Debug, Default)]
pub struct DijkstraSolver;

impl DijkstraSolver {
    pub fn new() -> DijkstraSolver {
        DijkstraSolver
    }
}

impl GridSolver for DijkstraSolver {
    fn solve(&self, grid: &mut PathingGrid) -> Result<Trace, SearchError> {
        let (start_ix, end_ix) = match (grid.start_ix(), grid.end_ix()) {
            (Some(start), Some(end)) => (start, end),
            (start, end) => {
                return Err(SearchError::MissingEndpoints {
                    start: start.is_some(),
                    end: end.is_some(),
                })
            }
        };
        grid.reset_transient();
        let start = grid.nodes[start_ix].position();
        let end = grid.nodes[end_ix].position();
        if grid.connected(start, end) {
            debug!("{end} is reachable from {start}, computing path");
        } else {
            info!("{end} is not reachable from {start}, exploring the start's component");
        }

        grid.nodes[start_ix].distance = 0;
        let mut frontier = Frontier::default();
        frontier.push(start_ix, 0);
        let mut explored_nodes = Vec::new();

        while let Some(SmallestCostHolder { cost, index }) = frontier.pop() {
            let node = &mut grid.nodes[index];
            // We may have inserted a cell several times if we found a cheaper way to
            // reach it. The first pop settles it and later ones are discarded.
            if node.explored || node.is_wall {
                continue;
            }
            node.explored = true;
            let position = node.position();
            explored_nodes.push(position);

            if index == end_ix {
                let path = reconstruct_path(grid, end_ix);
                info!(
                    "Found path of cost {cost} and {} steps after exploring {} cells",
                    path.len() - 1,
                    explored_nodes.len()
                );
                return Ok(Trace::found(explored_nodes, path));
            }

            for n in grid.neighbor_ixs(index) {
                let neighbour = &mut grid.nodes[n];
                if neighbour.explored || neighbour.is_wall {
                    continue;
                }
                let new_cost = cost.saturating_add(neighbour.weight);
                if new_cost < neighbour.distance {
                    neighbour.distance = new_cost;
                    neighbour.predecessor = Some(position);
                    frontier.push(n, new_cost);
                }
            }
        }
        info!(
            "No path from {start} to {end}, explored {} cells",
            explored_nodes.len()
        );
        Ok(Trace::not_found(explored_nodes))
    }
}

/// Follows predecessor links back from the end and marks every cell strictly between
/// start and end as on the path.
fn reconstruct_path(grid: &mut PathingGrid, end_ix: usize) -> Vec<Position> {
    let mut path: Vec<Position> =
        std::iter::successors(Some(grid.nodes[end_ix].position()), |p| {
            grid.node(*p).and_then(Node::predecessor)
        })
        .collect();
    path.reverse();
    if path.len() > 2 {
        for p in &path[1..path.len() - 1] {
            if let Some(ix) = grid.get_ix(*p) {
                grid.nodes[ix].on_path = true;
            }
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeRole;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn grid_with_endpoints(size: usize, start: Position, end: Position) -> PathingGrid {
        let mut grid = PathingGrid::new(size).unwrap();
        grid.set_node_role(start, NodeRole::Start).unwrap();
        grid.set_node_role(end, NodeRole::End).unwrap();
        grid
    }

    fn assert_orthogonal_walk(grid: &PathingGrid, path: &[Position]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(&pair[1]), 1);
        }
        assert!(path.iter().all(|p| !grid.node(*p).unwrap().is_wall()));
    }

    /// Asserts that the 4 step solution is found on an open 3x3 grid.
    #[test]
    fn solve_open_grid() {
        let mut grid = grid_with_endpoints(3, pos(0, 0), pos(2, 2));
        let trace = DijkstraSolver.solve(&mut grid).unwrap();
        assert!(trace.path_found);
        assert_eq!(trace.path_length, 4);
        assert_eq!(trace.shortest_path.first(), Some(&pos(0, 0)));
        assert_eq!(trace.shortest_path.last(), Some(&pos(2, 2)));
        assert_orthogonal_walk(&grid, &trace.shortest_path);
        assert!(trace.nodes_explored_count <= 9);
        assert_eq!(trace.nodes_explored_count, trace.explored_nodes.len());
        assert_eq!(grid.node(pos(2, 2)).unwrap().distance(), Some(4));
    }

    #[test]
    fn adjacent_endpoints() {
        let mut grid = grid_with_endpoints(3, pos(0, 0), pos(0, 1));
        let trace = DijkstraSolver.solve(&mut grid).unwrap();
        assert_eq!(trace.path_length, 1);
        assert_eq!(trace.shortest_path, vec![pos(0, 0), pos(0, 1)]);
        assert_eq!(trace.explored_nodes, vec![pos(0, 0), pos(0, 1)]);
        assert!(trace.path_interior().is_empty());
    }

    #[test]
    fn walled_off_end_has_no_path() {
        // |S#E|
        // |.#.|
        // |.#.|
        let mut grid = grid_with_endpoints(3, pos(0, 0), pos(0, 2));
        for row in 0..3 {
            grid.set_node_role(pos(row, 1), NodeRole::Wall).unwrap();
        }
        let trace = DijkstraSolver.solve(&mut grid).unwrap();
        assert!(!trace.path_found);
        assert!(trace.shortest_path.is_empty());
        assert_eq!(trace.path_length, 0);
        assert_eq!(trace.explored_nodes, vec![pos(0, 0), pos(1, 0), pos(2, 0)]);
        assert!(grid.nodes().all(|n| !n.on_path()));
    }

    #[test]
    fn heavy_cell_is_avoided() {
        let mut grid = grid_with_endpoints(3, pos(0, 0), pos(0, 2));
        grid.set_node_role(pos(0, 1), NodeRole::Weight).unwrap();
        grid.set_node_role(pos(0, 1), NodeRole::Weight).unwrap();
        let trace = DijkstraSolver.solve(&mut grid).unwrap();
        assert_eq!(
            trace.shortest_path,
            vec![pos(0, 0), pos(1, 0), pos(1, 1), pos(1, 2), pos(0, 2)]
        );
        assert_eq!(trace.path_length, 4);
        assert_eq!(DijkstraSolver.get_path_cost(&grid, &trace.shortest_path), 4);
        assert_eq!(grid.node(pos(0, 2)).unwrap().distance(), Some(4));
    }

    #[test]
    fn cheap_weight_is_crossed() {
        // |S3.E|
        // |.##.|
        // |....|
        let mut grid = grid_with_endpoints(4, pos(0, 0), pos(0, 3));
        grid.set_node_role(pos(0, 1), NodeRole::Weight).unwrap();
        for col in 1..3 {
            grid.set_node_role(pos(1, col), NodeRole::Wall).unwrap();
        }
        let trace = DijkstraSolver.solve(&mut grid).unwrap();
        assert_eq!(
            trace.shortest_path,
            vec![pos(0, 0), pos(0, 1), pos(0, 2), pos(0, 3)]
        );
        assert_eq!(DijkstraSolver.get_path_cost(&grid, &trace.shortest_path), 5);
    }

    #[test]
    fn marks_path_interior_only() {
        let mut grid = grid_with_endpoints(4, pos(0, 0), pos(0, 3));
        let trace = DijkstraSolver.solve(&mut grid).unwrap();
        let marked: Vec<Position> = grid
            .nodes()
            .filter(|n| n.on_path())
            .map(|n| n.position())
            .collect();
        assert_eq!(marked, trace.path_interior().to_vec());
        assert_eq!(marked, vec![pos(0, 1), pos(0, 2)]);
        assert!(trace
            .explored_nodes
            .iter()
            .all(|p| grid.node(*p).unwrap().explored()));
    }

    #[test]
    fn exploration_is_monotone_in_distance() {
        let mut grid = grid_with_endpoints(6, pos(0, 0), pos(5, 5));
        grid.set_node_role(pos(2, 2), NodeRole::Weight).unwrap();
        grid.set_node_role(pos(3, 1), NodeRole::Wall).unwrap();
        let trace = DijkstraSolver.solve(&mut grid).unwrap();
        let distances: Vec<u32> = trace
            .explored_nodes
            .iter()
            .map(|p| grid.node(*p).unwrap().distance().unwrap())
            .collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn missing_endpoints_leave_grid_untouched() {
        let mut grid = PathingGrid::new(3).unwrap();
        grid.set_node_role(pos(0, 0), NodeRole::Start).unwrap();
        grid.nodes[4].explored = true;
        assert_eq!(
            DijkstraSolver.solve(&mut grid),
            Err(SearchError::MissingEndpoints {
                start: true,
                end: false
            })
        );
        assert!(grid.nodes[4].explored);
    }

    #[test]
    fn rerun_is_deterministic() {
        let mut grid = grid_with_endpoints(7, pos(1, 1), pos(5, 5));
        for p in [pos(2, 2), pos(2, 3), pos(3, 2), pos(4, 4)] {
            grid.set_node_role(p, NodeRole::Wall).unwrap();
        }
        grid.set_node_role(pos(3, 3), NodeRole::Weight).unwrap();
        let first = DijkstraSolver.solve(&mut grid).unwrap();
        let snapshot: Vec<Node> = grid.nodes().cloned().collect();
        let second = DijkstraSolver.solve(&mut grid).unwrap();
        assert_eq!(first, second);
        assert!(grid.nodes().eq(snapshot.iter()));
    }
}
