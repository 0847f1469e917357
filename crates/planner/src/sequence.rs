//! Block sequencing with a genetic algorithm.
//!
//! The chromosome pairs a permutation of the blocks with a value-encoded
//! entry corner per block. Fitness is the inverse of the total transition
//! distance along whichever headland the corners share; transitions
//! between corners on different polygons are infeasible and score zero.

use crate::materialize::WorkBlock;
use crate::settings::Corner;
use crate::waypoint::{HeadlandEdge, HeadlandId};
use fieldcourse_core::ga::{GaConfig, GaProblem, GaRunner, Individual};
use fieldcourse_core::Polygon;
use rand::prelude::*;
use std::collections::BTreeMap;

/// Per-gene mutation probability.
const GENE_MUTATION_RATE: f64 = 0.03;
/// Population per block in the field.
const POPULATION_PER_BLOCK: usize = 40;
/// Generations per block in the field.
const GENERATIONS_PER_BLOCK: usize = 10;
const TOURNAMENT_SIZE: usize = 5;
const FITNESS_SCALE: f64 = 10_000.0;

/// The corner a block is left at, given its entry corner, row count and
/// skip setting.
///
/// An even row count exits on the entry's left/right side; an odd skip
/// count exits on the entry's own horizontal edge. The mapping is an
/// involution: applying it twice returns the entry corner.
pub fn exit_corner(entry: Corner, n_rows: usize, skip: usize) -> Corner {
    let same_side = n_rows % 2 == 0;
    let same_edge = skip % 2 == 1;
    match (entry, same_side, same_edge) {
        (Corner::BottomLeft, true, true) => Corner::BottomLeft,
        (Corner::BottomLeft, true, false) => Corner::TopLeft,
        (Corner::BottomLeft, false, true) => Corner::BottomRight,
        (Corner::BottomLeft, false, false) => Corner::TopRight,
        (Corner::BottomRight, true, true) => Corner::BottomRight,
        (Corner::BottomRight, true, false) => Corner::TopRight,
        (Corner::BottomRight, false, true) => Corner::BottomLeft,
        (Corner::BottomRight, false, false) => Corner::TopLeft,
        (Corner::TopRight, true, true) => Corner::TopRight,
        (Corner::TopRight, true, false) => Corner::BottomRight,
        (Corner::TopRight, false, true) => Corner::TopLeft,
        (Corner::TopRight, false, false) => Corner::BottomLeft,
        (Corner::TopLeft, true, true) => Corner::TopLeft,
        (Corner::TopLeft, true, false) => Corner::BottomLeft,
        (Corner::TopLeft, false, true) => Corner::TopRight,
        (Corner::TopLeft, false, false) => Corner::BottomRight,
    }
}

/// Block visiting order plus an entry corner per block.
#[derive(Debug, Clone)]
pub struct SequenceChromosome {
    /// Permutation of block indices.
    pub order: Vec<usize>,
    /// Entry corner per position in `order`.
    pub corners: Vec<Corner>,
    /// Walking direction from the headland start to the first block.
    pub entry_direction: i32,
    /// Walking direction from each block to its successor.
    pub directions: Vec<i32>,
    fitness: f64,
}

impl SequenceChromosome {
    /// Creates a random chromosome for `n` blocks.
    pub fn random<R: Rng>(n: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);
        let corners = (0..n).map(|_| random_corner(rng)).collect();
        Self {
            order,
            corners,
            entry_direction: 1,
            directions: vec![1; n],
            fitness: f64::NEG_INFINITY,
        }
    }

    /// Order crossover (OX) on the permutation, uniform crossover on the
    /// corner genes.
    fn order_crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let n = self.order.len();
        if n < 2 {
            return self.clone();
        }

        let (mut p1, mut p2) = (rng.gen_range(0..n), rng.gen_range(0..n));
        if p1 > p2 {
            std::mem::swap(&mut p1, &mut p2);
        }

        let mut child_order = vec![usize::MAX; n];
        let mut used = vec![false; n];
        for i in p1..=p2 {
            child_order[i] = self.order[i];
            used[self.order[i]] = true;
        }
        let mut j = (p2 + 1) % n;
        for i in 0..n {
            let ix = (p2 + 1 + i) % n;
            if child_order[ix] == usize::MAX {
                while used[other.order[j]] {
                    j = (j + 1) % n;
                }
                child_order[ix] = other.order[j];
                used[other.order[j]] = true;
                j = (j + 1) % n;
            }
        }

        let corners = self
            .corners
            .iter()
            .zip(&other.corners)
            .map(|(a, b)| if rng.gen() { *a } else { *b })
            .collect();

        Self {
            order: child_order,
            corners,
            entry_direction: 1,
            directions: vec![1; n],
            fitness: f64::NEG_INFINITY,
        }
    }
}

fn random_corner<R: Rng>(rng: &mut R) -> Corner {
    Corner::ALL[rng.gen_range(0..Corner::ALL.len())]
}

impl Individual for SequenceChromosome {
    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        self.order_crossover(other, rng)
    }

    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        let n = self.order.len();
        for i in 0..n {
            if rng.gen::<f64>() < GENE_MUTATION_RATE && n >= 2 {
                let j = rng.gen_range(0..n);
                self.order.swap(i, j);
            }
        }
        for corner in self.corners.iter_mut() {
            if rng.gen::<f64>() < GENE_MUTATION_RATE {
                *corner = random_corner(rng);
            }
        }
        self.fitness = f64::NEG_INFINITY;
    }
}

/// Distance model for the sequencing GA.
pub struct SequenceProblem<'a> {
    blocks: &'a [WorkBlock],
    headland: &'a Polygon,
    islands: &'a BTreeMap<u32, Polygon>,
    circle_start: usize,
    circle_step: i32,
    n_headland_passes: usize,
    rows_to_skip: usize,
}

impl<'a> SequenceProblem<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        blocks: &'a [WorkBlock],
        headland: &'a Polygon,
        islands: &'a BTreeMap<u32, Polygon>,
        circle_start: usize,
        circle_step: i32,
        n_headland_passes: usize,
        rows_to_skip: usize,
    ) -> Self {
        Self {
            blocks,
            headland,
            islands,
            circle_start,
            circle_step,
            n_headland_passes,
            rows_to_skip,
        }
    }

    fn polygon_for(&self, id: HeadlandId) -> Option<&Polygon> {
        match id {
            HeadlandId::Field => Some(self.headland),
            HeadlandId::Island(island) => self.islands.get(&island),
        }
    }

    /// Distance from the headland start to the first block's entry edge.
    fn entry_distance(&self, block: &WorkBlock, entry: Corner) -> (f64, i32) {
        let crossing = block.corner(entry);
        if crossing.headland != HeadlandId::Field {
            // the headland track cannot reach an island-bounded corner
            return (f64::INFINITY, self.circle_step);
        }
        if self.n_headland_passes > 0 {
            let d = edge_walk(
                self.headland,
                self.circle_start,
                crossing.edge,
                self.circle_step,
            );
            (d, self.circle_step)
        } else {
            shorter_walk(self.headland, self.circle_start, crossing.edge)
        }
    }

    /// Distance between the previous block's exit corner and the next
    /// block's entry corner along their shared polygon.
    fn transition_distance(
        &self,
        previous: &WorkBlock,
        previous_entry: Corner,
        next: &WorkBlock,
        next_entry: Corner,
    ) -> (f64, i32) {
        let exit = exit_corner(previous_entry, previous.n_rows(), self.rows_to_skip);
        let from = previous.corner(exit);
        let to = next.corner(next_entry);
        if from.headland != to.headland {
            return (f64::INFINITY, 1);
        }
        let Some(polygon) = self.polygon_for(from.headland) else {
            return (f64::INFINITY, 1);
        };

        let mut best = (f64::INFINITY, 1);
        for step in [1, -1] {
            let start = if step >= 0 {
                from.edge.to_ix
            } else {
                from.edge.from_ix
            };
            let d = edge_walk(polygon, start, to.edge, step);
            if d < best.0 {
                best = (d, step);
            }
        }
        best
    }

    /// Total transition distance and the winning directions per position.
    pub fn total_distance(&self, chromosome: &SequenceChromosome) -> (f64, i32, Vec<i32>) {
        let n = chromosome.order.len();
        let mut total = 0.0;
        let mut directions = vec![1; n];
        let mut entry_direction = self.circle_step;

        for position in 0..n {
            let block = &self.blocks[chromosome.order[position]];
            let entry = chromosome.corners[position];
            if position == 0 {
                let (d, step) = self.entry_distance(block, entry);
                total += d;
                entry_direction = step;
            } else {
                let previous = &self.blocks[chromosome.order[position - 1]];
                let previous_entry = chromosome.corners[position - 1];
                let (d, step) = self.transition_distance(previous, previous_entry, block, entry);
                total += d;
                directions[position - 1] = step;
            }
        }
        (total, entry_direction, directions)
    }
}

impl GaProblem for SequenceProblem<'_> {
    type Individual = SequenceChromosome;

    fn evaluate(&self, chromosome: &mut SequenceChromosome) {
        let (distance, entry_direction, directions) = self.total_distance(chromosome);
        chromosome.entry_direction = entry_direction;
        chromosome.directions = directions;
        chromosome.fitness = if distance.is_finite() {
            FITNESS_SCALE / distance.max(f64::EPSILON)
        } else {
            0.0
        };
    }

    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<SequenceChromosome> {
        (0..size)
            .map(|_| SequenceChromosome::random(self.blocks.len(), rng))
            .collect()
    }
}

/// A block with its GA-chosen entry corner and outgoing direction.
#[derive(Debug)]
pub struct SequencedBlock {
    pub block: WorkBlock,
    pub entry: Corner,
    pub direction_to_next: i32,
}

/// Statistics of the sequencing run.
#[derive(Debug, Clone)]
pub struct SequenceStats {
    pub generations: u32,
    pub best_fitness: f64,
    pub history: Vec<f64>,
}

/// Orders the blocks and picks their entry corners.
#[allow(clippy::too_many_arguments)]
pub fn sequence_blocks<R: Rng>(
    blocks: Vec<WorkBlock>,
    headland: &Polygon,
    islands: &BTreeMap<u32, Polygon>,
    circle_start: usize,
    circle_step: i32,
    n_headland_passes: usize,
    rows_to_skip: usize,
    rng: &mut R,
) -> (Vec<SequencedBlock>, i32, SequenceStats) {
    let n = blocks.len();
    let problem = SequenceProblem::new(
        &blocks,
        headland,
        islands,
        circle_start,
        circle_step,
        n_headland_passes,
        rows_to_skip,
    );
    let config = GaConfig::new()
        .with_population_size(POPULATION_PER_BLOCK * n)
        .with_max_generations((GENERATIONS_PER_BLOCK * n) as u32)
        .with_mutation_rate(1.0)
        .with_tournament_size(TOURNAMENT_SIZE)
        .with_elite_count(2);
    let runner = GaRunner::new(config, problem);
    let result = runner.run_with_rng(rng);

    let best = result.best;
    if best.fitness <= 0.0 {
        log::warn!("no feasible block sequence found, keeping best-effort order");
    }
    let stats = SequenceStats {
        generations: result.generations,
        best_fitness: best.fitness,
        history: result.history,
    };

    let mut indexed: Vec<Option<WorkBlock>> = blocks.into_iter().map(Some).collect();
    let sequenced = best
        .order
        .iter()
        .enumerate()
        .map(|(position, &block_ix)| SequencedBlock {
            block: indexed[block_ix].take().expect("each block used once"),
            entry: best.corners[position],
            direction_to_next: best.directions[position],
        })
        .collect();
    (sequenced, best.entry_direction, stats)
}

/// Distance along `polygon` from the edge at `start_edge` to `target`,
/// walking in `step`; the start vertex follows the slice convention.
fn edge_walk(polygon: &Polygon, start_vertex: usize, target: HeadlandEdge, step: i32) -> f64 {
    let end = if step >= 0 { target.from_ix } else { target.to_ix };
    polygon
        .distance_between_edges(start_vertex, end, step)
        .unwrap_or(f64::INFINITY)
}

fn shorter_walk(polygon: &Polygon, start_vertex: usize, target: HeadlandEdge) -> (f64, i32) {
    let mut best = (f64::INFINITY, 1);
    for step in [1, -1] {
        let d = edge_walk(polygon, start_vertex, target, step);
        if d < best.0 {
            best = (d, step);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::split_into_blocks;
    use crate::materialize::materialize_block;
    use crate::rows::{find_intersections, generate_rows};
    use fieldcourse_core::Point;

    #[test]
    fn test_exit_corner_is_involution() {
        for entry in Corner::ALL {
            for n_rows in 1..=8 {
                for skip in 0..=3 {
                    let exit = exit_corner(entry, n_rows, skip);
                    assert_eq!(exit_corner(exit, n_rows, skip), entry);
                }
            }
        }
    }

    #[test]
    fn test_exit_corner_plain_up_down() {
        // even rows, no skip: same side, opposite edge
        assert_eq!(exit_corner(Corner::BottomLeft, 10, 0), Corner::TopLeft);
        // odd rows, no skip: opposite side, opposite edge
        assert_eq!(exit_corner(Corner::BottomLeft, 9, 0), Corner::TopRight);
        // even rows, one skipped: back where we started
        assert_eq!(exit_corner(Corner::BottomLeft, 10, 1), Corner::BottomLeft);
    }

    #[test]
    fn test_chromosome_crossover_is_permutation() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = SequenceChromosome::random(8, &mut rng);
        let b = SequenceChromosome::random(8, &mut rng);
        let child = a.order_crossover(&b, &mut rng);
        let mut sorted = child.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..8).collect::<Vec<_>>());
        assert_eq!(child.corners.len(), 8);
    }

    #[test]
    fn test_mutation_keeps_permutation() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut chromosome = SequenceChromosome::random(10, &mut rng);
        for _ in 0..50 {
            chromosome.mutate(&mut rng);
        }
        let mut sorted = chromosome.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }

    fn two_block_field() -> (Vec<WorkBlock>, Polygon, BTreeMap<u32, Polygon>) {
        let square = Polygon::rectangle(60.0, 60.0);
        let island = Polygon::new(vec![
            Point::new(28.0, -10.0),
            Point::new(32.0, -10.0),
            Point::new(32.0, 70.0),
            Point::new(28.0, 70.0),
        ]);
        let mut generated = generate_rows(&square, 4.0, 2.0, false);
        find_intersections(&mut generated.rows, &square, HeadlandId::Field);
        find_intersections(&mut generated.rows, &island, HeadlandId::Island(1));
        let blocks: Vec<WorkBlock> = split_into_blocks(generated.rows)
            .into_iter()
            .filter_map(|b| materialize_block(b, 4.0, 0))
            .collect();
        let mut islands = BTreeMap::new();
        islands.insert(1, island);
        (blocks, square, islands)
    }

    #[test]
    fn test_sequencer_connects_island_blocks() {
        let (blocks, boundary, islands) = two_block_field();
        assert_eq!(blocks.len(), 2);
        let mut rng = StdRng::seed_from_u64(99);
        let (sequenced, _, stats) =
            sequence_blocks(blocks, &boundary, &islands, 0, 1, 0, 0, &mut rng);
        assert_eq!(sequenced.len(), 2);
        assert!(stats.best_fitness > 0.0);
        // feasible sequences enter the first block from the field boundary
        let first = &sequenced[0];
        assert_eq!(
            first.block.corner(first.entry).headland,
            HeadlandId::Field
        );
    }

    #[test]
    fn test_best_fitness_monotone_over_generations() {
        let (blocks, boundary, islands) = two_block_field();
        let mut rng = StdRng::seed_from_u64(5);
        let (_, _, stats) = sequence_blocks(blocks, &boundary, &islands, 0, 1, 0, 0, &mut rng);
        for pair in stats.history.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }
}
