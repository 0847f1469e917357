//! Genetic algorithm framework.
//!
//! Domain crates define an [`Individual`] (crossover and mutation live on
//! the individual) and a [`GaProblem`] (fitness evaluation and the initial
//! population); [`GaRunner`] drives the generational loop with tournament
//! selection and elitism. The RNG is always supplied by the caller so runs
//! can be made reproducible.

use rand::prelude::*;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a genetic algorithm run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaConfig {
    /// Population size.
    pub population_size: usize,
    /// Number of generations to run.
    pub max_generations: u32,
    /// Probability that a child is produced by crossover rather than cloned.
    pub crossover_rate: f64,
    /// Probability that a child is mutated.
    pub mutation_rate: f64,
    /// Number of best individuals carried over unchanged each generation.
    pub elite_count: usize,
    /// Tournament size for parent selection.
    pub tournament_size: usize,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 100,
            crossover_rate: 0.85,
            mutation_rate: 0.05,
            elite_count: 2,
            tournament_size: 3,
        }
    }
}

impl GaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the population size (at least 2).
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the number of generations.
    pub fn with_max_generations(mut self, generations: u32) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elite count.
    pub fn with_elite_count(mut self, count: usize) -> Self {
        self.elite_count = count;
        self
    }

    /// Sets the tournament size (at least 1).
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size.max(1);
        self
    }
}

/// An individual in the population. Higher fitness is better.
pub trait Individual: Clone + Send + Sync {
    /// Fitness of this individual, as set by the last evaluation.
    fn fitness(&self) -> f64;

    /// Produces a child from this individual and another parent.
    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self;

    /// Mutates this individual in place.
    fn mutate<R: Rng>(&mut self, rng: &mut R);
}

/// Problem-specific operations: evaluation and population setup.
pub trait GaProblem: Send + Sync {
    /// The individual type evolved for this problem.
    type Individual: Individual;

    /// Evaluates one individual, storing its fitness.
    fn evaluate(&self, individual: &mut Self::Individual);

    /// Evaluates many individuals; parallel by default.
    fn evaluate_parallel(&self, individuals: &mut [Self::Individual]) {
        individuals
            .par_iter_mut()
            .for_each(|individual| self.evaluate(individual));
    }

    /// Creates the initial population.
    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Self::Individual>;
}

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// The best individual found.
    pub best: I,
    /// Number of generations run.
    pub generations: u32,
    /// Best fitness per generation, non-decreasing under elitism.
    pub history: Vec<f64>,
}

/// Drives the generational loop for a [`GaProblem`].
pub struct GaRunner<P: GaProblem> {
    config: GaConfig,
    problem: P,
}

impl<P: GaProblem> GaRunner<P> {
    /// Creates a runner for the given problem.
    pub fn new(config: GaConfig, problem: P) -> Self {
        Self { config, problem }
    }

    /// The problem this runner evolves.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Runs the configured number of generations with the supplied RNG.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> GaResult<P::Individual> {
        let mut population = self
            .problem
            .initialize_population(self.config.population_size, rng);
        self.problem.evaluate_parallel(&mut population);
        sort_by_fitness(&mut population);

        let mut best = population[0].clone();
        let mut history = Vec::with_capacity(self.config.max_generations as usize + 1);
        let mut generation = 0;

        while generation < self.config.max_generations {
            history.push(best.fitness());

            let elite_count = self.config.elite_count.min(population.len());
            let mut next: Vec<P::Individual> = population[..elite_count].to_vec();

            let mut children = Vec::with_capacity(self.config.population_size - next.len());
            while next.len() + children.len() < self.config.population_size {
                let parent1 = self.tournament_select(&population, rng);
                let parent2 = self.tournament_select(&population, rng);

                let mut child = if rng.gen::<f64>() < self.config.crossover_rate {
                    parent1.crossover(parent2, rng)
                } else {
                    parent1.clone()
                };
                if rng.gen::<f64>() < self.config.mutation_rate {
                    child.mutate(rng);
                }
                children.push(child);
            }

            self.problem.evaluate_parallel(&mut children);
            next.extend(children);
            sort_by_fitness(&mut next);

            if next[0].fitness() > best.fitness() {
                best = next[0].clone();
            }

            population = next;
            generation += 1;
        }

        history.push(best.fitness());
        GaResult {
            best,
            generations: generation,
            history,
        }
    }

    fn tournament_select<'a, R: Rng>(
        &self,
        population: &'a [P::Individual],
        rng: &mut R,
    ) -> &'a P::Individual {
        let mut best_ix = rng.gen_range(0..population.len());
        for _ in 1..self.config.tournament_size {
            let ix = rng.gen_range(0..population.len());
            if population[ix].fitness() > population[best_ix].fitness() {
                best_ix = ix;
            }
        }
        &population[best_ix]
    }
}

fn sort_by_fitness<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| {
        b.fitness()
            .partial_cmp(&a.fitness())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct ValueIndividual {
        value: f64,
        fitness: f64,
    }

    impl Individual for ValueIndividual {
        fn fitness(&self) -> f64 {
            self.fitness
        }

        fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
            Self {
                value: if rng.gen() { self.value } else { other.value },
                fitness: f64::NEG_INFINITY,
            }
        }

        fn mutate<R: Rng>(&mut self, rng: &mut R) {
            self.value += rng.gen_range(-5.0..5.0);
            self.fitness = f64::NEG_INFINITY;
        }
    }

    struct ValueProblem;

    impl GaProblem for ValueProblem {
        type Individual = ValueIndividual;

        fn evaluate(&self, individual: &mut ValueIndividual) {
            // maximize -(x^2), optimum at 0
            individual.fitness = -individual.value * individual.value;
        }

        fn initialize_population<R: Rng>(
            &self,
            size: usize,
            rng: &mut R,
        ) -> Vec<ValueIndividual> {
            (0..size)
                .map(|_| ValueIndividual {
                    value: rng.gen_range(-100.0..100.0),
                    fitness: f64::NEG_INFINITY,
                })
                .collect()
        }
    }

    #[test]
    fn test_converges_toward_optimum() {
        let config = GaConfig::default()
            .with_population_size(200)
            .with_max_generations(50);
        let runner = GaRunner::new(config, ValueProblem);
        let mut rng = StdRng::seed_from_u64(7);
        let result = runner.run_with_rng(&mut rng);
        assert!(result.best.value.abs() < 10.0);
    }

    #[test]
    fn test_best_fitness_is_monotone() {
        let config = GaConfig::default()
            .with_population_size(30)
            .with_max_generations(40)
            .with_elite_count(2);
        let runner = GaRunner::new(config, ValueProblem);
        let mut rng = StdRng::seed_from_u64(42);
        let result = runner.run_with_rng(&mut rng);
        for pair in result.history.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = GaConfig::default()
            .with_population_size(20)
            .with_max_generations(20);
        let runner = GaRunner::new(config, ValueProblem);
        let a = runner.run_with_rng(&mut StdRng::seed_from_u64(11));
        let b = runner.run_with_rng(&mut StdRng::seed_from_u64(11));
        assert_eq!(a.best.value.to_bits(), b.best.value.to_bits());
    }
}
