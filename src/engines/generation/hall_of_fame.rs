use super::genome::{Individual, OptimizationDirection};

/// Best individuals seen over a whole run, best first.
///
/// Members are unique by genome (structural tree equality)
/// and the archive never holds more than `max_size` of them. Only evaluated
/// individuals are admitted.
#[derive(Debug, Clone)]
pub struct HallOfFame {
    members: Vec<Individual>,
    max_size: usize,
    direction: OptimizationDirection,
}

impl HallOfFame {
    pub fn new(max_size: usize, direction: OptimizationDirection) -> Self {
        Self {
            members: Vec::with_capacity(max_size.saturating_add(1)),
            max_size,
            direction,
        }
    }

    /// Offer every evaluated individual of `population` to the archive
    pub fn update(&mut self, population: &[Individual]) {
        for individual in population {
            self.try_add(individual);
        }
    }

    /// Attempt to add one individual; returns whether it was kept
    pub fn try_add(&mut self, individual: &Individual) -> bool {
        if self.max_size == 0 {
            return false;
        }
        let Some(fitness) = individual.fitness() else {
            return false;
        };

        if self.is_full() {
            let worst = self.members.last().and_then(Individual::fitness);
            if let Some(worst) = worst {
                if !self.direction.is_better(fitness, worst) {
                    return false;
                }
            }
        }

        if self.members.iter().any(|m| m.same_genome(individual)) {
            return false;
        }

        // insert after every member that is at least as good, keeping arrival order on ties
        let position = self
            .members
            .iter()
            .position(|m| {
                m.fitness()
                    .map(|f| self.direction.is_better(fitness, f))
                    .unwrap_or(true)
            })
            .unwrap_or(self.members.len());
        self.members.insert(position, individual.clone());
        self.members.truncate(self.max_size);

        true
    }

    /// Best individual seen so far
    pub fn best(&self) -> Option<&Individual> {
        self.members.first()
    }

    pub fn get_all(&self) -> &[Individual] {
        &self.members
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_size
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
