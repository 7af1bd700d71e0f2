/// Dense `states x actions` table of learned values, sized once at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct QTable {
    n_states: usize,
    n_actions: usize,
    values: Vec<f64>,
}

impl QTable {
    /// Zero-initialized table. Both dimensions must be positive.
    pub fn new(n_states: usize, n_actions: usize) -> Self {
        assert!(
            n_states > 0 && n_actions > 0,
            "Q-table dimensions must be positive"
        );
        Self {
            n_states,
            n_actions,
            values: vec![0.0; n_states * n_actions],
        }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    pub fn row(&self, state: usize) -> &[f64] {
        let start = state * self.n_actions;
        &self.values[start..start + self.n_actions]
    }

    pub fn row_mut(&mut self, state: usize) -> &mut [f64] {
        let start = state * self.n_actions;
        &mut self.values[start..start + self.n_actions]
    }

    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.row(state)[action]
    }

    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        self.row_mut(state)[action] = value;
    }

    /// Highest value in a row.
    pub fn best_value(&self, state: usize) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Index of the highest value in a row; ties go to the lowest index.
    pub fn best_action(&self, state: usize) -> usize {
        let row = self.row(state);
        let mut best = 0;
        for (idx, &q) in row.iter().enumerate().skip(1) {
            if q > row[best] {
                best = idx;
            }
        }
        best
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.n_actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_is_zeroed_with_fixed_shape() {
        let q = QTable::new(81, 4);
        assert_eq!(q.n_states(), 81);
        assert_eq!(q.n_actions(), 4);
        assert_eq!(q.rows().count(), 81);
        assert!(q.rows().all(|r| r.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn best_value_and_action_follow_row_contents() {
        let mut q = QTable::new(2, 4);
        q.set(1, 2, 3.5);
        q.set(1, 3, -1.0);
        assert_eq!(q.best_value(1), 3.5);
        assert_eq!(q.best_action(1), 2);
        assert_eq!(q.best_action(0), 0);
        assert_eq!(q.get(0, 2), 0.0);
    }

    #[test]
    #[should_panic(expected = "dimensions must be positive")]
    fn zero_actions_is_rejected() {
        let _ = QTable::new(3, 0);
    }
}
