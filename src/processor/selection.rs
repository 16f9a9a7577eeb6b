//! Event selection against profile floors.

/// One selection cut evaluated over a chunk.
///
/// A floor of zero turns the cut off ([`Criterion::Disabled`]); a positive
/// floor whose source data is absent from the file can never be satisfied
/// ([`Criterion::Missing`]). The two are kept apart on purpose: "no data" is
/// not "no cut".
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// The profile imposes no cut
    Disabled,
    /// The cut is active but the tree lacks its source data
    Missing,
    /// Per-event values that must exceed `floor`
    Values {
        /// Per-event quantity
        values: Vec<f64>,
        /// Strict lower bound
        floor: f64,
    },
}

impl Criterion {
    /// Build a criterion from a profile floor and the quantity, if the tree has it.
    pub fn new(floor: f64, values: Option<Vec<f64>>) -> Self {
        if floor <= 0.0 {
            return Criterion::Disabled;
        }
        match values {
            Some(values) => Criterion::Values { values, floor },
            None => Criterion::Missing,
        }
    }

    /// Whether event `index` of the chunk passes.
    pub fn passes(&self, index: usize) -> bool {
        match self {
            Criterion::Disabled => true,
            Criterion::Missing => false,
            Criterion::Values { values, floor } => {
                values.get(index).is_some_and(|v| *v > *floor)
            }
        }
    }
}

/// Per-event AND of all criteria.
pub fn selection_mask(len: usize, criteria: &[Criterion]) -> Vec<bool> {
    (0..len)
        .map(|i| criteria.iter().all(|c| c.passes(i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_floor_disables() {
        assert_eq!(Criterion::new(0.0, None), Criterion::Disabled);
        assert_eq!(Criterion::new(0.0, Some(vec![1.0])), Criterion::Disabled);
        assert!(Criterion::Disabled.passes(10));
    }

    #[test]
    fn test_missing_data_fails() {
        let criterion = Criterion::new(20.0, None);
        assert_eq!(criterion, Criterion::Missing);
        assert!(!criterion.passes(0));
    }

    #[test]
    fn test_floor_is_strict() {
        let criterion = Criterion::new(20.0, Some(vec![19.9, 20.0, 20.1]));
        assert_eq!(
            (0..3).map(|i| criterion.passes(i)).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert!(!criterion.passes(3));
    }

    #[test]
    fn test_mask_combines() {
        let criteria = [
            Criterion::new(20.0, Some(vec![25.0, 25.0, 10.0])),
            Criterion::new(30.0, Some(vec![40.0, 20.0, 40.0])),
            Criterion::Disabled,
        ];
        assert_eq!(selection_mask(3, &criteria), vec![true, false, false]);
        assert_eq!(selection_mask(2, &[Criterion::Missing]), vec![false, false]);
        assert_eq!(selection_mask(2, &[]), vec![true, true]);
    }
}
