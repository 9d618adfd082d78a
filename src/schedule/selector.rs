use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use crate::error::{RosterError, RosterResult};

/// Outcome of a selection: the winner plus how many were tied with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<T> {
    pub winner: T,
    pub priority: i64,
    pub tied: usize,
}

/// Picks uniformly at random among the candidates with the lowest priority
pub fn select<T, R>(date: NaiveDate, candidates: &[(T, i64)], rng: &mut R) -> RosterResult<Selection<T>>
where
    T: Copy,
    R: Rng + ?Sized,
{
    let min_priority = candidates
        .iter()
        .map(|(_, p)| *p)
        .min()
        .ok_or(RosterError::EmptyCandidateSet { date })?;

    let tied: Vec<T> = candidates
        .iter()
        .filter(|(_, p)| *p == min_priority)
        .map(|(c, _)| *c)
        .collect();

    let winner = *tied.choose(rng).ok_or(RosterError::EmptyCandidateSet { date })?;

    Ok(Selection {
        winner,
        priority: min_priority,
        tied: tied.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_empty_candidates() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = select::<usize, _>(day(), &[], &mut rng);
        assert!(matches!(result, Err(RosterError::EmptyCandidateSet { .. })));
    }

    #[test]
    fn test_unique_minimum_wins() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let selection = select(day(), &[(0usize, 5), (1, 2), (2, 9)], &mut rng).unwrap();
        assert_eq!(selection.winner, 1);
        assert_eq!(selection.priority, 2);
        assert_eq!(selection.tied, 1);
    }

    #[test]
    fn test_same_seed_same_winner() {
        let candidates = [(0usize, 1), (1, 1), (2, 1), (3, 4)];
        let a = select(day(), &candidates, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = select(day(), &candidates, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.tied, 3);
        assert_ne!(a.winner, 3);
    }

    #[test]
    fn test_tie_break_is_roughly_uniform() {
        let candidates = [(0usize, 3), (1, 3), (2, 3), (3, 3)];
        let mut counts = [0usize; 4];
        let trials = 4000;
        for seed in 0..trials {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let selection = select(day(), &candidates, &mut rng).unwrap();
            counts[selection.winner] += 1;
        }
        // expected 1000 each
        for count in counts {
            assert!((800..=1200).contains(&count), "skewed counts: {:?}", counts);
        }
    }
}
