use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::domain::{Difficulty, JobRole, Question};

/// Select up to `count` questions for a role and difficulty.
///
/// Exact (role, difficulty) matches are preferred; when there are fewer
/// than `count`, the pool is relaxed to every question for the role,
/// regardless of difficulty. The role constraint is never relaxed. The
/// pool is uniformly shuffled with the caller's randomness source and
/// truncated to `count`.
///
/// A question id appears at most once in the result. When even the
/// relaxed pool is smaller than `count`, fewer questions are returned;
/// callers must treat an empty result as a setup error.
pub fn select_questions<R: Rng + ?Sized>(
    bank: &[Question],
    role: JobRole,
    difficulty: Difficulty,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let exact: Vec<&Question> = bank
        .iter()
        .filter(|q| q.job_role == role && q.difficulty == difficulty)
        .collect();

    let candidates: Vec<&Question> = if exact.len() >= count {
        exact
    } else {
        debug!(
            role = role.as_str(),
            difficulty = difficulty.as_str(),
            exact = exact.len(),
            requested = count,
            "Relaxing difficulty constraint"
        );
        bank.iter().filter(|q| q.job_role == role).collect()
    };

    let mut seen_ids = HashSet::new();
    let mut pool: Vec<Question> = candidates
        .into_iter()
        .filter(|q| seen_ids.insert(q.id.as_str()))
        .cloned()
        .collect();

    pool.shuffle(rng);
    pool.truncate(count);
    pool
}
