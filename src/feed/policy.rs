use rand::seq::SliceRandom;

/// Decides which of the eligible unseen problems to serve next.
///
/// Kept deliberately narrow (candidate ids in, picked ids out) so the random
/// placeholder can be swapped for a ranked/personalized strategy without
/// touching the interaction bookkeeping around it.
pub trait SelectionPolicy: Send + Sync {
    fn pick(&self, candidates: &[i64], limit: usize) -> Vec<i64>;
}

/// Uniform random sample of the candidates. No personalization.
pub struct RandomPolicy;

impl SelectionPolicy for RandomPolicy {
    fn pick(&self, candidates: &[i64], limit: usize) -> Vec<i64> {
        let mut rng = rand::thread_rng();
        candidates
            .choose_multiple(&mut rng, limit)
            .copied()
            .collect()
    }
}
