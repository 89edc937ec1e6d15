use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::data::{CandidateFile, FileList};

/// Draw `min(requested, files.len())` distinct files in random order.
pub fn sample_without_replacement<R: Rng + ?Sized>(
    files: &FileList,
    requested: usize,
    rng: &mut R,
) -> Vec<CandidateFile> {
    let mut pool: Vec<CandidateFile> = files.files().to_vec();
    pool.shuffle(rng);
    pool.truncate(requested.min(files.len()));
    pool
}

/// Session RNG: reproducible when `seed` is set, OS-seeded otherwise.
pub fn session_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
