//! Deterministic id generation: a seeded RNG driving UUID generation, so a
//! fixed seed reproduces the same id sequence across runs (tests, replays).

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use uuid::Builder;

pub struct IdGenerator {
    rng: StdRng,
}

impl IdGenerator {
    pub fn new(seed: u64) -> Self {
        IdGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_id(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        Builder::from_random_bytes(bytes).into_uuid().to_string()
    }
}
