use std::collections::VecDeque;

use rand::RngCore;

/// An RNG that replays a prepared sequence of uniform draws.
///
/// Each queued value `f` in [0,1) is encoded so that `random::<f64>()`
/// returns it: the standard uniform f64 takes the top 53 bits of
/// `next_u64`.
pub struct ScriptedRng {
    draws: VecDeque<u64>,
}

impl ScriptedRng {
    pub fn from_uniform(draws: &[f64]) -> ScriptedRng {
        ScriptedRng {
            draws: draws
                .iter()
                .map(|&f| ((f * (1u64 << 53) as f64) as u64) << 11)
                .collect(),
        }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.draws
            .pop_front()
            .expect("the scripted draw sequence is exhausted")
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn replays_the_prepared_uniform_draws() {
        let mut rng = ScriptedRng::from_uniform(&[0.3, 0.5, 0.999]);
        assert!((rng.random::<f64>() - 0.3).abs() < 1e-12);
        assert!((rng.random::<f64>() - 0.5).abs() < 1e-12);
        assert!((rng.random::<f64>() - 0.999).abs() < 1e-12);
    }
}
