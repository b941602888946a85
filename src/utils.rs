/// A default seed for seeded RNGs.
pub const DEFAULT_SEED: u64 = 0x123456789abcdef;
