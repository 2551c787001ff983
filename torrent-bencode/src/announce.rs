use rand::Rng;

/// Flattens tiered trackers, shuffling each tier on its own (BEP-12).
///
/// Tiers keep their relative order; the trackers inside a tier come out in a
/// uniformly random order drawn from `rng`.
pub fn randomize_announce_list<R: Rng + ?Sized>(tiers: &[Vec<String>], rng: &mut R) -> Vec<String> {
    let mut randomized = Vec::with_capacity(tiers.iter().map(Vec::len).sum());
    for tier in tiers {
        let mut remaining = tier.clone();
        while !remaining.is_empty() {
            let index = rng.random_range(0..remaining.len());
            randomized.push(remaining.remove(index));
        }
    }
    randomized
}
