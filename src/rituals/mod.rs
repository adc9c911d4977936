//! Glyph evolution rituals.
//!
//! [`evolve_glyphs`] copies a sigil into a new one, perturbing each vector with
//! small Gaussian noise and extending its lineage. [`dream_loop`] is the
//! canned `default → evolved` run, seeding `default` first when it is empty.

pub mod refine;

use std::time::Instant;

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::Serialize;

use crate::error::AlchemyResult;
use crate::glyph::Glyph;
use crate::vault::VaultStore;

/// Standard deviation of the per-component mutation noise.
pub const MUTATION_SIGMA: f64 = 0.05;

/// Suffix appended to the name of every evolved glyph.
pub const EVOLVED_SUFFIX: &str = "_🧬";

pub const DREAM_SOURCE: &str = "default";
pub const DREAM_TARGET: &str = "evolved";
const SEED_GLYPHS: usize = 3;
const SEED_DIMS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct Mutation {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvolveReport {
    pub source: String,
    pub target: String,
    pub evolved: usize,
    pub mutations: Vec<Mutation>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlyphName {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DreamLoopReport {
    pub status: &'static str,
    pub evolved_glyphs: usize,
    pub iterations: u32,
    pub lineage_depth: u32,
    /// True when `default` had to be seeded before evolving.
    pub seeded: bool,
    pub new_glyphs: Vec<GlyphName>,
}

/// Add independent N(0, 0.05²) noise to every component.
pub fn mutate_vector<R: Rng + ?Sized>(vector: &[f64], rng: &mut R) -> Vec<f64> {
    vector
        .iter()
        .map(|v| {
            let z: f64 = StandardNormal.sample(rng);
            v + MUTATION_SIGMA * z
        })
        .collect()
}

/// Derive the next-generation glyph from `parent`.
pub fn evolve_glyph<R: Rng + ?Sized>(parent: &Glyph, rng: &mut R, now: f64) -> Glyph {
    let mut child = Glyph::new(
        format!("{}{EVOLVED_SUFFIX}", parent.name),
        mutate_vector(&parent.vector, rng),
    );
    child.timestamp = Some(now);
    child.lineage_depth = Some(parent.lineage_depth.unwrap_or(0) + 1);
    child.with_hash()
}

/// Evolve every glyph of `source` into `target`.
pub fn evolve_glyphs<R: Rng + ?Sized>(
    store: &VaultStore,
    source: &str,
    target: &str,
    rng: &mut R,
) -> AlchemyResult<EvolveReport> {
    let started = Instant::now();
    tracing::info!(source, sigil = target, "evolving glyphs");

    let glyphs = store.restore(source)?;
    let now = unix_now();

    let mut evolved = Vec::with_capacity(glyphs.len());
    let mut mutations = Vec::with_capacity(glyphs.len());
    for glyph in &glyphs {
        let child = evolve_glyph(glyph, rng, now);
        tracing::debug!(from = %glyph.name, to = %child.name, "mutated glyph");
        mutations.push(Mutation {
            from: glyph.name.clone(),
            to: child.name.clone(),
        });
        evolved.push(child);
    }

    store.preserve(target, &evolved)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(sigil = target, count = evolved.len(), elapsed_ms, "ritual complete");

    Ok(EvolveReport {
        source: source.to_string(),
        target: target.to_string(),
        evolved: evolved.len(),
        mutations,
        elapsed_ms,
    })
}

/// Seed glyphs used when the dream loop finds nothing to evolve.
pub fn seed_glyphs<R: Rng + ?Sized>(rng: &mut R) -> Vec<Glyph> {
    (0..SEED_GLYPHS)
        .map(|i| {
            let vector: Vec<f64> = (0..SEED_DIMS).map(|_| StandardNormal.sample(rng)).collect();
            Glyph::new(format!("seed_glyph_{i}"), vector).with_hash()
        })
        .collect()
}

/// Evolve `default` into `evolved`, seeding `default` if it is missing or empty.
pub fn dream_loop<R: Rng + ?Sized>(store: &VaultStore, rng: &mut R) -> AlchemyResult<DreamLoopReport> {
    let existing = store.restore_or_empty(DREAM_SOURCE)?;
    let seeded = existing.is_empty();
    if seeded {
        tracing::info!(sigil = DREAM_SOURCE, "no glyphs to dream on, seeding");
        store.preserve(DREAM_SOURCE, &seed_glyphs(rng))?;
    }

    evolve_glyphs(store, DREAM_SOURCE, DREAM_TARGET, rng)?;
    let evolved = store.restore(DREAM_TARGET)?;

    Ok(DreamLoopReport {
        status: "success",
        evolved_glyphs: evolved.len(),
        iterations: 1,
        lineage_depth: 1,
        seeded,
        new_glyphs: evolved
            .into_iter()
            .map(|g| GlyphName { name: g.name })
            .collect(),
    })
}

pub(crate) fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store() -> (tempfile::TempDir, VaultStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = VaultStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn mutation_noise_statistics() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = mutate_vector(&vec![0.0; 20_000], &mut rng);
        let mean = noise.iter().sum::<f64>() / noise.len() as f64;
        let var = noise.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / noise.len() as f64;
        assert!(mean.abs() < 0.005, "mean was {mean}");
        assert!((var.sqrt() - MUTATION_SIGMA).abs() < 0.005, "std was {}", var.sqrt());
    }

    #[test]
    fn mutation_stays_close() {
        let mut rng = StdRng::seed_from_u64(1);
        let original = vec![1.0; 32];
        let mutated = mutate_vector(&original, &mut rng);
        assert_eq!(mutated.len(), 32);
        assert_ne!(mutated, original);
        // 0.5 is ten sigma away
        assert!(mutated.iter().all(|v| (v - 1.0).abs() < 0.5));
    }

    #[test]
    fn evolve_extends_lineage() {
        let (_dir, store) = store();
        let mut parent = Glyph::new("spark", vec![0.0, 1.0]);
        parent.lineage_depth = Some(2);
        store.preserve("src", &[parent, Glyph::new("ember", vec![1.0, 0.0])]).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let report = evolve_glyphs(&store, "src", "dst", &mut rng).unwrap();
        assert_eq!(report.evolved, 2);
        assert_eq!(report.mutations[0].to, "spark_🧬");

        let evolved = store.restore("dst").unwrap();
        assert_eq!(evolved[0].lineage_depth, Some(3));
        assert_eq!(evolved[1].lineage_depth, Some(1));
        assert!(evolved.iter().all(|g| g.timestamp.is_some() && g.hash.is_some()));
    }

    #[test]
    fn dream_loop_seeds_empty_vault() {
        let (_dir, store) = store();
        let mut rng = StdRng::seed_from_u64(11);

        let report = dream_loop(&store, &mut rng).unwrap();
        assert!(report.seeded);
        assert_eq!(report.evolved_glyphs, 3);
        assert_eq!(report.new_glyphs[0].name, "seed_glyph_0_🧬");
        assert_eq!(store.restore(DREAM_SOURCE).unwrap()[0].dims(), 10);

        let again = dream_loop(&store, &mut rng).unwrap();
        assert!(!again.seeded);
    }
}
