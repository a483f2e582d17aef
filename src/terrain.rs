use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::Grid;
use crate::rng::RandomSource;

/// Sensor alphabet: what a cell looks like from inside it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    #[default]
    Sand,
    Grass,
}

impl Terrain {
    pub const ALL: [Terrain; 2] = [Terrain::Sand, Terrain::Grass];

    /// A label other than `self`, uniform over the rest of the alphabet.
    /// With two labels this is always the opposite one and draws nothing.
    pub fn other<R: RandomSource>(self, rng: &mut R) -> Terrain {
        let rest: Vec<Terrain> = Self::ALL.into_iter().filter(|&t| t != self).collect();
        if rest.len() == 1 {
            rest[0]
        } else {
            rest[rng.range_usize(rest.len())]
        }
    }
}

/// Labelled environment plus the rank permutation it was derived from.
/// Cells ranked below `density` are sand; relabelling keeps the ranking.
#[derive(Clone, Debug)]
pub struct Environment {
    pub labels: Grid<Terrain>,
    pub density: usize,
    ranking: Arc<[usize]>,
}

impl Environment {
    /// Wrap hand-authored labels. Sand cells take the lowest ranks in
    /// row-major order, so the label-from-rank rule still holds.
    pub fn from_labels(labels: Grid<Terrain>) -> Environment {
        let density = labels.data.iter().filter(|&&l| l == Terrain::Sand).count();
        let mut ranking = vec![0; labels.data.len()];
        let (mut sand, mut grass) = (0, density);
        for (rank, &l) in ranking.iter_mut().zip(&labels.data) {
            let next = if l == Terrain::Sand { &mut sand } else { &mut grass };
            *rank = *next;
            *next += 1;
        }
        Environment {
            labels,
            density,
            ranking: ranking.into(),
        }
    }

    /// Rank of each cell (row-major), a permutation of `0..position_count`.
    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    /// True when both environments descend from the same shuffle.
    pub fn shares_ranking(&self, other: &Environment) -> bool {
        Arc::ptr_eq(&self.ranking, &other.ranking)
    }

    #[inline]
    pub fn label(&self, x: i64, y: i64) -> Terrain {
        self.labels.get(x, y)
    }

    /// Same lineage, new threshold.
    pub fn with_density(&self, density: usize) -> Environment {
        label(self.labels.w, self.labels.h, density, Arc::clone(&self.ranking))
    }
}

/// Build an environment at `density`.
///
/// With `previous`, its ranking and dimensions are reused verbatim and `w`/`h`
/// are ignored. Otherwise a fresh ranking is shuffled from `rng`.
pub fn generate<R: RandomSource>(
    previous: Option<&Environment>,
    w: usize,
    h: usize,
    density: usize,
    rng: &mut R,
) -> Environment {
    match previous {
        Some(prev) => prev.with_density(density),
        None => label(w, h, density, shuffled_ranking(w * h, rng)),
    }
}

/// Unbiased Fisher-Yates permutation of `0..n`.
fn shuffled_ranking<R: RandomSource>(n: usize, rng: &mut R) -> Arc<[usize]> {
    let mut ranking: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.range_usize(i + 1);
        ranking.swap(i, j);
    }
    ranking.into()
}

fn label(w: usize, h: usize, density: usize, ranking: Arc<[usize]>) -> Environment {
    let data = ranking
        .iter()
        .map(|&rank| {
            if rank < density {
                Terrain::Sand
            } else {
                Terrain::Grass
            }
        })
        .collect();
    let labels = Grid { data, w, h };
    debug!(w, h, density, "labelled environment");
    Environment {
        labels,
        density,
        ranking,
    }
}
