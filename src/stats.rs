//! Process-wide phoneme/biphoneme statistics, registered during ingestion
//! and frozen before the parallel stages begin (§5, §10 "Process-wide
//! state").

use crate::biphoneme::BiphonemeCollection;
use crate::phoneme::{PhonemeCollection, SyllabicPosition};

/// Mutable, append-only statistics context. Every `Syllable` registers its
/// phonemes and biphonemes here as it is constructed (§4.2).
pub struct StatsContext {
    phonemes: [PhonemeCollection; 3],
    biphonemes: [BiphonemeCollection; 3],
}

impl StatsContext {
    pub fn new() -> Self {
        StatsContext {
            phonemes: [
                PhonemeCollection::new(SyllabicPosition::Onset),
                PhonemeCollection::new(SyllabicPosition::Nucleus),
                PhonemeCollection::new(SyllabicPosition::Coda),
            ],
            biphonemes: [
                BiphonemeCollection::new(SyllabicPosition::Onset),
                BiphonemeCollection::new(SyllabicPosition::Nucleus),
                BiphonemeCollection::new(SyllabicPosition::Coda),
            ],
        }
    }

    fn slot(position: SyllabicPosition) -> usize {
        match position {
            SyllabicPosition::Onset => 0,
            SyllabicPosition::Nucleus => 1,
            SyllabicPosition::Coda => 2,
        }
    }

    pub fn phonemes_mut(&mut self, position: SyllabicPosition) -> &mut PhonemeCollection {
        &mut self.phonemes[Self::slot(position)]
    }

    pub fn biphonemes_mut(&mut self, position: SyllabicPosition) -> &mut BiphonemeCollection {
        &mut self.biphonemes[Self::slot(position)]
    }

    /// Registers the phonemes and within-substring biphonemes of a single
    /// syllabic-part substring (one of onset/nucleus/coda), per §4.2.
    pub fn register_part(&mut self, position: SyllabicPosition, part: &[char], amount: f64) {
        let len = part.len();
        for (i, &symbol) in part.iter().enumerate() {
            self.phonemes_mut(position).register(symbol, amount, i, len);
        }
        let biphonemes = self.biphonemes_mut(position);
        for i in 0..len {
            for j in (i + 1)..len {
                biphonemes.register(part[i], part[j], amount);
            }
        }
    }

    pub fn freeze(self) -> FrozenStats {
        FrozenStats {
            phonemes: self.phonemes,
            biphonemes: self.biphonemes,
        }
    }
}

impl Default for StatsContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of the statistics, safe to share across worker threads
/// without locking once ingestion has completed.
pub struct FrozenStats {
    phonemes: [PhonemeCollection; 3],
    biphonemes: [BiphonemeCollection; 3],
}

impl FrozenStats {
    pub fn phonemes(&self, position: SyllabicPosition) -> &PhonemeCollection {
        &self.phonemes[StatsContext::slot(position)]
    }

    pub fn biphonemes(&self, position: SyllabicPosition) -> &BiphonemeCollection {
        &self.biphonemes[StatsContext::slot(position)]
    }

    pub fn biphonemes_mut(&mut self, position: SyllabicPosition) -> &mut BiphonemeCollection {
        &mut self.biphonemes[StatsContext::slot(position)]
    }

    /// The three per-position biphoneme collections as independent mutable
    /// borrows, in [`SyllabicPosition::ALL`] order, so the phoneme-order
    /// optimizer can refine onset/nucleus/coda concurrently (§4.3, §5 #1).
    pub fn biphonemes_triplet_mut(&mut self) -> [&mut BiphonemeCollection; 3] {
        let [a, b, c] = &mut self.biphonemes;
        [a, b, c]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_part_builds_phonemes_and_biphonemes() {
        let mut ctx = StatsContext::new();
        ctx.register_part(SyllabicPosition::Onset, &['t', 'r'], 2.0);
        let frozen = ctx.freeze();
        assert_eq!(frozen.phonemes(SyllabicPosition::Onset).frequency('t'), 2.0);
        assert_eq!(frozen.biphonemes(SyllabicPosition::Onset).frequency('t', 'r'), 2.0);
    }
}
