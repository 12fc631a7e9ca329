//! Ordered phoneme-pair co-occurrence statistics and the order-matrix
//! derived from the phoneme-order optimizer (§4.3).

use indexmap::IndexMap;

use crate::phoneme::SyllabicPosition;

/// The relative order of two phonemes implied by the optimized permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Less,
    Greater,
    Equal,
}

#[derive(Debug, Clone)]
pub struct Biphoneme {
    pub pair: (char, char),
    pub frequency: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BiphonemeCollection {
    position: Option<SyllabicPosition>,
    pairs: IndexMap<(char, char), Biphoneme>,
    pub best_permutation: String,
    pub best_permutation_score: f64,
    pub pairwise_order: IndexMap<(char, char), Order>,
    pub pairwise_order_score: IndexMap<(char, char), f64>,
}

impl BiphonemeCollection {
    pub fn new(position: SyllabicPosition) -> Self {
        BiphonemeCollection {
            position: Some(position),
            pairs: IndexMap::new(),
            best_permutation: String::new(),
            best_permutation_score: 0.0,
            pairwise_order: IndexMap::new(),
            pairwise_order_score: IndexMap::new(),
        }
    }

    pub fn position(&self) -> Option<SyllabicPosition> {
        self.position
    }

    pub fn register(&mut self, a: char, b: char, amount: f64) {
        self.pairs
            .entry((a, b))
            .or_insert_with(|| Biphoneme {
                pair: (a, b),
                frequency: 0.0,
            })
            .frequency += amount;
    }

    pub fn frequency(&self, a: char, b: char) -> f64 {
        self.pairs.get(&(a, b)).map(|bp| bp.frequency).unwrap_or(0.0)
    }

    /// Inserts a fully-formed [`Biphoneme`] record directly, for snapshot
    /// restoration (§5 "Persistence").
    pub fn insert_raw(&mut self, biphoneme: Biphoneme) {
        self.pairs.insert(biphoneme.pair, biphoneme);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Biphoneme> {
        self.pairs.values()
    }

    /// The order score for an ordered pair `(a, b)` using the
    /// `pairwise_order_score` matrix, falling back to 0.0 when the pair was
    /// never observed together.
    pub fn order_score(&self, a: char, b: char) -> f64 {
        if a == b {
            return 0.0;
        }
        if let Some(score) = self.pairwise_order_score.get(&(a, b)) {
            return *score;
        }
        if let Some(score) = self.pairwise_order_score.get(&(b, a)) {
            return -*score;
        }
        0.0
    }

    pub fn order(&self, a: char, b: char) -> Order {
        if a == b {
            return Order::Equal;
        }
        if let Some(order) = self.pairwise_order.get(&(a, b)) {
            return *order;
        }
        if let Some(order) = self.pairwise_order.get(&(b, a)) {
            return match order {
                Order::Less => Order::Greater,
                Order::Greater => Order::Less,
                Order::Equal => Order::Equal,
            };
        }
        Order::Equal
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_accumulates() {
        let mut col = BiphonemeCollection::new(SyllabicPosition::Onset);
        col.register('t', 'r', 4.0);
        col.register('t', 'r', 1.0);
        assert_eq!(col.frequency('t', 'r'), 5.0);
        assert_eq!(col.frequency('r', 't'), 0.0);
    }

    #[test]
    fn order_score_is_antisymmetric_and_zero_for_equal_symbols() {
        let mut col = BiphonemeCollection::new(SyllabicPosition::Onset);
        col.pairwise_order_score.insert(('a', 'b'), 3.0);
        assert_eq!(col.order_score('a', 'b'), 3.0);
        assert_eq!(col.order_score('b', 'a'), -3.0);
        assert_eq!(col.order_score('a', 'a'), 0.0);
    }
}
