//! Greedy homophone disambiguator (§4.9): selects the smallest set of
//! morphological features that separates words sharing a chord sequence
//! and a lemma.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::lexicon::Dictionary;
use crate::theory::Theory;

pub const NO_FEATURE: &str = "nofeature";

/// One `(theory-key, lemme_gram_cat)` group: its distinct orthographs,
/// each with the word indices that share it.
struct Group {
    orthographs: Vec<(String, Vec<usize>)>,
}

fn build_groups(theory: &Theory, dictionary: &Dictionary) -> Vec<Group> {
    let mut groups = Vec::new();
    for indices in theory.groups.values() {
        let mut by_lemma: HashMap<String, Vec<usize>> = HashMap::new();
        for &i in indices {
            if let Some(word) = dictionary.get(i) {
                by_lemma.entry(word.lemme_gram_cat()).or_default().push(i);
            }
        }
        for word_indices in by_lemma.into_values() {
            let mut by_ortho: HashMap<String, Vec<usize>> = HashMap::new();
            for i in word_indices {
                if let Some(word) = dictionary.get(i) {
                    by_ortho.entry(word.ortho.clone()).or_default().push(i);
                }
            }
            let mut orthographs: Vec<(String, Vec<usize>)> = by_ortho.into_iter().collect();
            orthographs.sort_by(|a, b| a.0.cmp(&b.0));
            groups.push(Group { orthographs });
        }
    }
    groups
}

/// Phase 1 + phase 2: produces the full feature ordering (§4.9 "the
/// output is the ordering, not a cutoff").
fn rank_features(groups: &[Group], word_features: &HashMap<usize, HashSet<String>>) -> Vec<String> {
    let mut all_features: BTreeSet<String> = BTreeSet::new();
    for features in word_features.values() {
        all_features.extend(features.iter().cloned());
    }

    let mut undiscriminated: Vec<HashSet<String>> = groups
        .iter()
        .map(|g| g.orthographs.iter().map(|(o, _)| o.clone()).collect())
        .collect();

    let has_feature = |word: usize, feature: &str| {
        word_features.get(&word).map(|f| f.contains(feature)).unwrap_or(false)
    };

    let mut selected = Vec::new();
    let mut remaining = all_features;

    loop {
        let mut best: Option<(String, i64, i64)> = None;
        for feature in &remaining {
            let mut score = 0i64;
            let mut tie = 0i64;
            for (gi, group) in groups.iter().enumerate() {
                let undisc = &undiscriminated[gi];
                if undisc.len() <= 1 {
                    continue;
                }
                let owners: Vec<&(String, Vec<usize>)> = group
                    .orthographs
                    .iter()
                    .filter(|(o, _)| undisc.contains(o))
                    .filter(|(_, idxs)| idxs.iter().any(|&i| has_feature(i, feature)))
                    .collect();
                if owners.len() == 1 {
                    let words_here = owners[0].1.len() as i64;
                    let total_undisc_words: i64 = group
                        .orthographs
                        .iter()
                        .filter(|(o, _)| undisc.contains(o))
                        .map(|(_, idxs)| idxs.len() as i64)
                        .sum();
                    score += words_here;
                    tie += total_undisc_words - words_here;
                }
            }
            let better = match &best {
                None => true,
                Some((bf, bs, bt)) => {
                    score > *bs || (score == *bs && tie > *bt) || (score == *bs && tie == *bt && feature < bf)
                }
            };
            if better {
                best = Some((feature.clone(), score, tie));
            }
        }

        let Some((feature, score, _)) = best else { break };
        if score == 0 {
            selected.extend(remaining);
            break;
        }

        for (gi, group) in groups.iter().enumerate() {
            let undisc = &mut undiscriminated[gi];
            if undisc.len() <= 1 {
                continue;
            }
            let owner = group
                .orthographs
                .iter()
                .find(|(o, idxs)| undisc.contains(o) && idxs.iter().any(|&i| has_feature(i, &feature)))
                .map(|(o, _)| o.clone());
            if let Some(ortho) = owner {
                let owners_count = group
                    .orthographs
                    .iter()
                    .filter(|(o, _)| undisc.contains(o))
                    .filter(|(_, idxs)| idxs.iter().any(|&i| has_feature(i, &feature)))
                    .count();
                if owners_count == 1 {
                    undisc.remove(&ortho);
                }
            }
        }
        remaining.remove(&feature);
        selected.push(feature);
    }

    selected
}

/// Phase 3: walks `selected` per group, accumulating a feature tuple
/// until each orthograph's joint signature over the accumulated features
/// is unique within the group; unresolved orthographs fall back to
/// [`NO_FEATURE`].
fn assign_groups(
    groups: &[Group],
    selected: &[String],
    word_features: &HashMap<usize, HashSet<String>>,
) -> HashMap<Vec<String>, Vec<Vec<String>>> {
    let has_feature = |word: usize, feature: &str| {
        word_features.get(&word).map(|f| f.contains(feature)).unwrap_or(false)
    };

    let mut featureset_words: HashMap<Vec<String>, Vec<Vec<String>>> = HashMap::new();

    for group in groups {
        if group.orthographs.len() <= 1 {
            let orthos: Vec<String> = group.orthographs.iter().map(|(o, _)| o.clone()).collect();
            featureset_words.entry(vec![]).or_default().push(orthos);
            continue;
        }

        let mut remaining: Vec<&(String, Vec<usize>)> = group.orthographs.iter().collect();
        let mut used = Vec::new();

        for feature in selected {
            if remaining.len() <= 1 {
                break;
            }
            used.push(feature.clone());
            let mut signatures: HashMap<Vec<bool>, Vec<&(String, Vec<usize>)>> = HashMap::new();
            for entry in &remaining {
                let (_, idxs) = entry;
                let signature: Vec<bool> = used.iter().map(|f| idxs.iter().any(|&i| has_feature(i, f))).collect();
                signatures.entry(signature).or_default().push(entry);
            }
            let mut still_remaining = Vec::new();
            for (_, members) in signatures {
                if members.len() == 1 {
                    let ortho = members[0].0.clone();
                    featureset_words.entry(used.clone()).or_default().push(vec![ortho]);
                } else {
                    still_remaining.extend(members);
                }
            }
            remaining = still_remaining;
        }

        if !remaining.is_empty() {
            let orthos: Vec<String> = remaining.iter().map(|(o, _)| o.clone()).collect();
            featureset_words.entry(vec![NO_FEATURE.to_owned()]).or_default().push(orthos);
        }
    }

    featureset_words
}

#[derive(Debug, Default)]
pub struct Disambiguation {
    pub selected_features: Vec<String>,
    /// Feature tuple -> list of orthograph groups resolved by exactly
    /// that tuple, sorted by descending group size (§4.9 Phase 3).
    pub featureset_words: Vec<(Vec<String>, Vec<Vec<String>>)>,
}

/// Runs the full three-phase disambiguator over every homophone group in
/// `theory`.
pub fn disambiguate(theory: &Theory, dictionary: &Dictionary) -> Disambiguation {
    let groups = build_groups(theory, dictionary);
    let mut word_features: HashMap<usize, HashSet<String>> = HashMap::new();
    for group in &groups {
        for (_, idxs) in &group.orthographs {
            for &i in idxs {
                if let Some(word) = dictionary.get(i) {
                    word_features.insert(i, word.features().into_iter().collect());
                }
            }
        }
    }

    let selected = rank_features(&groups, &word_features);
    let mut featureset_words: Vec<(Vec<String>, Vec<Vec<String>>)> =
        assign_groups(&groups, &selected, &word_features).into_iter().collect();
    featureset_words.sort_by(|a, b| {
        let size_a: usize = a.1.iter().map(|v| v.len()).sum();
        let size_b: usize = b.1.iter().map(|v| v.len()).sum();
        size_b.cmp(&size_a).then_with(|| a.0.cmp(&b.0))
    });

    Disambiguation {
        selected_features: selected,
        featureset_words,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexicon::word::{GramCat, Word};

    fn make_word(ortho: &str, gender: Option<crate::lexicon::word::Gender>, number: Option<crate::lexicon::word::Number>) -> Word {
        Word {
            ortho: ortho.to_owned(),
            phonology: "fE".to_owned(),
            lemma: "faire".to_owned(),
            gram_cat: GramCat::Ver,
            cgram_ortho: vec!["VER".to_owned()],
            gender,
            number,
            conjugations: vec![],
            syll_cv: vec![],
            orthosyll_cv: vec![],
            freq_books: 1.0,
            freq_films: 1.0,
        }
    }

    #[test]
    fn a_group_of_one_word_gets_the_empty_feature_tuple() {
        let mut dictionary = Dictionary::new();
        let idx = dictionary.push(make_word("fait", None, None));
        let mut theory = Theory::default();
        theory.groups.insert(vec![vec![0]], vec![idx]);

        let result = disambiguate(&theory, &dictionary);
        let lone = result
            .featureset_words
            .iter()
            .find(|(features, _)| features.is_empty())
            .expect("lone word resolved with empty feature tuple");
        assert_eq!(lone.1[0], vec!["fait".to_owned()]);
    }

    #[test]
    fn a_single_discriminating_feature_separates_gendered_homophones() {
        use crate::lexicon::word::{Gender, Number};
        let mut dictionary = Dictionary::new();
        let idx_m = dictionary.push(make_word("fait", Some(Gender::Masculine), Some(Number::Singular)));
        let idx_f = dictionary.push(make_word("faite", Some(Gender::Feminine), Some(Number::Singular)));
        let mut theory = Theory::default();
        theory.groups.insert(vec![vec![0]], vec![idx_m, idx_f]);

        let result = disambiguate(&theory, &dictionary);
        let total_words: usize = result.featureset_words.iter().map(|(_, v)| v.iter().map(|w| w.len()).sum::<usize>()).sum();
        assert_eq!(total_words, 2);
        assert!(result
            .featureset_words
            .iter()
            .any(|(features, _)| features.iter().any(|f| f.contains('f') || f.contains('m'))));
    }
}
