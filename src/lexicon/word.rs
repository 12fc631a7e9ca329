//! Lexicon word records: parsing, identity, and morphological feature
//! enumeration (§4.1, §3 "Word").

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::LexiconError;

/// Grammatical category, following the Lexique `cgram` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GramCat {
    Adj,
    AdjDem,
    AdjInd,
    AdjInt,
    AdjNum,
    AdjPos,
    Adv,
    ArtDef,
    ArtInd,
    Aux,
    Con,
    Liaison,
    Nom,
    Ono,
    Prep,
    ProDem,
    ProInd,
    ProInt,
    ProPer,
    ProPos,
    ProRel,
    Ver,
}

impl GramCat {
    pub fn parse(value: &str) -> Option<GramCat> {
        use GramCat::*;
        Some(match value {
            "ADJ" => Adj,
            "ADJ:dem" => AdjDem,
            "ADJ:ind" => AdjInd,
            "ADJ:int" => AdjInt,
            "ADJ:num" => AdjNum,
            "ADJ:pos" => AdjPos,
            "ADV" => Adv,
            "ART:def" => ArtDef,
            "ART:ind" => ArtInd,
            "AUX" => Aux,
            "CON" => Con,
            "LIA" => Liaison,
            "NOM" => Nom,
            "ONO" => Ono,
            "PRE" => Prep,
            "PRO:dem" => ProDem,
            "PRO:ind" => ProInd,
            "PRO:int" => ProInt,
            "PRO:per" => ProPer,
            "PRO:pos" => ProPos,
            "PRO:rel" => ProRel,
            "VER" => Ver,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        use GramCat::*;
        match self {
            Adj => "ADJ",
            AdjDem => "ADJ:dem",
            AdjInd => "ADJ:ind",
            AdjInt => "ADJ:int",
            AdjNum => "ADJ:num",
            AdjPos => "ADJ:pos",
            Adv => "ADV",
            ArtDef => "ART:def",
            ArtInd => "ART:ind",
            Aux => "AUX",
            Con => "CON",
            Liaison => "LIA",
            Nom => "NOM",
            Ono => "ONO",
            Prep => "PRE",
            ProDem => "PRO:dem",
            ProInd => "PRO:ind",
            ProInt => "PRO:int",
            ProPer => "PRO:per",
            ProPos => "PRO:pos",
            ProRel => "PRO:rel",
            Ver => "VER",
        }
    }

    pub fn is_verb(self) -> bool {
        matches!(self, GramCat::Ver)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Masculine,
    Feminine,
}

impl Gender {
    pub fn parse(value: &str) -> Option<Gender> {
        match value {
            "m" => Some(Gender::Masculine),
            "f" => Some(Gender::Feminine),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Masculine => "m",
            Gender::Feminine => "f",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Number {
    Singular,
    Plural,
}

impl Number {
    pub fn parse(value: &str) -> Option<Number> {
        match value {
            "s" => Some(Number::Singular),
            "p" => Some(Number::Plural),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Number::Singular => "s",
            Number::Plural => "p",
        }
    }
}

/// One parsed `mood:tense:persNum` segment of `infoVerb`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConjugationTuple(pub Vec<String>);

impl ConjugationTuple {
    /// Every non-empty subset (in input order, joined by `:`), the
    /// conjugation feature set of §4.1/§3 "getFeatures".
    pub fn powerset(&self) -> Vec<String> {
        let n = self.0.len();
        let mut out = Vec::with_capacity((1usize << n).saturating_sub(1));
        for mask in 1..(1u32 << n) {
            let parts: Vec<&str> = (0..n)
                .filter(|i| mask & (1 << i) != 0)
                .map(|i| self.0[i].as_str())
                .collect();
            out.push(parts.join(":"));
        }
        out
    }
}

fn mood_token(code: &str) -> Option<&'static str> {
    Some(match code {
        "ind" => "indicatif",
        "imp" => "impératif",
        "sub" => "subjonctif",
        "par" => "participe",
        "cnd" => "conditionnel",
        "inf" => "infinitif",
        _ => return None,
    })
}

fn tense_token(code: &str) -> Option<&'static str> {
    Some(match code {
        "pre" => "présent",
        "pas" => "passé",
        "imp" => "imparfait",
        "fut" => "future",
        _ => return None,
    })
}

/// Parses one semicolon-separated `infoVerb` record into its conjugation
/// tuples (§4.1 "Conjugation parsing").
pub fn parse_info_verb(info_verb: &str) -> Vec<ConjugationTuple> {
    info_verb
        .split(';')
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| {
            let mut fields = segment.split(':');
            let mood_code = fields.next()?;
            let mood = mood_token(mood_code)?;
            if mood_code == "inf" {
                return Some(ConjugationTuple(vec![mood.to_owned()]));
            }
            let tense_code = fields.next()?;
            let tense = tense_token(tense_code)?;
            if mood_code == "par" {
                return Some(ConjugationTuple(vec![mood.to_owned(), tense.to_owned()]));
            }
            let mut tuple = vec![mood.to_owned(), tense.to_owned()];
            if let Some(pers_num) = fields.next() {
                let mut chars = pers_num.chars();
                if let Some(person) = chars.next() {
                    tuple.push(format!("pers_{person}"));
                }
                if let Some(number) = chars.next() {
                    let nbr = match number {
                        's' => "nbr_s",
                        'p' => "nbr_p",
                        _ => return Some(ConjugationTuple(tuple)),
                    };
                    tuple.push(nbr.to_owned());
                }
            }
            Some(ConjugationTuple(tuple))
        })
        .collect()
}

/// Recursively merges `@|n_` → `@|` and `e|n_` → `en|` until neither
/// pattern remains (or the safety cap is hit), per §4.1 "nasal-fix
/// rewrite".
pub fn fix_e_n_en(input: &str) -> String {
    let mut s = input.to_owned();
    for _ in 0..10 {
        if s.contains("@|n_") {
            s = s.replace("@|n_", "@|");
        } else if s.contains("e|n_") {
            s = s.replace("e|n_", "en|");
        } else {
            break;
        }
    }
    s
}

/// Splits a `s1p1_s1p2|s2p1_…`-shaped raw field into syllables of tokens,
/// after applying the nasal-fix rewrite.
pub fn split_syllabified(raw: &str) -> Vec<Vec<String>> {
    let fixed = fix_e_n_en(raw);
    fixed
        .split('|')
        .map(|syllable| syllable.split('_').map(|s| s.to_owned()).collect())
        .collect()
}

/// Same as [`split_syllabified`] but parses each token as a single
/// phoneme `char` (used for `syll_cv`, as opposed to `orthosyll_cv` which
/// keeps multi-character graphemes).
pub fn split_phonemes(raw: &str) -> Vec<Vec<char>> {
    split_syllabified(raw)
        .into_iter()
        .map(|syllable| {
            syllable
                .into_iter()
                .filter_map(|token| token.chars().next())
                .collect()
        })
        .collect()
}

/// Replaces every occurrence of `from` with `to` inside `phonology`,
/// re-scanning up to 10 times to account for a replacement that
/// reintroduces `from` (§8 "Round-trip laws").
pub fn replace_syllables(phonology: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return phonology.to_owned();
    }
    let mut result = phonology.to_owned();
    for _ in 0..10 {
        if !result.contains(from) {
            break;
        }
        result = result.replace(from, to);
    }
    result
}

#[derive(Debug, Clone)]
pub struct Word {
    pub ortho: String,
    pub phonology: String,
    pub lemma: String,
    pub gram_cat: GramCat,
    pub cgram_ortho: Vec<String>,
    pub gender: Option<Gender>,
    pub number: Option<Number>,
    pub conjugations: Vec<ConjugationTuple>,
    pub syll_cv: Vec<Vec<char>>,
    pub orthosyll_cv: Vec<Vec<String>>,
    pub freq_books: f64,
    pub freq_films: f64,
}

impl Word {
    pub fn frequency(&self) -> f64 {
        // §9 open question (i): film-frequency-only, no blended formula.
        self.freq_films
    }

    pub fn lemme_gram_cat(&self) -> String {
        format!("{}_{}", self.lemma, self.gram_cat.as_str())
    }

    fn identity_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.ortho.hash(&mut hasher);
        self.phonology.hash(&mut hasher);
        self.lemma.hash(&mut hasher);
        self.gram_cat.hash(&mut hasher);
        self.gender.hash(&mut hasher);
        self.number.hash(&mut hasher);
        hasher.finish()
    }

    /// Every discriminating feature this word exposes to the disambiguator
    /// (§4.1 "getFeatures").
    pub fn features(&self) -> Vec<String> {
        let mut features = vec![self.gram_cat.as_str().to_owned()];
        if let Some(gender) = self.gender {
            features.push(gender.as_str().to_owned());
        }
        if let Some(number) = self.number {
            features.push(number.as_str().to_owned());
        }
        if let (Some(gender), Some(number)) = (self.gender, self.number) {
            features.push(format!("{}_{}", gender.as_str(), number.as_str()));
            if !(gender == Gender::Masculine && number == Number::Singular) {
                features.push("not_m_s".to_owned());
            }
        }
        if self.gram_cat.is_verb() {
            if let (Some(gender), Some(number)) = (self.gender, self.number) {
                features.push(format!(
                    "{}_{}_{}",
                    self.gram_cat.as_str(),
                    gender.as_str(),
                    number.as_str()
                ));
            }
            for tuple in &self.conjugations {
                features.extend(tuple.powerset());
            }
        }
        features
    }
}

impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.identity_hash() == other.identity_hash()
    }
}
impl Eq for Word {}

impl Hash for Word {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.identity_hash());
    }
}

/// A single parsed lexicon row, or the reason it was skipped.
pub type ParsedRow = Result<Word, LexiconError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nasal_fix_rewrites_syll_cv_and_orthosyll_cv() {
        let syll_cv = split_phonemes("@|n_i_v_R_#");
        assert_eq!(syll_cv, vec![vec!['@'], vec!['i', 'v', 'R', '#']]);

        let orthosyll_cv = split_syllabified("e|n_i_v_r_e");
        assert_eq!(
            orthosyll_cv,
            vec![
                vec!["en".to_owned()],
                vec![
                    "i".to_owned(),
                    "v".to_owned(),
                    "r".to_owned(),
                    "e".to_owned()
                ]
            ]
        );
    }

    #[test]
    fn conjugation_powerset_has_all_four_way_combination() {
        let tuples = parse_info_verb("ind:pre:1s");
        assert_eq!(tuples.len(), 1);
        let powerset = tuples[0].powerset();
        assert!(powerset.contains(&"indicatif".to_owned()));
        assert!(powerset.contains(&"présent".to_owned()));
        assert!(powerset.contains(&"pers_1".to_owned()));
        assert!(powerset.contains(&"nbr_s".to_owned()));
        assert!(powerset.contains(&"indicatif:présent".to_owned()));
        assert!(powerset.contains(&"indicatif:pers_1".to_owned()));
        assert!(powerset.contains(&"présent:pers_1".to_owned()));
        assert!(powerset.contains(&"indicatif:présent:pers_1".to_owned()));
        assert!(powerset.contains(&"indicatif:présent:pers_1:nbr_s".to_owned()));
        assert_eq!(powerset.len(), 15);
    }

    #[test]
    fn infinitif_stops_at_mood() {
        let tuples = parse_info_verb("inf");
        assert_eq!(tuples, vec![ConjugationTuple(vec!["infinitif".to_owned()])]);
    }

    #[test]
    fn participe_stops_at_tense() {
        let tuples = parse_info_verb("par:pas");
        assert_eq!(
            tuples,
            vec![ConjugationTuple(vec![
                "participe".to_owned(),
                "passé".to_owned()
            ])]
        );
    }

    #[test]
    fn replace_syllables_identity_law() {
        let phonology = "@nivR";
        assert_eq!(replace_syllables(phonology, "ni", "ni"), phonology);
        assert_eq!(replace_syllables(phonology, "ni", "mi"), "@mivR");
        assert_eq!(replace_syllables(phonology, "fa", "ta"), phonology);
    }
}
