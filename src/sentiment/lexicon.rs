//! Sentiment lexicon: word valences, intensifiers and negations.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use ahash::{AHashMap, AHashSet};

use crate::error::{Result, SentiscopeError};

/// Largest absolute valence a lexicon entry may carry.
pub const MAX_VALENCE: f64 = 4.0;

/// Scalar added by an intensifier such as "very".
pub const BOOSTER_INCREMENT: f64 = 0.293;

/// Scalar subtracted by a dampener such as "slightly".
pub const BOOSTER_DECREMENT: f64 = -0.293;

/// Built-in valences tuned for mobile banking app reviews.
const DEFAULT_VALENCES: &[(&str, f64)] = &[
    // positive
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("fantastic", 2.6),
    ("wonderful", 2.7),
    ("perfect", 2.7),
    ("best", 3.2),
    ("better", 1.9),
    ("nice", 1.8),
    ("love", 3.2),
    ("loved", 2.9),
    ("loving", 2.9),
    ("like", 1.5),
    ("liked", 1.8),
    ("happy", 2.7),
    ("glad", 2.0),
    ("thanks", 1.9),
    ("thank", 1.5),
    ("helpful", 1.8),
    ("easy", 1.9),
    ("simple", 1.2),
    ("fast", 1.4),
    ("quick", 1.2),
    ("smooth", 1.6),
    ("reliable", 1.8),
    ("secure", 1.4),
    ("convenient", 1.8),
    ("useful", 1.9),
    ("efficient", 1.8),
    ("satisfied", 1.8),
    ("recommend", 1.5),
    ("cool", 1.3),
    ("super", 2.9),
    ("wow", 2.8),
    ("works", 1.0),
    ("working", 0.8),
    ("improved", 1.9),
    ("improvement", 1.8),
    ("friendly", 2.2),
    ("enjoy", 2.2),
    ("ok", 0.9),
    ("okay", 0.9),
    ("fine", 0.8),
    ("stable", 1.2),
    ("impressive", 2.3),
    ("brilliant", 2.8),
    ("appreciate", 2.2),
    ("success", 2.7),
    ("successful", 2.8),
    // negative
    ("bad", -2.5),
    ("worse", -2.1),
    ("worst", -3.1),
    ("terrible", -2.1),
    ("horrible", -2.5),
    ("awful", -2.0),
    ("poor", -2.1),
    ("hate", -2.7),
    ("hated", -3.2),
    ("useless", -1.8),
    ("crash", -1.7),
    ("crashes", -1.7),
    ("crashed", -1.8),
    ("crashing", -1.8),
    ("slow", -1.0),
    ("slower", -1.2),
    ("bug", -1.2),
    ("bugs", -1.3),
    ("buggy", -1.7),
    ("error", -1.7),
    ("errors", -1.4),
    ("fail", -2.5),
    ("fails", -1.8),
    ("failed", -2.3),
    ("failure", -2.3),
    ("failing", -2.3),
    ("problem", -1.7),
    ("problems", -1.7),
    ("issue", -0.9),
    ("issues", -1.0),
    ("annoying", -1.7),
    ("frustrating", -1.9),
    ("frustrated", -2.4),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("broken", -1.8),
    ("stuck", -1.5),
    ("freeze", -1.2),
    ("freezes", -1.2),
    ("lag", -1.1),
    ("laggy", -1.3),
    ("waste", -1.8),
    ("scam", -2.8),
    ("stolen", -2.2),
    ("lost", -1.3),
    ("difficult", -1.5),
    ("hard", -0.4),
    ("confusing", -1.3),
    ("complicated", -1.2),
    ("unreliable", -1.9),
    ("unable", -1.6),
    ("impossible", -1.3),
    ("rubbish", -2.0),
    ("trash", -1.9),
    ("pathetic", -2.5),
    ("ridiculous", -1.5),
    ("unacceptable", -2.0),
    ("sucks", -1.5),
    ("disgusting", -2.4),
    ("wrong", -2.1),
    ("angry", -2.3),
    ("sad", -2.1),
    ("delay", -1.3),
    ("delayed", -1.2),
    ("nightmare", -2.6),
    ("mess", -1.5),
];

/// Intensifiers (positive scalar) and dampeners (negative scalar).
const DEFAULT_BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOSTER_INCREMENT),
    ("completely", BOOSTER_INCREMENT),
    ("extremely", BOOSTER_INCREMENT),
    ("highly", BOOSTER_INCREMENT),
    ("incredibly", BOOSTER_INCREMENT),
    ("really", BOOSTER_INCREMENT),
    ("so", BOOSTER_INCREMENT),
    ("too", BOOSTER_INCREMENT),
    ("totally", BOOSTER_INCREMENT),
    ("very", BOOSTER_INCREMENT),
    ("most", BOOSTER_INCREMENT),
    ("more", BOOSTER_INCREMENT),
    ("much", BOOSTER_INCREMENT),
    ("truly", BOOSTER_INCREMENT),
    ("utterly", BOOSTER_INCREMENT),
    ("barely", BOOSTER_DECREMENT),
    ("hardly", BOOSTER_DECREMENT),
    ("kinda", BOOSTER_DECREMENT),
    ("less", BOOSTER_DECREMENT),
    ("little", BOOSTER_DECREMENT),
    ("marginally", BOOSTER_DECREMENT),
    ("partly", BOOSTER_DECREMENT),
    ("scarcely", BOOSTER_DECREMENT),
    ("slightly", BOOSTER_DECREMENT),
    ("somewhat", BOOSTER_DECREMENT),
];

/// Negation words; any word ending in `n't` is a negation as well.
const DEFAULT_NEGATIONS: &[&str] = &[
    "not", "no", "never", "without", "none", "nobody", "nothing", "neither", "nor", "nowhere",
    "cannot", "aint", "arent", "cant", "couldnt", "didnt", "doesnt", "dont", "hadnt", "hasnt",
    "havent", "isnt", "shouldnt", "wasnt", "werent", "wont", "wouldnt",
];

/// The built-in lexicon.
pub static DEFAULT_LEXICON: LazyLock<Lexicon> = LazyLock::new(Lexicon::builtin);

/// An immutable table of word valences, intensifiers and negations.
///
/// Valences are on a `-4.0..=4.0` scale. Entries are looked up by the
/// lower-cased token text.
#[derive(Debug, Clone)]
pub struct Lexicon {
    valences: AHashMap<String, f64>,
    boosters: AHashMap<String, f64>,
    negations: AHashSet<String>,
}

impl Lexicon {
    fn builtin() -> Self {
        Lexicon {
            valences: DEFAULT_VALENCES
                .iter()
                .map(|&(w, v)| (w.to_string(), v))
                .collect(),
            boosters: DEFAULT_BOOSTERS
                .iter()
                .map(|&(w, b)| (w.to_string(), b))
                .collect(),
            negations: DEFAULT_NEGATIONS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Build a lexicon from valences, keeping the built-in intensifiers and
    /// negations.
    pub fn from_valences<I, S>(valences: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut lexicon = DEFAULT_LEXICON.clone();
        lexicon.valences.clear();
        lexicon.extend(valences)?;
        Ok(lexicon)
    }

    /// Load valences from a JSON object of `word -> valence`.
    ///
    /// With `extend_default` the entries are merged into the built-in table,
    /// overriding words already present; otherwise they replace it.
    pub fn from_json_file<P: AsRef<Path>>(path: P, extend_default: bool) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SentiscopeError::config(format!("cannot read lexicon {}: {e}", path.display()))
        })?;
        let entries: HashMap<String, f64> = serde_json::from_str(&content)?;

        if extend_default {
            let mut lexicon = DEFAULT_LEXICON.clone();
            lexicon.extend(entries)?;
            Ok(lexicon)
        } else {
            Self::from_valences(entries)
        }
    }

    /// Add or override valences.
    pub fn extend<I, S>(&mut self, valences: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        for (word, valence) in valences {
            let word = word.into().to_lowercase();
            if !valence.is_finite() || valence.abs() > MAX_VALENCE {
                return Err(SentiscopeError::config(format!(
                    "valence for {word:?} must be within [-{MAX_VALENCE}, {MAX_VALENCE}], got {valence}"
                )));
            }
            self.valences.insert(word, valence);
        }
        Ok(())
    }

    /// Valence of a word, if it carries one.
    pub fn valence(&self, word: &str) -> Option<f64> {
        self.valences.get(word).copied()
    }

    /// Intensifier scalar of a word, if it is one.
    pub fn booster(&self, word: &str) -> Option<f64> {
        self.boosters.get(word).copied()
    }

    /// Whether a word negates the sentiment that follows it.
    pub fn is_negation(&self, word: &str) -> bool {
        word.ends_with("n't") || self.negations.contains(word)
    }

    /// Number of words with a valence.
    pub fn len(&self) -> usize {
        self.valences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        DEFAULT_LEXICON.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let lexicon = Lexicon::default();
        assert!(lexicon.valence("great").unwrap() > 0.0);
        assert!(lexicon.valence("crashes").unwrap() < 0.0);
        assert_eq!(lexicon.valence("transfer"), None);
        assert_eq!(lexicon.booster("very"), Some(BOOSTER_INCREMENT));
        assert_eq!(lexicon.booster("slightly"), Some(BOOSTER_DECREMENT));
    }

    #[test]
    fn test_negations() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_negation("not"));
        assert!(lexicon.is_negation("don't"));
        assert!(lexicon.is_negation("dont"));
        assert!(lexicon.is_negation("won't"));
        assert!(!lexicon.is_negation("now"));
    }

    #[test]
    fn test_builtin_valences_are_in_range() {
        for &(word, valence) in DEFAULT_VALENCES {
            assert!(valence.abs() <= MAX_VALENCE, "{word}");
        }
    }

    #[test]
    fn test_extend_rejects_out_of_range() {
        let mut lexicon = Lexicon::default();
        assert!(lexicon.extend([("meh", -0.5)]).is_ok());
        assert_eq!(lexicon.valence("meh"), Some(-0.5));
        assert!(lexicon.extend([("insane", 9.0)]).is_err());
        assert!(lexicon.extend([("nan", f64::NAN)]).is_err());
    }

    #[test]
    fn test_from_json_file_replace_and_extend() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "Telebirr": 1.5, "great": 1.0 }}"#).unwrap();

        let replaced = Lexicon::from_json_file(file.path(), false).unwrap();
        assert_eq!(replaced.len(), 2);
        assert_eq!(replaced.valence("telebirr"), Some(1.5));
        assert_eq!(replaced.valence("bad"), None);
        assert!(replaced.is_negation("not"));

        let extended = Lexicon::from_json_file(file.path(), true).unwrap();
        assert_eq!(extended.valence("great"), Some(1.0));
        assert!(extended.valence("bad").is_some());
    }
}
