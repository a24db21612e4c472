//! Surface-form plural detection.
//!
//! Like a classic inflection engine this looks only at spelling, not at the
//! sentence: third-person verbs such as "hacks" read as plural nouns.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static IRREGULAR: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("men", "man"),
        ("women", "woman"),
        ("children", "child"),
        ("people", "person"),
        ("mice", "mouse"),
        ("geese", "goose"),
        ("teeth", "tooth"),
        ("feet", "foot"),
        ("oxen", "ox"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("these", "this"),
        ("those", "that"),
        ("viruses", "virus"),
        ("buses", "bus"),
        ("bonuses", "bonus"),
        ("statuses", "status"),
        ("campuses", "campus"),
        ("knives", "knife"),
        ("wives", "wife"),
        ("lives", "life"),
        ("wolves", "wolf"),
        ("thieves", "thief"),
        ("halves", "half"),
        ("shelves", "shelf"),
        ("leaves", "leaf"),
        ("heroes", "hero"),
        ("potatoes", "potato"),
        ("tomatoes", "tomato"),
        ("echoes", "echo"),
        ("vetoes", "veto"),
        ("torpedoes", "torpedo"),
        ("indices", "index"),
        ("matrices", "matrix"),
        ("vertices", "vertex"),
        ("analyses", "analysis"),
        ("theses", "thesis"),
        ("crises", "crisis"),
        ("diagnoses", "diagnosis"),
        ("hypotheses", "hypothesis"),
        ("cacti", "cactus"),
        ("fungi", "fungus"),
        ("nuclei", "nucleus"),
        ("radii", "radius"),
        ("alumni", "alumnus"),
    ]
    .into_iter()
    .collect()
});

// Words ending in "s" that are never plural nouns.
static NOT_PLURAL: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // function words
        "is", "was", "has", "does", "goes", "his", "hers", "its", "ours", "yours", "theirs",
        "this", "thus", "us", "yes", "plus", "minus", "less", "unless", "always", "perhaps",
        "whereas", "besides", "sometimes", "nowadays", "afterwards", "towards", "upwards",
        "downwards", "backwards", "forwards", "across", "as", "ourselves", "yourselves",
        "themselves", "else", "whose",
        // uncountable or invariant
        "news", "series", "species", "means", "headquarters", "gas", "bias", "alias", "atlas",
        "canvas", "chaos", "cosmos", "lens", "iris", "corpus", "census", "focus", "bus",
        "virus", "campus", "status", "bonus", "thesis", "analysis", "basis", "crisis",
        // acronyms that read as words once lower-cased
        "ddos", "dos", "xss", "https", "dns", "sms", "ios", "macos", "saas", "aws",
    ]
    .into_iter()
    .collect()
});

// Nouns whose singular ends in "-ie", so "-ies" must not become "-y".
static IE_NOUNS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "cookie", "movie", "zombie", "rookie", "hoodie", "selfie", "calorie", "prairie",
        "genie", "pixie", "tie", "pie", "lie", "die", "goalie", "newbie", "freebie",
    ]
    .into_iter()
    .collect()
});

// Nouns whose singular ends in "-che", so "-ches" must not lose its "e".
static CHE_NOUNS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "cache", "niche", "avalanche", "headache", "moustache", "psyche", "cliche", "attache",
        "microfiche", "earache",
    ]
    .into_iter()
    .collect()
});

const INVARIANT_SUFFIXES: [&str; 5] = ["ss", "us", "is", "ous", "ics"];

pub(crate) fn singularize(word: &str) -> Option<String> {
    if let Some(singular) = IRREGULAR.get(word) {
        return Some((*singular).to_string());
    }
    if word.chars().count() <= 3
        || NOT_PLURAL.contains(word)
        || !word.ends_with('s')
        || !word.chars().all(char::is_alphabetic)
        || INVARIANT_SUFFIXES.iter().any(|s| word.ends_with(s))
    {
        return None;
    }

    let without_s = &word[..word.len() - 1];

    if let Some(stem) = word.strip_suffix("ies") {
        let ie = format!("{stem}ie");
        if IE_NOUNS.contains(ie.as_str()) {
            return Some(ie);
        }
        if stem.chars().count() >= 2 {
            return Some(format!("{stem}y"));
        }
        return Some(without_s.to_string());
    }

    if word.ends_with("ches") && CHE_NOUNS.contains(without_s) {
        return Some(without_s.to_string());
    }

    for sibilant in ["sses", "ches", "shes", "xes", "zzes"] {
        if word.ends_with(sibilant) {
            return Some(word[..word.len() - 2].to_string());
        }
    }

    Some(without_s.to_string())
}

pub(crate) fn is_plural_noun(word: &str) -> bool {
    singularize(word).is_some()
}
