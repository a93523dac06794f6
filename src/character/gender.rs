//! Keyword-based gender inference for records that arrive without one.
//!
//! The heuristic counts pronoun/title keywords in the description and
//! background, then nudges the counts with common fantasy-name endings.  It
//! is pure: the same inputs always give the same answer, and a tie
//! (including `0–0`) resolves to [`Gender::NonBinary`].

use super::record::Gender;

// ---------------------------------------------------------------------------
// Keyword tables
// ---------------------------------------------------------------------------

/// Plain substring matches; trailing spaces are part of some keywords.
static MALE_KEYWORDS: &[&str] = &[
    "he ", "his ", "him ", "himself", "man ", "boy ", "male ", "son ", "father", "brother",
    "king ", "lord ", "sir ",
];

static FEMALE_KEYWORDS: &[&str] = &[
    "she ", "her ", "hers ", "herself", "woman ", "girl ", "female ", "daughter", "mother",
    "sister", "queen ", "lady ", "maiden",
];

static MALE_NAME_ENDINGS: &[&str] = &["us", "os", "or", "ion"];
static FEMALE_NAME_ENDINGS: &[&str] = &["a", "ia", "ina", "ella"];

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

/// Infer a gender from a character's name, description and background.
///
/// Each keyword counts at most once.  A name ending from either list adds a
/// single point to that side.
///
/// ```
/// use character_forge::character::{infer_gender, Gender};
///
/// let g = infer_gender("Thoran", "He is tall and his beard is long.", "");
/// assert_eq!(g, Gender::Male);
///
/// assert_eq!(infer_gender("", "", ""), Gender::NonBinary);
/// ```
pub fn infer_gender(name: &str, description: &str, background: &str) -> Gender {
    let text = format!("{} {}", description, background).to_lowercase();
    let name = name.to_lowercase();

    let mut male = count_matches(&text, MALE_KEYWORDS);
    let mut female = count_matches(&text, FEMALE_KEYWORDS);

    if FEMALE_NAME_ENDINGS.iter().any(|e| name.ends_with(e)) {
        female += 1;
    }
    if MALE_NAME_ENDINGS.iter().any(|e| name.ends_with(e)) {
        male += 1;
    }

    log::trace!("gender: male={male} female={female} name={name:?}");

    match male.cmp(&female) {
        std::cmp::Ordering::Greater => Gender::Male,
        std::cmp::Ordering::Less => Gender::Female,
        std::cmp::Ordering::Equal => Gender::NonBinary,
    }
}

fn count_matches(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
