//! Derivation of storage collection names from model names.
//!
//! The rules are deterministic English pluralization on the lowercased model
//! name. Only the final word segment after the last `_` is pluralized, so
//! `OrderItem` becomes `orderitems` and `order_person` becomes `order_people`.

use crate::models::ModelName;

const UNCOUNTABLE: &[&str] = &[
    "advice",
    "data",
    "equipment",
    "feedback",
    "fish",
    "information",
    "media",
    "money",
    "news",
    "rice",
    "series",
    "sheep",
    "species",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("man", "men"),
    ("mouse", "mice"),
    ("person", "people"),
    ("tooth", "teeth"),
    ("woman", "women"),
];

const F_TO_VES: &[&str] = &[
    "half", "knife", "leaf", "life", "loaf", "shelf", "thief", "wife", "wolf",
];

/// Collection name derived from `model`: lowercased and pluralized.
pub fn collection_name_for(model: &ModelName) -> String {
    let lower = model.as_str().to_ascii_lowercase();
    match lower.rsplit_once('_') {
        Some((head, last)) if !last.is_empty() => format!("{}_{}", head, pluralize_word(last)),
        _ => pluralize_word(&lower),
    }
}

fn pluralize_word(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return plural.to_string();
    }
    // Compound words ending in an irregular noun ("salesperson"). Short stems
    // like "man" are excluded: "human" is not a compound.
    if let Some((singular, plural)) = IRREGULAR.iter().find(|(singular, _)| {
        singular.len() >= 5 && word.len() > singular.len() && word.ends_with(singular)
    })
    {
        return format!("{}{}", &word[..word.len() - singular.len()], plural);
    }
    if word.ends_with('s') {
        return word.to_string();
    }
    if word.ends_with('x') || word.ends_with('z') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{}es", word);
    }
    if let Some(stem) = word.strip_suffix('y') {
        if stem
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_alphabetic() && !"aeiou".contains(c))
        {
            return format!("{}ies", stem);
        }
    }
    if F_TO_VES.contains(&word) {
        if let Some(stem) = word.strip_suffix("fe") {
            return format!("{}ves", stem);
        }
        if let Some(stem) = word.strip_suffix('f') {
            return format!("{}ves", stem);
        }
    }
    format!("{}s", word)
}
