//! Name normalization shared by guest search and guest import.
//!
//! Both the stored names and the incoming query go through [`normalize_name`]
//! so that "Łukasz Żółć", "lukasz zolc" and "  LUKASZ   Zolc " compare equal.

fn fold_char(c: char) -> char {
    match c {
        'ą' => 'a',
        'ć' => 'c',
        'ę' => 'e',
        'ł' => 'l',
        'ń' => 'n',
        'ó' => 'o',
        'ś' => 's',
        'ź' | 'ż' => 'z',
        other => other,
    }
}

/// Trims, collapses runs of whitespace, lowercases and folds Polish diacritics to ASCII.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.chars().flat_map(char::to_lowercase).map(fold_char).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized "first last" key for a guest.
pub fn full_name_key(first_name: &str, last_name: &str) -> String {
    normalize_name(&format!("{} {}", first_name, last_name))
}
