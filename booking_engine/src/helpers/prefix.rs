/// Used when neither the tenant's initials nor its display name yield any usable characters.
pub const DEFAULT_PREFIX: &str = "BKG";
pub const MAX_PREFIX_LEN: usize = 5;

// Company suffixes that do not contribute to a prefix
const SUFFIX_WORDS: [&str; 12] =
    ["llc", "inc", "ltd", "limited", "co", "corp", "company", "gmbh", "sa", "srl", "plc", "sl"];

/// Derives the reservation number prefix for a tenant.
///
/// Explicit initials win when they contain at least one letter or digit. Otherwise the prefix is built from the first
/// letter of every word of the display name, ignoring punctuation and company suffixes such as "LLC". The result is
/// uppercase and at most [`MAX_PREFIX_LEN`] characters long.
pub fn derive_prefix(initials: Option<&str>, display_name: &str) -> String {
    let from_initials = initials
        .map(|i| i.chars().filter(|c| c.is_ascii_alphanumeric()).take(MAX_PREFIX_LEN).collect::<String>())
        .unwrap_or_default();
    if !from_initials.is_empty() {
        return from_initials.to_ascii_uppercase();
    }
    let from_name = display_name
        .split(|c: char| c.is_whitespace() || c == '-' || c == '/' || c == '&')
        .map(|word| word.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>())
        .filter(|word| !word.is_empty() && !SUFFIX_WORDS.contains(&word.to_ascii_lowercase().as_str()))
        .filter_map(|word| word.chars().find(|c| c.is_ascii_alphabetic()))
        .take(MAX_PREFIX_LEN)
        .collect::<String>();
    if from_name.is_empty() {
        DEFAULT_PREFIX.to_string()
    } else {
        from_name.to_ascii_uppercase()
    }
}
