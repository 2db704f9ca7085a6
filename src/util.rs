//! Shared utility functions.

/// Turn a file slug into a display title.
///
/// Words are separated by `-`, `_` or spaces; each gets an upper-case first
/// letter and the rest is kept as written.
///
/// "hello-world" -> "Hello World"
/// "post1" -> "Post1"
pub fn title_case(slug: &str) -> String {
    let words: Vec<String> = slug
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect())
                .unwrap_or_default()
        })
        .collect();
    words.join(" ")
}
