//! Handler name mangling.
//!
//! Route handlers are referred to by lowercase names (`blog_posts`) while
//! registry entries use class-style names (`BlogPostsController`). These two
//! helpers convert between the conventions.

/// Convert a `snake_case` or `kebab-case` name into `CamelCase`.
///
/// ```
/// assert_eq!(peregrine::naming::camelize("blog_posts"), "BlogPosts");
/// assert_eq!(peregrine::naming::camelize("some-controller"), "SomeController");
/// ```
#[must_use]
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a `CamelCase` name into `snake_case`.
///
/// ```
/// assert_eq!(peregrine::naming::uncamelize("BlogPosts"), "blog_posts");
/// ```
#[must_use]
pub fn uncamelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
