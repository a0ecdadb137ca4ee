use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating category slugs
    /// Must be lowercase alphanumeric with single hyphens between groups
    /// - Valid: "electronics", "home-garden", "electronics-1"
    /// - Invalid: "-books", "books-", "home--garden", "Books", "home_garden"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}
