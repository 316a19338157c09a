use crate::utils::text::normalize;
use sha2::{Digest, Sha256};

/// Separator between title and ingredient names in the hashed string
const DELIMITER: &str = "|";

/// Content fingerprint of a recipe.
///
/// SHA-256 over the normalized title followed by the normalized, sorted
/// ingredient names, joined with `|`. Ingredient order and letter case do not
/// affect the result. Blank names still count as (empty) entries.
/// Returned as 64 lowercase hex characters.
pub fn signature<S: AsRef<str>>(title: &str, ingredient_names: &[S]) -> String {
    let mut names: Vec<String> = ingredient_names
        .iter()
        .map(|name| normalize(name.as_ref()))
        .collect();
    names.sort();

    let mut base = normalize(title);
    for name in &names {
        base.push_str(DELIMITER);
        base.push_str(name);
    }

    format!("{:x}", Sha256::digest(base.as_bytes()))
}
