//! Slug generation.
//!
//! Slugs are unique per kind among live nodes and regenerated whenever a
//! name changes. Collisions get a short random suffix rather than a
//! retry-until-unique counter, so two concurrent saves of the same name
//! do not race each other up a numeric ladder.

use rand::RngExt;
use rand::distr::Alphanumeric;

use folio_core::result::AppResult;
use folio_database::repositories::node::ScopedNodes;

/// Suffix length appended on collision.
const SUFFIX_LEN: usize = 4;
/// Collision retries before giving up and stacking a longer suffix.
const MAX_ATTEMPTS: usize = 5;

/// Turn a display name into its slug form: lowercase, alphanumerics
/// kept, everything else collapsed to single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        random_suffix(SUFFIX_LEN * 2)
    } else {
        slug
    }
}

/// Produce a slug for the name that no other live node of the scoped
/// kind uses. `exclude_id` skips the node being renamed.
pub async fn unique_slug(
    scoped: &ScopedNodes,
    name: &str,
    exclude_id: Option<i64>,
) -> AppResult<String> {
    let base = slugify(name);
    if !scoped.slug_in_use(&base, exclude_id).await? {
        return Ok(base);
    }

    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = format!("{base}-{}", random_suffix(SUFFIX_LEN * attempt.min(2)));
        if !scoped.slug_in_use(&candidate, exclude_id).await? {
            return Ok(candidate);
        }
    }

    // Statistically unreachable; a timestamped suffix settles it.
    Ok(format!(
        "{base}-{}",
        chrono::Utc::now().timestamp_millis()
    ))
}

fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("My Great Book"), "my-great-book");
        assert_eq!(slugify("  spaces  &  symbols!  "), "spaces-symbols");
        assert_eq!(slugify("Érable à sucre"), "érable-à-sucre");
    }

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("a --- b"), "a-b");
    }

    #[test]
    fn test_slugify_empty_name_gets_random_slug() {
        let slug = slugify("!!!");
        assert_eq!(slug.len(), SUFFIX_LEN * 2);
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
