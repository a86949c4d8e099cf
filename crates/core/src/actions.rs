//! Helpers for commonly used actions.
//!
//! Each helper returns a plain [`Step`] that can be further configured with the
//! `with_*` setters before it is added to a job.

use crate::workflow::{Action, Expression, Step};

/// `actions/checkout`
pub const CHECKOUT: &str = "actions/checkout";
/// `actions/upload-artifact`
pub const UPLOAD_ARTIFACT: &str = "actions/upload-artifact";
/// `actions/download-artifact`
pub const DOWNLOAD_ARTIFACT: &str = "actions/download-artifact";
/// `actions/cache`
pub const CACHE: &str = "actions/cache";

/// Version the helpers pin all actions to
pub const ACTIONS_VERSION: &str = "v4";

/// Check out the repository
#[must_use]
pub fn checkout() -> Step {
    Step::action(CHECKOUT, ACTIONS_VERSION)
}

/// A named artifact shared between jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Artifact name
    pub name: String,
    /// Path uploaded from or downloaded to
    pub path: String,
}

impl Artifact {
    /// Create an artifact descriptor
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Step uploading the artifact
    #[must_use]
    pub fn upload(&self) -> Step {
        self.step(UPLOAD_ARTIFACT)
    }

    /// Step downloading the artifact
    #[must_use]
    pub fn download(&self) -> Step {
        self.step(DOWNLOAD_ARTIFACT)
    }

    fn step(&self, action: &str) -> Step {
        Step::new(
            Action::new(action, ACTIONS_VERSION)
                .with_param("name", self.name.as_str())
                .with_param("path", self.path.as_str()),
        )
    }
}

/// Cache `paths` under `key`, falling back to `restore_keys` prefixes.
///
/// Several paths or restore keys are joined into one multi-line input, which
/// is how `actions/cache` expects them.
pub fn cache<P, R>(name: impl Into<String>, paths: P, key: impl Into<String>, restore_keys: R) -> Step
where
    P: IntoIterator,
    P::Item: AsRef<str>,
    R: IntoIterator,
    R::Item: AsRef<str>,
{
    let key: String = key.into();
    let mut action = Action::new(CACHE, ACTIONS_VERSION)
        .with_param("path", join_lines(paths))
        .with_param("key", key);

    let restore_keys = join_lines(restore_keys);
    if !restore_keys.is_empty() {
        action = action.with_param("restore-keys", restore_keys);
    }
    Step::new(action).with_name(name)
}

/// Cache a single path keyed on the hash of `hash_files`.
///
/// The key is `<slug>-${{ hashFiles(...) }}` and `<slug>-` is the restore key,
/// so a stale cache is still reused when the files change.
pub fn cache_for_files<H>(
    name: impl Into<String>,
    path: impl AsRef<str>,
    slug: &str,
    hash_files: H,
) -> Step
where
    H: IntoIterator,
    H::Item: AsRef<str>,
{
    let quoted = hash_files
        .into_iter()
        .map(|file| format!("'{}'", file.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");
    let key = format!("{slug}-{}", Expression::new(format!("hashFiles({quoted})")));
    cache(name, [path.as_ref()], key, [format!("{slug}-")])
}

fn join_lines<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
