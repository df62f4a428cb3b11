// Route classification.
// Maps the location path onto the handful of page shapes the engine augments.

/// Logical location within the repository site, derived from path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/{owner}/{repo}`
    RepoHome { owner: String, repo: String },
    /// `/{owner}/{repo}/releases`
    ReleasesList { owner: String, repo: String },
    /// `/{owner}/{repo}/releases/tag/{tag}`
    ReleaseDetail {
        owner: String,
        repo: String,
        tag: String,
    },
    /// Anything else; no augmentation applies.
    Other,
}

/// Classify a location path by its non-empty segments.
pub fn classify(path: &str) -> Route {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [owner, repo] => Route::RepoHome {
            owner: (*owner).to_string(),
            repo: (*repo).to_string(),
        },
        [owner, repo, "releases"] => Route::ReleasesList {
            owner: (*owner).to_string(),
            repo: (*repo).to_string(),
        },
        [owner, repo, "releases", "tag", tag] => Route::ReleaseDetail {
            owner: (*owner).to_string(),
            repo: (*repo).to_string(),
            tag: (*tag).to_string(),
        },
        _ => Route::Other,
    }
}
