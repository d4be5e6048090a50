//! Function identity strings.
//!
//! The platform keys registrations by an external id. CI runs derive it from
//! the repository, the optional function path, and a ref; the same string
//! doubles as the human-readable function name.

/// `{repo}[/{path}]:{short_sha}` — the transient identity a push deploys
/// under before the `latest` alias moves.
pub fn sha_identity(repository: &str, function_path: &str, short_sha: &str) -> String {
    format!("{}:{}", scope(repository, function_path), short_sha)
}

/// `{repo}[/{path}]:latest` — the floating alias a push leaves behind.
pub fn latest_identity(repository: &str, function_path: &str) -> String {
    format!("{}:latest", scope(repository, function_path))
}

/// `{repo}[/{path}]/{head_ref}` — one live deployment per open PR branch.
pub fn pr_identity(repository: &str, function_path: &str, head_ref: &str) -> String {
    format!("{}/{}", scope(repository, function_path), head_ref)
}

/// Display name for the uploaded archive. Slashes would read as path
/// separators in the platform UI, so they become underscores.
pub fn archive_name(identity: &str) -> String {
    format!("{}.zip", identity.replace('/', "_"))
}

fn scope(repository: &str, function_path: &str) -> String {
    match function_path {
        "" | "." => repository.to_string(),
        path => format!("{}/{}", repository, path.trim_matches('/')),
    }
}
