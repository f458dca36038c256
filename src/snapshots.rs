// src/snapshots.rs

use crate::checkout::Checkout;
use crate::model::FileVersions;
use crate::resolver::Strict;
use anyhow::{Context, Result};
use git2::{ErrorCode, Oid, Repository};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `src/a.rs` at `0123456789abcdef` as version 2 -> `src-a.rs-0123456789a.2`
pub fn snapshot_name(path: &str, commit: &str, version: usize) -> String {
    let short = &commit[..commit.len().min(11)];
    format!("{}-{}.{}", path.replace('/', "-"), short, version)
}

/// Writes the content of each file at its reference commit and the versions
/// before it: `version_count` versions from the pull request plus the base one.
/// Returns the paths written.
pub fn write_snapshots(
    checkout: &Checkout,
    strict: &Strict<'_>,
    versions: &[FileVersions],
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let repo = checkout.open()?;

    let mut written = Vec::new();
    for file in versions {
        let history = strict.history(&file.reference, &file.path)?;
        for (n, entry) in history.iter().take(file.version_count + 1).enumerate() {
            let Some(content) = blob_content(&repo, &entry.commit, &file.path)? else {
                warn!("{} does not exist at {}, skipping version {}", file.path, entry.commit, n);
                continue;
            };
            let target = out_dir.join(snapshot_name(&file.path, &entry.commit, n));
            fs::write(&target, content).with_context(|| format!("Failed to write {}", target.display()))?;
            debug!("Wrote {}", target.display());
            written.push(target);
        }
    }
    Ok(written)
}

fn blob_content(repo: &Repository, commit: &str, path: &str) -> Result<Option<Vec<u8>>> {
    let commit = repo.find_commit(Oid::from_str(commit)?)?;
    let entry = match commit.tree()?.get_path(Path::new(path)) {
        Ok(entry) => entry,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let blob = entry.to_object(repo)?.peel_to_blob()?;
    Ok(Some(blob.content().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancestry::GitOracle;
    use crate::checkout::tests::upstream;
    use crate::model::ProjectId;
    use tempfile::tempdir;

    #[test]
    fn names_flatten_directories_and_shorten_sha() {
        assert_eq!(snapshot_name("src/a.rs", "0123456789abcdef", 2), "src-a.rs-0123456789a.2");
        assert_eq!(snapshot_name("top.txt", "abc", 0), "top.txt-abc.0");
    }

    #[test]
    fn writes_requested_versions_plus_base() -> Result<()> {
        let (up, oids) = upstream(4)?;
        let checkout = Checkout::at(ProjectId { owner: "octo".into(), repo: "demo".into() }, up.path());
        let oracle = GitOracle::new(checkout.clone());
        let strict = Strict::new(&oracle);
        let out = tempdir()?;

        let reference = oids[3].to_string();
        let versions = vec![FileVersions { path: "a.txt".into(), reference: reference.clone(), version_count: 2 }];
        let written = write_snapshots(&checkout, &strict, &versions, out.path())?;

        assert_eq!(written.len(), 3);
        assert_eq!(fs::read_to_string(&written[0])?, "v3");
        assert_eq!(fs::read_to_string(&written[2])?, "v1");
        assert_eq!(written[0], out.path().join(snapshot_name("a.txt", &reference, 0)));
        Ok(())
    }
}
