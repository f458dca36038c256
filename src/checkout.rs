// src/checkout.rs

use crate::error::{MiningError, Result};
use crate::model::ProjectId;
use git2::{FetchOptions, RemoteCallbacks, Repository};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Branches plus the head of every pull request
const REFSPECS: [&str; 2] = [
    "+refs/heads/*:refs/remotes/origin/*",
    "+refs/pull/*/head:refs/remotes/origin/pr/*",
];

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Checkouts live under `<cache_dir>/repos/<owner>/<repo>`
    pub cache_dir: PathBuf,
    /// Remote url with `{owner}` and `{repo}` placeholders
    pub url_template: String,
    pub network_timeout: Duration,
    /// Use whatever is cached without touching the network
    pub offline: bool,
}

impl CheckoutSettings {
    pub fn remote_url(&self, project: &ProjectId) -> String {
        self.url_template.replace("{owner}", &project.owner).replace("{repo}", &project.repo)
    }

    pub fn checkout_dir(&self, project: &ProjectId) -> PathBuf {
        self.cache_dir.join("repos").join(&project.owner).join(&project.repo)
    }
}

/// Handle to an up-to-date local bare checkout of one project
#[derive(Debug, Clone)]
pub struct Checkout {
    project: ProjectId,
    path: PathBuf,
}

impl Checkout {
    /// Wraps an existing repository without fetching anything
    pub fn at(project: ProjectId, path: impl Into<PathBuf>) -> Self {
        Self { project, path: path.into() }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a fresh libgit2 handle. Handles are not shared across threads.
    pub fn open(&self) -> Result<Repository> {
        Repository::open(&self.path).map_err(|e| MiningError::unavailable(&self.project, e.message()))
    }
}

type Slot = Arc<Mutex<Option<Checkout>>>;

/// Read-through cache of project checkouts. Clone-or-fetch runs at most once per
/// project and process, serialized per project; a failed refresh leaves the slot
/// empty so a later pull request retries it.
pub struct CheckoutCache {
    settings: CheckoutSettings,
    slots: Mutex<HashMap<ProjectId, Slot>>,
    refreshes: AtomicUsize,
}

impl CheckoutCache {
    pub fn new(settings: CheckoutSettings) -> Self {
        if !settings.offline {
            if let Err(e) = apply_socket_timeouts(settings.network_timeout) {
                warn!("Cannot bound git network operations: {}", e.message());
            }
        }
        Self { settings, slots: Mutex::new(HashMap::new()), refreshes: AtomicUsize::new(0) }
    }

    /// Number of clone-or-fetch runs performed so far, failed ones included
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn checkout(&self, project: &ProjectId) -> Result<Checkout> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.entry(project.clone()).or_default().clone()
        };

        let mut state = slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(checkout) = state.as_ref() {
            return Ok(checkout.clone());
        }

        let checkout = self.refresh(project)?;
        *state = Some(checkout.clone());
        Ok(checkout)
    }

    fn refresh(&self, project: &ProjectId) -> Result<Checkout> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        let dir = self.settings.checkout_dir(project);
        let url = self.settings.remote_url(project);

        let (repo, cloning) = match Repository::open_bare(&dir) {
            Ok(repo) => (repo, false),
            Err(_) if self.settings.offline => {
                return Err(MiningError::unavailable(project, format!("no cached checkout at {}", dir.display())));
            }
            Err(_) => {
                info!("Cloning {} into {}", url, dir.display());
                std::fs::create_dir_all(&dir).map_err(|e| MiningError::unavailable(project, e))?;
                let repo = Repository::init_bare(&dir).map_err(|e| MiningError::unavailable(project, e.message()))?;
                (repo, true)
            }
        };

        if !self.settings.offline {
            if let Err(e) = fetch(&repo, &url, self.settings.network_timeout) {
                // An empty repository must not pass for a cached checkout later
                if cloning {
                    drop(repo);
                    if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                        warn!("Failed to remove incomplete clone at {}: {}", dir.display(), cleanup);
                    }
                }
                return Err(MiningError::unavailable(project, e.message()));
            }
        }

        Ok(Checkout::at(project.clone(), dir))
    }
}

/// Bounds connecting and every socket read or write of libgit2 transports.
/// Progress callbacks alone cannot notice a remote that stops sending.
fn apply_socket_timeouts(timeout: Duration) -> std::result::Result<(), git2::Error> {
    let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    // SAFETY: both calls only store an integer in libgit2's global options
    unsafe {
        git2::opts::set_server_connect_timeout_in_milliseconds(millis)?;
        git2::opts::set_server_timeout_in_milliseconds(millis)?;
    }
    Ok(())
}

/// Fetches all branches and pull request heads into `repo`. Refs that are already
/// current are left alone, so repeated calls only transfer new objects.
fn fetch(repo: &Repository, url: &str, timeout: Duration) -> std::result::Result<(), git2::Error> {
    let mut remote = match repo.find_remote("origin") {
        Ok(remote) if remote.url() == Some(url) => remote,
        Ok(_) => {
            repo.remote_set_url("origin", url)?;
            repo.find_remote("origin")?
        }
        Err(_) => repo.remote("origin", url)?,
    };

    let deadline = Instant::now() + timeout;
    let mut callbacks = RemoteCallbacks::new();
    // Returning false aborts the transfer
    callbacks.transfer_progress(move |_| Instant::now() < deadline);
    callbacks.sideband_progress(move |_| Instant::now() < deadline);

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);

    let started = Instant::now();
    remote.fetch(&REFSPECS, Some(&mut options), None)?;
    debug!("Fetched {} in {:.2?}", url, started.elapsed());
    Ok(())
}
