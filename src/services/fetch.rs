use super::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Source of raw structure files keyed by PDB identifier.
pub trait StructureFetcher {
    fn fetch(&self, pdb_id: &str) -> Result<Vec<u8>, Error>;
}

/// Downloads entries from the RCSB file server.
#[derive(Debug, Clone)]
pub struct RcsbFetcher {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl Default for RcsbFetcher {
    fn default() -> Self {
        Self::new("https://files.rcsb.org/download")
    }
}

impl RcsbFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn url_for(&self, pdb_id: &str) -> String {
        format!("{}/{}.pdb", self.base_url.trim_end_matches('/'), pdb_id)
    }
}

impl StructureFetcher for RcsbFetcher {
    fn fetch(&self, pdb_id: &str) -> Result<Vec<u8>, Error> {
        let url = self.url_for(pdb_id);
        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::fetch(pdb_id, e.to_string()))?;
        let body = response
            .bytes()
            .map_err(|e| Error::fetch(pdb_id, e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Fetches `pdb_id` and stores it as `<pdb_id>.pdb` in `dir`.
///
/// An empty download counts as a failure and leaves no file behind.
pub fn fetch_to_file<F: StructureFetcher + ?Sized>(
    fetcher: &F,
    pdb_id: &str,
    dir: &Path,
) -> Result<PathBuf, Error> {
    let body = fetcher.fetch(pdb_id)?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::fetch(pdb_id, "server returned an empty file"));
    }

    let path = dir.join(format!("{}.pdb", pdb_id));
    fs::write(&path, &body).map_err(|e| Error::file(e, &path))?;
    info!(pdb_id, path = %path.display(), bytes = body.len(), "downloaded structure");
    Ok(path)
}
