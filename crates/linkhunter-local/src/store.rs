//! Filesystem store of scanned pages: the raw link occurrences of the latest
//! scan of each page URL, plus a history listing.

use linkhunter_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedPage {
    pub page_url: String,
    pub saved_at_epoch_s: u64,
    /// Link occurrences in page order, duplicates kept.
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    schema_version: u64,
    #[serde(flatten)]
    page: SavedPage,
}

#[derive(Debug, Clone)]
pub struct PageStore {
    root: PathBuf,
}

impl PageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// `LINKHUNTER_STORE_DIR`, else the user data dir, else a temp dir.
    pub fn default_dir() -> PathBuf {
        if let Ok(p) = std::env::var("LINKHUNTER_STORE_DIR") {
            let p = p.trim();
            if !p.is_empty() {
                return PathBuf::from(p);
            }
        }
        match dirs::data_dir() {
            Some(d) => d.join("linkhunter").join("pages"),
            None => std::env::temp_dir().join("linkhunter-pages"),
        }
    }

    pub fn with_default_dir() -> Self {
        Self::new(Self::default_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_for_page(page_url: &str) -> String {
        let mut h = Sha256::new();
        h.update(b"page:");
        h.update(page_url.as_bytes());
        hex::encode(h.finalize())
    }

    fn path_for_key(&self, key: &str) -> PathBuf {
        self.root
            .join(&key[0..2])
            .join(&key[2..4])
            .join(format!("{key}.json"))
    }

    /// Replace the stored scan for `page_url`.
    pub fn save(&self, page_url: &str, urls: &[String]) -> Result<SavedPage> {
        let now_s = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_secs();
        let page = SavedPage {
            page_url: page_url.to_string(),
            saved_at_epoch_s: now_s,
            urls: urls.to_vec(),
        };
        self.put(&page)?;
        Ok(page)
    }

    pub fn put(&self, page: &SavedPage) -> Result<()> {
        let p = self.path_for_key(&Self::key_for_page(&page.page_url));
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Store(e.to_string()))?;
        }
        let entry = StoredEntry {
            schema_version: SCHEMA_VERSION,
            page: page.clone(),
        };
        let bytes = serde_json::to_vec(&entry).map_err(|e| Error::Store(e.to_string()))?;
        fs::write(&p, bytes).map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }

    pub fn load(&self, page_url: &str) -> Result<Option<SavedPage>> {
        let p = self.path_for_key(&Self::key_for_page(page_url));
        if !p.exists() {
            return Ok(None);
        }
        Self::read_entry(&p).map(Some)
    }

    fn read_entry(p: &Path) -> Result<SavedPage> {
        let bytes = fs::read(p).map_err(|e| Error::Store(e.to_string()))?;
        let entry: StoredEntry = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Store(format!("{}: {e}", p.display())))?;
        if entry.schema_version != SCHEMA_VERSION {
            return Err(Error::Store(format!(
                "{}: unsupported schema_version {}",
                p.display(),
                entry.schema_version
            )));
        }
        Ok(entry.page)
    }

    /// Every stored page, oldest first.
    pub fn list(&self) -> Result<Vec<SavedPage>> {
        let mut out = Vec::new();
        if !self.root.exists() {
            return Ok(out);
        }
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let rd = fs::read_dir(&dir).map_err(|e| Error::Store(e.to_string()))?;
            for ent in rd {
                let ent = ent.map_err(|e| Error::Store(e.to_string()))?;
                let p = ent.path();
                if p.is_dir() {
                    stack.push(p);
                } else if p.extension().is_some_and(|x| x == "json") {
                    out.push(Self::read_entry(&p)?);
                }
            }
        }
        out.sort_by(|a, b| {
            a.saved_at_epoch_s
                .cmp(&b.saved_at_epoch_s)
                .then_with(|| a.page_url.cmp(&b.page_url))
        });
        Ok(out)
    }
}
