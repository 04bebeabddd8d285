use crate::error::StoreError;
use crate::prospect::normalize_name;
use crate::types::{Lead, LeadStatus, ScanResult};
use dirs::data_dir;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use uuid::Uuid;

const LEADS_FILE: &str = ".leadscout-leads.json";

fn fallback_path(root: &Path, file: &str) -> Option<PathBuf> {
    let base = data_dir()?.join("leadscout").join("store");
    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());
    let digest = hex::encode(hasher.finalize());
    let stem = file.trim_start_matches('.').trim_end_matches(".json");
    Some(base.join(format!("{stem}-{digest}.json")))
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Reads whichever of `candidates` was written most recently; ties go to the
/// later candidate. Missing or unparseable content yields the default.
fn read_newest<T: DeserializeOwned + Default>(candidates: &[PathBuf]) -> T {
    let newest = candidates
        .iter()
        .filter_map(|path| modified(path).map(|time| (time, path)))
        .max_by_key(|(time, _)| *time);

    let Some((_, path)) = newest else {
        return T::default();
    };
    match fs::read_to_string(path) {
        Ok(contents) => parse_or_default(path, &contents),
        Err(error) => {
            log::warn!("cannot read {}: {error}", path.display());
            T::default()
        }
    }
}

fn candidates(root: &Path, file: &str) -> Vec<PathBuf> {
    let mut paths = vec![root.join(file)];
    paths.extend(fallback_path(root, file));
    paths
}

/// Reads `file` under `root`, or its per-root copy in the platform data dir
/// when that copy is newer.
pub fn read_json<T: DeserializeOwned + Default>(root: &Path, file: &str) -> T {
    read_newest(&candidates(root, file))
}

fn parse_or_default<T: DeserializeOwned + Default>(path: &Path, contents: &str) -> T {
    serde_json::from_str(contents).unwrap_or_else(|error| {
        log::warn!("ignoring unreadable {}: {error}", path.display());
        T::default()
    })
}

fn write_to(primary: &Path, fallback: Option<&Path>, data: &str) -> Result<PathBuf, StoreError> {
    let attempt = match primary.parent() {
        Some(parent) => fs::create_dir_all(parent).and_then(|_| fs::write(primary, data)),
        None => fs::write(primary, data),
    };
    let primary_error = match attempt {
        Ok(()) => return Ok(primary.to_path_buf()),
        Err(error) => error,
    };

    let Some(fallback) = fallback else {
        return Err(StoreError::Io(primary_error));
    };
    log::warn!(
        "cannot write {} ({primary_error}), using {}",
        primary.display(),
        fallback.display()
    );
    if let Some(parent) = fallback.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(fallback, data)?;
    Ok(fallback.to_path_buf())
}

pub fn write_json<T: Serialize>(root: &Path, file: &str, value: &T) -> Result<PathBuf, StoreError> {
    let data = serde_json::to_string_pretty(value)?;
    write_to(&root.join(file), fallback_path(root, file).as_deref(), &data)
}

/// Saved leads, newest first, written through to disk on every mutation.
#[derive(Debug)]
pub struct LeadStore {
    root: PathBuf,
    leads: Vec<Lead>,
}

impl LeadStore {
    /// Opens the store rooted at `root` and restores whatever it holds.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let leads = read_json(&root, LEADS_FILE);
        Self { root, leads }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load(&self) -> Vec<Lead> {
        read_json(&self.root, LEADS_FILE)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let path = write_json(&self.root, LEADS_FILE, &self.leads)?;
        log::debug!("saved {} leads to {}", self.leads.len(), path.display());
        Ok(())
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn len(&self) -> usize {
        self.leads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leads.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id == id)
    }

    /// Looks a lead up by full id or by an unambiguous id prefix.
    pub fn resolve(&self, reference: &str) -> Option<&Lead> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if let Some(lead) = self.get(reference) {
            return Some(lead);
        }
        let mut matches = self.leads.iter().filter(|lead| lead.id.starts_with(reference));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }

    pub fn is_saved(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.leads
            .iter()
            .any(|lead| normalize_name(&lead.details.name) == key)
    }

    /// Promotes a scan result to a lead. Returns `None` when a lead with the
    /// same name already exists.
    pub fn add(&mut self, candidate: &ScanResult) -> Result<Option<Lead>, StoreError> {
        if self.is_saved(&candidate.name) {
            log::debug!("lead '{}' already saved", candidate.name);
            return Ok(None);
        }

        let lead = Lead {
            id: Uuid::new_v4().to_string(),
            details: candidate.clone(),
            status: LeadStatus::New,
            date_added: chrono::Local::now().format("%Y-%m-%d").to_string(),
        };
        self.leads.insert(0, lead.clone());
        self.save()?;
        Ok(Some(lead))
    }

    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.leads.len();
        self.leads.retain(|lead| lead.id != id);
        if self.leads.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Sets any status, without checking that it follows the current one.
    pub fn set_status(&mut self, id: &str, status: LeadStatus) -> Result<Option<LeadStatus>, StoreError> {
        let Some(lead) = self.leads.iter_mut().find(|lead| lead.id == id) else {
            return Ok(None);
        };
        lead.status = status;
        self.save()?;
        Ok(Some(status))
    }

    pub fn advance_status(&mut self, id: &str) -> Result<Option<LeadStatus>, StoreError> {
        match self.get(id).map(|lead| lead.status.next()) {
            Some(next) => self.set_status(id, next),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Measure;
    use std::time::Duration;

    fn candidate(name: &str) -> ScanResult {
        ScanResult {
            name: name.to_string(),
            address: "Rua A, 10".to_string(),
            rating: Measure::Known(4.0),
            reviews: Measure::Known(90.0),
            insight: "No website".to_string(),
            ..ScanResult::default()
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LeadStore::open(dir.path());
        assert!(store.is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn garbage_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LEADS_FILE), "{not json").unwrap();
        assert!(LeadStore::open(dir.path()).is_empty());
    }

    fn backdate(path: &Path, age: Duration) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn newer_fallback_wins_over_stale_primary() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("leads.json");
        let fallback = dir.path().join("store").join("leads-fallback.json");
        fs::create_dir_all(fallback.parent().unwrap()).unwrap();
        fs::write(&primary, r#"[{"id":"1","name":"Old","status":"new"}]"#).unwrap();
        fs::write(&fallback, r#"[{"id":"1","name":"Old","status":"converted"}]"#).unwrap();
        backdate(&primary, Duration::from_secs(60));

        let leads: Vec<Lead> = read_newest(&[primary.clone(), fallback.clone()]);
        assert_eq!(leads[0].status, LeadStatus::Converted);

        backdate(&fallback, Duration::from_secs(120));
        let leads: Vec<Lead> = read_newest(&[primary, fallback]);
        assert_eq!(leads[0].status, LeadStatus::New);
    }

    #[test]
    fn unwritable_primary_round_trips_through_fallback() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the primary's directory should be.
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "").unwrap();
        let primary = blocker.join("leads.json");
        let fallback = dir.path().join("store").join("leads-fallback.json");

        let mut lead: Lead =
            serde_json::from_str(r#"{"id":"1","name":"Alpha"}"#).unwrap();
        lead.status = LeadStatus::Converted;
        let data = serde_json::to_string_pretty(&vec![lead.clone()]).unwrap();

        let written = write_to(&primary, Some(&fallback), &data).unwrap();
        assert_eq!(written, fallback);
        let leads: Vec<Lead> = read_newest(&[primary.clone(), fallback]);
        assert_eq!(leads, vec![lead]);

        assert!(write_to(&primary, None, &data).is_err());
    }

    #[test]
    fn add_prepends_and_ignores_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LeadStore::open(dir.path());
        assert!(store.add(&candidate("Alpha")).unwrap().is_some());
        assert!(store.add(&candidate("Beta")).unwrap().is_some());
        assert!(store.add(&candidate("Alpha")).unwrap().is_none());
        assert!(store.add(&candidate(" ALPHA ")).unwrap().is_none());

        let names: Vec<&str> = store.leads().iter().map(|l| l.details.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
        assert!(store.is_saved("alpha"));
    }

    #[test]
    fn resolve_accepts_unique_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LeadStore::open(dir.path());
        let lead = store.add(&candidate("Alpha")).unwrap().unwrap();
        assert_eq!(store.resolve(&lead.id[..8]).map(|l| l.id.as_str()), Some(lead.id.as_str()));
        assert!(store.resolve("").is_none());
        assert!(store.resolve("zzzz-not-an-id").is_none());
    }

    #[test]
    fn set_status_accepts_any_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LeadStore::open(dir.path());
        let lead = store.add(&candidate("Alpha")).unwrap().unwrap();
        assert_eq!(
            store.set_status(&lead.id, LeadStatus::Converted).unwrap(),
            Some(LeadStatus::Converted)
        );
        assert_eq!(store.advance_status(&lead.id).unwrap(), Some(LeadStatus::New));
        assert_eq!(store.set_status("missing", LeadStatus::New).unwrap(), None);
    }
}
