use crate::ai::GenerativeBackend;
use crate::error::{ErrorCategory, ProspectError, StoreError};
use crate::handoff::{self, Dispatch, MessageLauncher};
use crate::prospect::ProspectingClient;
use crate::store::LeadStore;
use crate::types::{AnalysisReport, Lead, LeadStatus, PitchMessage, ScanResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NICHE: &str = "Pizzaria";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Scanning,
    RelationshipManagement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// The last discovery query and everything it returned so far.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanSession {
    pub niche: String,
    pub location: String,
    pub results: Vec<ScanResult>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self {
            niche: DEFAULT_NICHE.to_string(),
            location: String::new(),
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(Lead),
    AlreadySaved,
    NoSuchResult,
    Failed,
}

#[derive(Debug, Default)]
pub struct ModalState {
    pub selected: Option<ScanResult>,
    /// Set for the length of an analysis or pitch request. Only a front end
    /// that renders while the request is in flight (from another thread or
    /// task holding a snapshot) can observe it set.
    pub loading: bool,
    pub analysis: Option<AnalysisReport>,
    pub pitch: Option<PitchMessage>,
}

/// Owns the lead store and all transient view state, and routes user
/// actions to the prospecting client.
pub struct App<B> {
    client: ProspectingClient<B>,
    store: LeadStore,
    mode: ViewMode,
    session: ScanSession,
    modal: ModalState,
    notices: Vec<Notice>,
}

impl<B: GenerativeBackend> App<B> {
    pub fn new(client: ProspectingClient<B>, store: LeadStore) -> Self {
        Self {
            client,
            store,
            mode: ViewMode::default(),
            session: ScanSession::default(),
            modal: ModalState::default(),
            notices: Vec::new(),
        }
    }

    pub fn with_session(mut self, session: ScanSession) -> Self {
        self.session = session;
        self
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn switch_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn store(&self) -> &LeadStore {
        &self.store
    }

    pub fn leads(&self) -> &[Lead] {
        self.store.leads()
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn client(&self) -> &ProspectingClient<B> {
        &self.client
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn info(&mut self, text: impl Into<String>) {
        self.notices.push(Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        });
    }

    /// Quota and credential problems get their remedy appended; anything
    /// else stays a plain summary and the raw error only reaches the log.
    fn failure(&mut self, summary: &str, error: &ProspectError) {
        log::debug!("{summary}: {error}");
        let classification = error.classification();
        let text = match classification.category {
            ErrorCategory::Quota | ErrorCategory::Authentication => {
                format!("{summary} {}", classification.explanation)
            }
            ErrorCategory::Unclassified => summary.to_string(),
        };
        self.notices.push(Notice {
            level: NoticeLevel::Error,
            text,
        });
    }

    fn store_failure(&mut self, error: &StoreError) {
        log::warn!("lead store write failed: {error}");
        self.notices.push(Notice {
            level: NoticeLevel::Error,
            text: "Could not save your leads to disk. The change may be lost on restart.".to_string(),
        });
    }

    /// Starts a fresh discovery, replacing any previous results.
    pub fn scan(&mut self, niche: &str, location: &str) {
        let location = location.trim();
        if location.is_empty() {
            self.info("Please enter a city and state to scan.");
            return;
        }
        let niche = match niche.trim() {
            "" => DEFAULT_NICHE,
            value => value,
        };

        self.session = ScanSession {
            niche: niche.to_string(),
            location: location.to_string(),
            results: Vec::new(),
        };
        let outcome = self.client.discover(niche, location, &[]);
        self.absorb(outcome);
    }

    /// Fetches another batch for the current query, excluding everything
    /// already on screen.
    pub fn load_more(&mut self) {
        if self.session.location.is_empty() {
            self.info("Run a scan before loading more results.");
            return;
        }
        let exclude: Vec<String> = self
            .session
            .results
            .iter()
            .map(|result| result.name.clone())
            .collect();

        let outcome =
            self.client
                .discover(&self.session.niche, &self.session.location, &exclude);
        self.absorb(outcome);
    }

    fn absorb(&mut self, outcome: Result<Vec<ScanResult>, ProspectError>) {
        match outcome {
            Ok(batch) if batch.is_empty() => {
                self.info("No new leads found with the current criteria.");
            }
            Ok(batch) => {
                log::debug!("discovery returned {} results", batch.len());
                self.session.results.extend(batch);
            }
            Err(error) => self.failure("The scan failed. Please try again.", &error),
        }
    }

    pub fn is_saved(&self, name: &str) -> bool {
        self.store.is_saved(name)
    }

    /// Saves the scan result at `index`. Already-saved names are left alone.
    pub fn save_result(&mut self, index: usize) -> SaveOutcome {
        let Some(candidate) = self.session.results.get(index).cloned() else {
            return SaveOutcome::NoSuchResult;
        };
        match self.store.add(&candidate) {
            Ok(Some(lead)) => SaveOutcome::Saved(lead),
            Ok(None) => SaveOutcome::AlreadySaved,
            Err(error) => {
                self.store_failure(&error);
                SaveOutcome::Failed
            }
        }
    }

    /// Removes a lead if `confirm` approves it.
    pub fn delete_lead(&mut self, id: &str, confirm: impl FnOnce(&Lead) -> bool) -> bool {
        let Some(lead) = self.store.get(id) else {
            return false;
        };
        if !confirm(lead) {
            return false;
        }
        match self.store.remove(id) {
            Ok(removed) => removed,
            Err(error) => {
                self.store_failure(&error);
                false
            }
        }
    }

    pub fn cycle_status(&mut self, id: &str) -> Option<LeadStatus> {
        self.store.advance_status(id).unwrap_or_else(|error| {
            self.store_failure(&error);
            None
        })
    }

    pub fn set_status(&mut self, id: &str, status: LeadStatus) -> Option<LeadStatus> {
        self.store.set_status(id, status).unwrap_or_else(|error| {
            self.store_failure(&error);
            None
        })
    }

    pub fn open_analysis(&mut self, prospect: &ScanResult) {
        self.modal.selected = Some(prospect.clone());
        self.modal.analysis = None;
        self.modal.loading = true;
        let outcome = self.client.analyze(&prospect.name, &prospect.address);
        self.modal.loading = false;
        match outcome {
            Ok(report) => self.modal.analysis = Some(report),
            Err(error) => self.failure("Could not load the deep analysis.", &error),
        }
    }

    pub fn open_pitch(&mut self, prospect: &ScanResult) {
        self.modal.selected = Some(prospect.clone());
        self.modal.pitch = None;
        self.modal.loading = true;
        let outcome = self.client.pitch(&prospect.name, &prospect.insight);
        self.modal.loading = false;
        match outcome {
            Ok(pitch) => self.modal.pitch = Some(pitch),
            Err(error) => self.failure("Could not generate the pitch.", &error),
        }
    }

    pub fn copy_pitch(&mut self, launcher: &mut dyn MessageLauncher) -> bool {
        let Some(message) = self.modal.pitch.as_ref().map(|pitch| pitch.message.clone()) else {
            return false;
        };
        match launcher.copy_text(&message) {
            Ok(()) => {
                self.info("Message copied!");
                true
            }
            Err(error) => {
                self.info(format!("Could not copy the message: {error}"));
                false
            }
        }
    }

    /// Sends the current pitch to the selected prospect, or copies it when
    /// the prospect has no contact handle.
    pub fn dispatch_pitch(&mut self, launcher: &mut dyn MessageLauncher) -> Option<Dispatch> {
        let (Some(prospect), Some(pitch)) = (&self.modal.selected, &self.modal.pitch) else {
            return None;
        };
        let handle = prospect.contact_handle().map(str::to_string);
        let message = pitch.message.clone();

        match handoff::dispatch(launcher, handle.as_deref(), &message) {
            Ok(Dispatch::Copied) => {
                self.info("Message copied to the clipboard!");
                Some(Dispatch::Copied)
            }
            Ok(launched) => Some(launched),
            Err(error) => {
                self.info(format!("Could not hand off the message: {error}"));
                None
            }
        }
    }
}
