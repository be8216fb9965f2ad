use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Fetch axis of an item's preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Queued,
    Completed,
    Failed,
}

impl LoadStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadStatus::Queued)
    }
}

impl Display for LoadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LoadStatus::Queued => write!(f, "queued"),
            LoadStatus::Completed => write!(f, "completed"),
            LoadStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Conversion axis of an item's preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeStatus {
    NotApplies,
    Queued,
    Succeeded,
    Failed,
}

impl TranscodeStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TranscodeStatus::Queued)
    }
}

impl Display for TranscodeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TranscodeStatus::NotApplies => write!(f, "not_applies"),
            TranscodeStatus::Queued => write!(f, "queued"),
            TranscodeStatus::Succeeded => write!(f, "succeeded"),
            TranscodeStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Two-axis preparation status of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareStatus {
    pub load: LoadStatus,
    pub transcode: TranscodeStatus,
}

impl PrepareStatus {
    pub fn new(load: LoadStatus, transcode: TranscodeStatus) -> Self {
        Self { load, transcode }
    }

    pub fn preload_done(&self) -> bool {
        self.load == LoadStatus::Completed
    }

    pub fn transcode_done(&self) -> bool {
        matches!(
            self.transcode,
            TranscodeStatus::Succeeded | TranscodeStatus::NotApplies
        )
    }

    pub fn item_done(&self) -> bool {
        self.preload_done() && self.transcode_done()
    }

    pub fn item_failed(&self) -> bool {
        self.load == LoadStatus::Failed || self.transcode == TranscodeStatus::Failed
    }

    /// Merge `patch` into this status. Terminal values are never overwritten.
    ///
    /// Returns true if any field changed.
    pub fn apply(&mut self, patch: StatusPatch) -> bool {
        let before = *self;
        if let Some(load) = patch.load {
            if !self.load.is_terminal() {
                self.load = load;
            }
        }
        if let Some(transcode) = patch.transcode {
            if !self.transcode.is_terminal() {
                self.transcode = transcode;
            }
        }
        before != *self
    }
}

/// Partial status update; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusPatch {
    pub load: Option<LoadStatus>,
    pub transcode: Option<TranscodeStatus>,
}

impl StatusPatch {
    pub fn load(status: LoadStatus) -> Self {
        Self {
            load: Some(status),
            transcode: None,
        }
    }

    pub fn transcode(status: TranscodeStatus) -> Self {
        Self {
            load: None,
            transcode: Some(status),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.load == Some(LoadStatus::Failed) || self.transcode == Some(TranscodeStatus::Failed)
    }
}

/// Batch progress: items fully prepared out of the batch size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.completed, self.total)
    }
}
