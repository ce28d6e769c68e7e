use serde::Serialize;

/// A file picked by the user, held in memory until the next selection replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub data_url: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    #[default]
    Idle,
    FileSelected,
    Submitting,
    Success,
    Error,
}

/// What a submit request ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Rendered { entries: usize },
    Failed,
    Ignored { reason: IgnoreReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    NoFileSelected,
    AlreadySubmitting,
}

/// What a file selection ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectOutcome {
    NoFile,
    Previewed,
    Rejected,
    Superseded,
}
