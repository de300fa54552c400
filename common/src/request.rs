use serde::{Deserialize, Serialize};

/// A request to start one job on a dedicated worker process.
///
/// The JSON form of this struct is the `--request` payload a worker receives,
/// so field names follow the camelCase wire convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub job_id: String,
    #[serde(default)]
    pub room_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub ws_url: String,
    pub request: JobKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobKind {
    RoomComposite(RoomCompositeRequest),
    Web(WebRequest),
    TrackComposite(TrackCompositeRequest),
    Track(TrackRequest),
}

/// Admission class of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobClass {
    /// Needs the shared rendering surface, so it may only run alone.
    Compositing,
    Other,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomCompositeRequest {
    pub room_name: String,
    pub layout: String,
    pub audio_only: bool,
    pub video_only: bool,
    pub custom_base_url: String,
    pub output: Output,
    pub options: Option<EncodingOptions>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebRequest {
    pub url: String,
    pub audio_only: bool,
    pub video_only: bool,
    pub output: Output,
    pub options: Option<EncodingOptions>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackCompositeRequest {
    pub room_name: String,
    pub audio_track_id: String,
    pub video_track_id: String,
    pub output: Output,
    pub options: Option<EncodingOptions>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackRequest {
    pub room_name: String,
    pub track_id: String,
    pub output: Output,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Output {
    File(EncodedFileOutput),
    Stream(StreamOutput),
    Segments(SegmentedFileOutput),
}

impl Default for Output {
    fn default() -> Self {
        Output::File(EncodedFileOutput::default())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodedFileOutput {
    pub file_type: FileType,
    pub filepath: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    #[default]
    Mp4,
    Ogg,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamOutput {
    pub protocol: StreamProtocol,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StreamProtocol {
    #[default]
    Rtmp,
    Srt,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentedFileOutput {
    pub filename_prefix: String,
    pub playlist_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodingOptions {
    pub audio_codec: String,
    pub video_codec: String,
    pub width: u32,
    pub height: u32,
    pub video_bitrate: u32,
}

/// Keys that share the status object with job ids.
pub const RESERVED_JOB_IDS: [&str; 1] = ["cpuLoad"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("job id is empty")]
    MissingJobId,
    #[error("job id {0:?} is reserved")]
    ReservedJobId(String),
    #[error("stream output for job {0} has no urls")]
    MissingStreamUrls(String),
}

impl JobRequest {
    pub fn class(&self) -> JobClass {
        self.request.class()
    }

    pub fn output(&self) -> &Output {
        match &self.request {
            JobKind::RoomComposite(r) => &r.output,
            JobKind::Web(r) => &r.output,
            JobKind::TrackComposite(r) => &r.output,
            JobKind::Track(r) => &r.output,
        }
    }

    /// Checks the facts the supervisor relies on before launching a worker.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.job_id.trim().is_empty() {
            return Err(RequestError::MissingJobId);
        }
        if RESERVED_JOB_IDS.contains(&self.job_id.as_str()) {
            return Err(RequestError::ReservedJobId(self.job_id.clone()));
        }
        if let Output::Stream(stream) = self.output() {
            if stream.urls.is_empty() {
                return Err(RequestError::MissingStreamUrls(self.job_id.clone()));
            }
        }
        Ok(())
    }
}

impl JobKind {
    pub fn class(&self) -> JobClass {
        match self {
            JobKind::RoomComposite(_) | JobKind::Web(_) => JobClass::Compositing,
            JobKind::TrackComposite(_) | JobKind::Track(_) => JobClass::Other,
        }
    }
}
