//! Wildlife Watch
//!
//! Scans a video for animals with a pretrained detector and leaves behind:
//! annotated JPEG snapshots, a rolling JSON detection history, one push alert
//! per snapshot, and a JSON run summary for the calling web backend.
//!
//! # Pipeline
//!
//! Frame source → frame sampler → detector adapter → cooldown gate →
//! snapshot writer → notifier. Snapshot records accumulate in a `RunContext`
//! and are flushed to the history store and the run result once the video is
//! exhausted.
//!
//! # Module Structure
//!
//! - `ingest`: Frame sources (local files, synthetic) and the frame sampler
//! - `detect`: Detector backends and output normalization
//! - `cooldown`: Per-species video-time cooldown
//! - `snapshot`: Annotated, downsampled JPEG storage
//! - `notify`: External push notification helper
//! - `history`: Bounded JSON detection log
//! - `pipeline`: The frame loop and its run context
//! - `run`: Validation and finalization around the pipeline
//! - `report`: Success and failure documents
//!
//! # Features
//!
//! Decoding and inference are opt-in, like the other native backends:
//!
//! - `ingest-file-ffmpeg`: decode local video files (needs FFmpeg libraries)
//! - `backend-tract`: run the ONNX detector with tract
//! - `full`: both of the above
//!
//! A production `detect_animals` is built with `cargo build --release
//! --features full`. Without these features the library and its tests still
//! build, and the binary fails at model load or video open with an error that
//! names the missing feature.

pub mod config;
pub mod cooldown;
pub mod detect;
pub mod frame;
pub mod history;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod run;
pub mod snapshot;

pub use config::WatchConfig;
pub use cooldown::CooldownGate;
pub use detect::{BoundingBox, Detection, DetectorBackend, ModelDetection, StubBackend};
pub use frame::Frame;
pub use history::{HistoryEntry, HistoryStore};
pub use ingest::{FileSource, FrameSampler, FrameSource, SyntheticSource, VideoInfo};
pub use notify::{CommandNotifier, Notifier, NullNotifier};
pub use pipeline::{Pipeline, PipelineSettings, RunContext};
pub use report::RunResult;
pub use snapshot::{AlertLevel, SnapshotRecord, SnapshotSettings, SnapshotWriter};
