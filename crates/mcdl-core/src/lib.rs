pub mod config;
pub mod logging;

pub mod checksum;
pub mod downloader;
pub mod error;
pub mod gate;
pub mod http;
pub mod mirror;
pub mod probe;
pub mod progress;
pub mod request;
pub mod resources;
pub mod result;
pub mod retry;
pub mod segmenter;
pub mod storage;
pub mod transfer;

pub use config::DownloaderConfig;
pub use downloader::{DownloadHandle, Downloader};
pub use error::DownloadError;
pub use gate::ConcurrencyGate;
pub use progress::{format_size, FileSnapshot, ProgressSnapshot};
pub use request::{DownloadRequest, GroupDownloadRequest};
pub use result::{
    DownloadResult, DownloadResultKind, FailedDownload, FileEvent, GroupDownloadResult,
};
