use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a [`ParsingSession`](crate::session::ParsingSession).
///
/// Per-frame misses (a decoded frame without auxiliary metrics, a packet the
/// decoder refuses) are absorbed by the session and never show up here.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("could not probe the streams of {}: {source}", path.display())]
    StreamProbe {
        path: PathBuf,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("no video stream found")]
    NoVideoStream,
    #[error("no decoder available for codec {0}")]
    DecoderNotFound(String),
    #[error("could not initialize the {codec} decoder: {source}")]
    DecoderInit {
        codec: String,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("unsupported raw stream codec {0:?}")]
    UnsupportedCodec(String),
    #[error("malformed bitstream at byte {offset} (parser returned {consumed})")]
    MalformedStream { offset: u64, consumed: isize },
    #[error("the parsing session is closed")]
    Closed,
    #[error("raw bytes can only be fed to a raw-mode session")]
    NotRawMode,
    #[error("input was already finished, no more bytes can be fed")]
    InputFinished,
    #[error(transparent)]
    Engine(#[from] ffmpeg::Error),
}

impl ParseError {
    /// Whether the error happened while building the session, as opposed to
    /// while iterating it.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::Open { .. }
                | Self::StreamProbe { .. }
                | Self::NoVideoStream
                | Self::DecoderNotFound(_)
                | Self::DecoderInit { .. }
                | Self::UnsupportedCodec(_)
        )
    }
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
