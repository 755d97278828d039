use std::{io, str::Utf8Error, sync::Arc};

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Low-level failure raised while turning decoder events into nodes.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error("invalid attribute: {0}")]
    Attribute(#[from] AttrError),
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),
}

#[derive(Error, Debug)]
pub enum IngestError {
    /// The input could not be decoded as XML, even after root wrapping.
    /// `position` is a byte offset into the caller's input.
    #[error("malformed document at byte {position}: {source}")]
    MalformedDocument {
        position: u64,
        #[source]
        source: DecodeError,
    },
    #[error("failed to read document: {0}")]
    Read(#[source] Arc<io::Error>),
}

impl IngestError {
    pub(crate) fn from_decode(position: u64, source: DecodeError) -> Self {
        match source {
            DecodeError::Xml(quick_xml::Error::Io(err)) => Self::Read(err),
            source => Self::MalformedDocument { position, source },
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedDocument { .. })
    }
}
