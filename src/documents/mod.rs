//! Document handling for linked files (PDFs, spreadsheets, ...)
//!
//! - `sink`: maps a document URL to a stable, sanitized local path and
//!   skips transfers for files that already exist
//! - `transfer`: the streaming transfer collaborator and its HTTP implementation

mod sink;
mod transfer;

pub use sink::{sanitize_filename, DocumentError, DocumentSink};
pub use transfer::{
    content_disposition_filename, HttpTransfer, Transfer, TransferBody, TransferError,
    TRANSFER_TIMEOUT,
};
