//! Core business logic - framework-agnostic operations behind every endpoint.
//!
//! Functions here take a database connection and, for owned resources, the id of the
//! requesting user. They return entity models or small view structs and never know
//! about HTTP.

/// Registration, login, bearer tokens and account management
pub mod account;
/// Tax Q&A chatbot backed by a static corpus
pub mod chatbot;
/// Uploaded documents
pub mod document;
/// Google ID-token verification
pub mod identity;
/// Receipt photos
pub mod image;
/// Password hashing
pub mod password;
/// Receipts and their nested read representation
pub mod receipt;
/// Receipt line items
pub mod receipt_item;
/// Parsing OCR text of receipts
pub mod receipt_text;
/// Reports and report generation
pub mod report;
/// Payload field validation
pub mod validation;
/// Shared vendor catalogue
pub mod vendor;
