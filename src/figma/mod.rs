//! Figma integration: REST client, API types and document decoding.
//!
//! - [`FigmaClient`] - HTTP client for the Figma REST API
//! - [`decode_document`] - raw node JSON to [`crate::types::DocumentNode`]

pub mod api_types;
pub mod client;
pub mod conversion;


pub use client::{map_figma_error, FigmaAuth, FigmaClient, FigmaError};
pub use conversion::{decode_document, decode_owned, parse_json, release, DecodedDocument};

pub use api_types::{FigmaFileResponse, FigmaNodesResponse};
