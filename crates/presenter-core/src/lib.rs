//! Presenter-Core: the manifest data model shared across iiif-presenter.
//!
//! This crate holds everything that does not touch the network:
//!
//! - **Descriptor**: the IIIF Presentation 3 manifest record and its mutation rules
//! - **Language maps**: localized multi-value strings and metadata pairs
//! - **Rights**: Creative Commons and RightsStatements.org vocabularies
//! - **Manifest ids**: the `{tag}:{escaped-sourceid}` grammar
//! - **Error handling**: the unified error type and result alias
//!
//! # Examples
//!
//! ```
//! use presenter_core::{ManifestDescriptor, ManifestId};
//!
//! let id = ManifestId::parse("gh:acct/repo/img.jpg");
//! let mut manifest = ManifestDescriptor::skeleton(&id);
//! manifest.set_format("image/jpeg");
//! assert_eq!(manifest.body_type(), Some("Image"));
//! ```

pub mod descriptor;
pub mod error;
pub mod ids;
pub mod language;
pub mod rights;

pub use descriptor::{Agent, ImageService, ManifestDescriptor, ResourceRef, BASE_URL_PLACEHOLDER};
pub use error::{Error, Result};
pub use ids::ManifestId;
pub use language::{LanguageMap, MetadataEntry};
pub use rights::{is_attribution_required, rights_url, Rights, RightsVocabulary};
