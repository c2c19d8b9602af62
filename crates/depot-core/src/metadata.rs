//! Metadata field selection and query encoding
//!
//! A metadata request selects which file attributes the storage service
//! should return. The selection travels as `key=true` tokens, one per field,
//! in the fixed order of [`MetadataField::ORDER`].

use crate::flags::{Flag, FlagSet};
use serde::{Deserialize, Serialize};

/// A file metadata attribute that can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataField {
    /// Size in bytes
    Size,
    /// MIME type
    MimeType,
    /// Original filename
    FileName,
    /// Image width
    Width,
    /// Image height
    Height,
    /// Upload timestamp
    Uploaded,
    /// Whether the file can be overwritten
    Writeable,
    /// Cloud provider the file came from
    Cloud,
    /// URL the file was imported from
    SourceUrl,
    /// MD5 digest
    Md5,
    /// SHA-224 digest
    Sha224,
    /// SHA-256 digest
    Sha256,
    /// SHA-384 digest
    Sha384,
    /// SHA-512 digest
    Sha512,
    /// Storage location
    Location,
    /// Storage path
    Path,
    /// Storage container or bucket
    Container,
    /// Embedded EXIF data
    Exif,
}

impl Flag for MetadataField {
    const UNIVERSE_NAME: &'static str = "metadata";
    const TABLE_VERSION: u16 = 1;
    const ORDER: &'static [Self] = &[
        MetadataField::Size,
        MetadataField::MimeType,
        MetadataField::FileName,
        MetadataField::Width,
        MetadataField::Height,
        MetadataField::Uploaded,
        MetadataField::Writeable,
        MetadataField::Cloud,
        MetadataField::SourceUrl,
        MetadataField::Md5,
        MetadataField::Sha224,
        MetadataField::Sha256,
        MetadataField::Sha384,
        MetadataField::Sha512,
        MetadataField::Location,
        MetadataField::Path,
        MetadataField::Container,
        MetadataField::Exif,
    ];

    fn bit(self) -> u64 {
        match self {
            MetadataField::Size => 1 << 0,
            MetadataField::MimeType => 1 << 1,
            MetadataField::FileName => 1 << 2,
            MetadataField::Width => 1 << 3,
            MetadataField::Height => 1 << 4,
            MetadataField::Uploaded => 1 << 5,
            MetadataField::Writeable => 1 << 6,
            MetadataField::Cloud => 1 << 7,
            MetadataField::SourceUrl => 1 << 8,
            MetadataField::Md5 => 1 << 9,
            MetadataField::Sha224 => 1 << 10,
            MetadataField::Sha256 => 1 << 11,
            MetadataField::Sha384 => 1 << 12,
            MetadataField::Sha512 => 1 << 13,
            MetadataField::Location => 1 << 14,
            MetadataField::Path => 1 << 15,
            MetadataField::Container => 1 << 16,
            MetadataField::Exif => 1 << 17,
        }
    }

    fn token(self) -> &'static str {
        match self {
            MetadataField::Size => "size",
            MetadataField::MimeType => "mimetype",
            MetadataField::FileName => "filename",
            MetadataField::Width => "width",
            MetadataField::Height => "height",
            MetadataField::Uploaded => "uploaded",
            MetadataField::Writeable => "writeable",
            MetadataField::Cloud => "cloud",
            MetadataField::SourceUrl => "source_url",
            MetadataField::Md5 => "md5",
            MetadataField::Sha224 => "sha224",
            MetadataField::Sha256 => "sha256",
            MetadataField::Sha384 => "sha384",
            MetadataField::Sha512 => "sha512",
            MetadataField::Location => "location",
            MetadataField::Path => "path",
            MetadataField::Container => "container",
            MetadataField::Exif => "exif",
        }
    }
}

const ENABLED: &str = "true";

/// Encodes metadata selections to request tokens and back
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataQueryEncoder;

impl MetadataQueryEncoder {
    /// One `key=true` token per selected field, in canonical order
    pub fn encode(fields: FlagSet<MetadataField>) -> Vec<String> {
        fields
            .iter()
            .map(|field| format!("{}={ENABLED}", field.token()))
            .collect()
    }

    /// Encoded tokens joined with `&`, ready to append to a request
    pub fn to_query_string(fields: FlagSet<MetadataField>) -> String {
        Self::encode(fields).join("&")
    }

    /// Rebuild a selection from `key=value` tokens.
    ///
    /// Unknown keys are skipped. A known key only selects its field when the
    /// value is `true`.
    pub fn decode<I, S>(tokens: I) -> FlagSet<MetadataField>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = FlagSet::empty();
        for token in tokens {
            let token = token.as_ref();
            let (key, value) = token.split_once('=').unwrap_or((token, ""));
            match MetadataField::from_token(key) {
                Some(field) if value == ENABLED => fields = fields.with(field),
                Some(_) => {}
                None => tracing::debug!(key, "Ignoring unknown metadata key"),
            }
        }
        fields
    }

    /// Decode an `&`-joined query string
    pub fn decode_query(query: &str) -> FlagSet<MetadataField> {
        Self::decode(query.split('&').filter(|token| !token.is_empty()))
    }
}
