//! Atom/GData XML codec for entries and feeds.
//!
//! Decoding matches elements by local name, so documents are accepted whatever
//! prefixes the server chose. Unknown elements are skipped and missing ones
//! leave the model's zero value in place.
//!
//! Encoding binds every element to its namespace as it is written: the root
//! declares the Atom default namespace plus the `gd` and `gContact` prefixes,
//! and each child name is looked up in [`Namespace::of`]. Containers that are
//! entirely empty (`name`, `organization`, `birthday`) are not emitted.

use thiserror::Error;

mod decode;
mod encode;
mod tree;

pub use decode::{decode_entry, decode_feed};
pub use encode::encode_entry;

/// Atom namespace URI.
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
/// GData ("directory-standard") namespace URI.
pub const GD_NS: &str = "http://schemas.google.com/g/2005";
/// Contacts extension namespace URI.
pub const GCONTACT_NS: &str = "http://schemas.google.com/contact/2008";

/// Elements written with the `gd:` prefix.
pub const GD_TAGS: &[&str] = &[
    "name",
    "fullName",
    "namePrefix",
    "givenName",
    "additionalName",
    "familyName",
    "nameSuffix",
    "extendedProperty",
    "organization",
    "orgName",
    "orgTitle",
    "email",
    "im",
    "phoneNumber",
    "postalAddress",
    "structuredPostalAddress",
    "formattedAddress",
    "street",
    "pobox",
    "neighborhood",
    "city",
    "region",
    "postcode",
    "country",
    "when",
];

/// Elements written with the `gContact:` prefix.
pub const GCONTACT_TAGS: &[&str] = &[
    "groupMembershipInfo",
    "nickname",
    "birthday",
    "fileAs",
    "event",
    "relation",
    "userDefinedField",
    "website",
];

/// Namespace family of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Atom,
    Gd,
    GContact,
}

impl Namespace {
    /// Namespace of a tag, by exact name match. Anything unlisted is Atom.
    pub fn of(tag: &str) -> Self {
        if GD_TAGS.contains(&tag) {
            Namespace::Gd
        } else if GCONTACT_TAGS.contains(&tag) {
            Namespace::GContact
        } else {
            Namespace::Atom
        }
    }

    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Namespace::Atom => None,
            Namespace::Gd => Some("gd"),
            Namespace::GContact => Some("gContact"),
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Atom => ATOM_NS,
            Namespace::Gd => GD_NS,
            Namespace::GContact => GCONTACT_NS,
        }
    }

    /// The qualified name a tag is written as.
    pub fn qualify(tag: &str) -> String {
        match Self::of(tag).prefix() {
            Some(prefix) => format!("{}:{}", prefix, tag),
            None => tag.to_string(),
        }
    }
}

/// Error type for XML encoding and decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The document is not well-formed XML.
    #[error("malformed XML: {message}")]
    Xml { message: String },

    /// The document's root element is not the expected one.
    #[error("expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot { expected: &'static str, found: String },

    /// The document has no root element.
    #[error("empty XML document")]
    EmptyDocument,

    /// A timestamp element does not hold an RFC 3339 value.
    #[error("invalid timestamp {value:?}: {message}")]
    InvalidTimestamp { value: String, message: String },

    /// A numeric element does not hold a number.
    #[error("invalid number in <{element}>: {value:?}")]
    InvalidNumber { element: String, value: String },

    /// Writing the document failed.
    #[error("failed to encode XML: {message}")]
    Encode { message: String },
}

impl From<quick_xml::Error> for CodecError {
    fn from(err: quick_xml::Error) -> Self {
        CodecError::Xml {
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for CodecError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        CodecError::Xml {
            message: err.to_string(),
        }
    }
}
