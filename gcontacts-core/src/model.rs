//! Domain model types for the contacts feed.
//!
//! This module defines:
//! - [`Entry`] - A single contact (or group) resource with all its sub-objects
//! - [`Feed`] - One page of entries returned by a feed query
//! - [`ContactQuery`] / [`GroupQuery`] - Feed query parameters
//! - [`ContactImage`] - A downloaded contact photo
//! - [`EditableResource`] - Capability trait for resources that can be saved
//!
//! Everything here is a plain value; each fetch produces fresh instances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError};

/// Page size used by [`ContactQuery::default`].
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Page size used by [`ContactQuery::everything`].
pub const SINGLE_PAGE_SIZE: u32 = 10_000;

/// One page of a contacts or groups feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub total_results: u64,
    pub start_index: u64,
    pub items_per_page: u64,
    pub entries: Vec<Entry>,
}

/// A directory entry.
///
/// Fields under "gd" and "gContact" mirror the two XML namespace families the
/// entry codec binds them to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Entity tag used for conditional writes.
    pub etag: String,
    /// Resource URI.
    pub id: String,
    pub updated: Option<DateTime<Utc>>,
    pub title: String,
    pub content: String,
    pub links: Vec<Link>,

    // gd
    pub name: Name,
    pub instant_messengers: Vec<InstantMessenger>,
    pub organization: Organization,
    pub emails: Vec<Email>,
    pub phone_numbers: Vec<PhoneNumber>,
    pub postal_addresses: Vec<PostalAddress>,
    pub structured_postal_addresses: Vec<StructuredPostalAddress>,
    pub extended_properties: Vec<ExtendedProperty>,

    // gContact
    pub birthday: Birthday,
    pub nickname: String,
    pub file_as: String,
    pub events: Vec<Event>,
    pub relations: Vec<Relation>,
    pub user_defined_fields: Vec<UserDefinedField>,
    pub websites: Vec<Website>,
    pub group_memberships: Vec<GroupMembershipInfo>,
}

impl Entry {
    /// The short identifier: everything after the last `/` of [`id`](Entry::id).
    ///
    /// ```
    /// use gcontacts_core::Entry;
    ///
    /// let entry = Entry {
    ///     id: "http://www.google.com/m8/feeds/contacts/default/full/abc123".to_string(),
    ///     ..Entry::default()
    /// };
    /// assert_eq!(entry.local_id(), "abc123");
    /// ```
    pub fn local_id(&self) -> &str {
        match self.id.rfind('/') {
            Some(pos) => &self.id[pos + 1..],
            None => &self.id,
        }
    }

    /// Find a link by its `rel` attribute.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == rel)
    }

    /// The `href` of the contact photo link, if the entry has one.
    pub fn photo_href(&self) -> Option<&str> {
        self.link(PHOTO_REL).map(|link| link.href.as_str())
    }
}

/// `rel` of the link pointing at a contact's photo.
pub const PHOTO_REL: &str = "http://schemas.google.com/contacts/2008/rel#photo";

/// Structured name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Name {
    pub full_name: String,
    pub name_prefix: String,
    pub given_name: PhoneticName,
    pub additional_name: String,
    pub family_name: PhoneticName,
    pub name_suffix: String,
}

impl Name {
    /// An all-empty name is treated as absent.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_empty()
            && self.name_prefix.is_empty()
            && self.given_name.is_empty()
            && self.additional_name.is_empty()
            && self.family_name.is_empty()
            && self.name_suffix.is_empty()
    }
}

/// A name part with an optional phonetic (yomi) reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneticName {
    pub value: String,
    pub phonetic: String,
}

impl PhoneticName {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            phonetic: String::new(),
        }
    }

    pub fn with_phonetic(mut self, phonetic: impl Into<String>) -> Self {
        self.phonetic = phonetic.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.phonetic.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub rel: String,
    pub org_name: String,
    pub org_title: String,
}

impl Organization {
    /// An organization with no rel, no name and no title is treated as absent.
    pub fn is_empty(&self) -> bool {
        self.rel.is_empty() && self.org_name.is_empty() && self.org_title.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub address: String,
    pub primary: bool,
    pub label: String,
    pub rel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstantMessenger {
    pub address: String,
    pub protocol: String,
    pub rel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub label: String,
    pub rel: String,
    pub uri: String,
    pub value: String,
}

/// Free-form postal address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub rel: String,
    pub primary: bool,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredPostalAddress {
    pub rel: String,
    pub primary: bool,
    pub label: String,
    pub street: String,
    pub pobox: String,
    pub neighborhood: String,
    pub city: String,
    pub region: String,
    pub postcode: String,
    pub country: String,
    pub formatted_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Birthday {
    /// `YYYY-MM-DD` or `--MM-DD`.
    pub when: String,
}

impl Birthday {
    pub fn is_empty(&self) -> bool {
        self.when.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub label: String,
    pub rel: String,
    pub when: When,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct When {
    pub start_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub rel: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserDefinedField {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Website {
    pub rel: String,
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMembershipInfo {
    pub deleted: bool,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub link_type: String,
    pub href: String,
}

/// Parameters for a contacts feed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactQuery {
    /// Free-text filter (`q`).
    pub query: Option<String>,
    /// Page size (`max-results`).
    pub max_results: u32,
    /// 1-based offset of the first entry (`start-index`).
    pub start_index: u32,
    /// Restrict to members of this group URI (`group`).
    pub group: Option<String>,
}

impl Default for ContactQuery {
    fn default() -> Self {
        Self {
            query: None,
            max_results: DEFAULT_PAGE_SIZE,
            start_index: 1,
            group: None,
        }
    }
}

impl ContactQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// A query asking for every contact in a single oversized page.
    pub fn everything() -> Self {
        Self {
            max_results: SINGLE_PAGE_SIZE,
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Parameters for a groups feed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupQuery {
    pub query: Option<String>,
    pub max_results: u32,
    pub start_index: u32,
}

impl Default for GroupQuery {
    fn default() -> Self {
        Self {
            query: None,
            max_results: DEFAULT_PAGE_SIZE,
            start_index: 1,
        }
    }
}

/// A downloaded contact photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactImage {
    pub data: Vec<u8>,
    /// The response's declared `Content-Type`, if any.
    pub content_type: Option<String>,
}

/// Something that can be written back with a conditional PUT.
pub trait EditableResource {
    /// URI the resource is written to.
    fn edit_uri(&self) -> &str;

    /// Entity tag the write is conditioned on.
    fn etag(&self) -> &str;

    /// The Atom XML document sent as the request body.
    fn to_xml(&self) -> Result<String, CodecError>;
}

impl EditableResource for Entry {
    fn edit_uri(&self) -> &str {
        &self.id
    }

    fn etag(&self) -> &str {
        &self.etag
    }

    fn to_xml(&self) -> Result<String, CodecError> {
        codec::encode_entry(self)
    }
}
