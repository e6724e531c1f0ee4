//! Model to XML mapping.

use chrono::SecondsFormat;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{CodecError, Namespace, GCONTACT_NS, GD_NS};
use crate::model::Entry;

/// Encode an entry as an Atom `<entry>` document suitable for a PUT body.
///
/// Attributes with empty values are left out, as are empty leaf elements and
/// empty `name`, `organization` and `birthday` containers. An organization
/// that only carries a `rel` is written as an empty element.
pub fn encode_entry(entry: &Entry) -> Result<String, CodecError> {
    let mut out = XmlOut::new();
    out.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("entry");
    root.push_attribute(("xmlns", Namespace::Atom.uri()));
    root.push_attribute(("xmlns:gd", GD_NS));
    root.push_attribute(("xmlns:gContact", GCONTACT_NS));
    if !entry.etag.is_empty() {
        root.push_attribute(("gd:etag", entry.etag.as_str()));
    }
    out.emit(Event::Start(root))?;

    // atom
    out.leaf("id", entry.id.as_str())?;
    if let Some(updated) = entry.updated {
        out.text("updated", &[], &updated.to_rfc3339_opts(SecondsFormat::AutoSi, true))?;
    }
    out.text("title", &[], &entry.title)?;
    out.leaf("content", entry.content.as_str())?;
    for link in &entry.links {
        out.empty(
            "link",
            &[
                ("rel", link.rel.as_str()),
                ("type", link.link_type.as_str()),
                ("href", link.href.as_str()),
            ],
        )?;
    }

    // gd
    if !entry.name.is_empty() {
        let name = &entry.name;
        out.open("name", &[])?;
        out.leaf("fullName", name.full_name.as_str())?;
        out.leaf("namePrefix", name.name_prefix.as_str())?;
        if !name.given_name.is_empty() {
            out.text(
                "givenName",
                &[("yomi", name.given_name.phonetic.as_str())],
                &name.given_name.value,
            )?;
        }
        out.leaf("additionalName", name.additional_name.as_str())?;
        if !name.family_name.is_empty() {
            out.text(
                "familyName",
                &[("yomi", name.family_name.phonetic.as_str())],
                &name.family_name.value,
            )?;
        }
        out.leaf("nameSuffix", name.name_suffix.as_str())?;
        out.close("name")?;
    }

    for im in &entry.instant_messengers {
        out.empty(
            "im",
            &[
                ("address", im.address.as_str()),
                ("protocol", im.protocol.as_str()),
                ("rel", im.rel.as_str()),
            ],
        )?;
    }

    let org = &entry.organization;
    if org.org_name.is_empty() && org.org_title.is_empty() {
        if !org.rel.is_empty() {
            out.empty("organization", &[("rel", org.rel.as_str())])?;
        }
    } else {
        out.open("organization", &[("rel", org.rel.as_str())])?;
        out.leaf("orgName", org.org_name.as_str())?;
        out.leaf("orgTitle", org.org_title.as_str())?;
        out.close("organization")?;
    }

    for email in &entry.emails {
        out.empty(
            "email",
            &[
                ("address", email.address.as_str()),
                ("primary", flag(email.primary)),
                ("label", email.label.as_str()),
                ("rel", email.rel.as_str()),
            ],
        )?;
    }

    for phone in &entry.phone_numbers {
        out.text(
            "phoneNumber",
            &[
                ("label", phone.label.as_str()),
                ("rel", phone.rel.as_str()),
                ("uri", phone.uri.as_str()),
            ],
            &phone.value,
        )?;
    }

    for address in &entry.postal_addresses {
        out.text(
            "postalAddress",
            &[
                ("rel", address.rel.as_str()),
                ("primary", flag(address.primary)),
                ("label", address.label.as_str()),
            ],
            &address.value,
        )?;
    }

    for address in &entry.structured_postal_addresses {
        out.open(
            "structuredPostalAddress",
            &[
                ("rel", address.rel.as_str()),
                ("primary", flag(address.primary)),
                ("label", address.label.as_str()),
            ],
        )?;
        out.leaf("street", address.street.as_str())?;
        out.leaf("pobox", address.pobox.as_str())?;
        out.leaf("neighborhood", address.neighborhood.as_str())?;
        out.leaf("city", address.city.as_str())?;
        out.leaf("region", address.region.as_str())?;
        out.leaf("postcode", address.postcode.as_str())?;
        out.leaf("country", address.country.as_str())?;
        out.leaf("formattedAddress", address.formatted_address.as_str())?;
        out.close("structuredPostalAddress")?;
    }

    for property in &entry.extended_properties {
        out.empty(
            "extendedProperty",
            &[("name", property.name.as_str()), ("value", property.value.as_str())],
        )?;
    }

    // gContact
    if !entry.birthday.is_empty() {
        out.empty("birthday", &[("when", entry.birthday.when.as_str())])?;
    }
    out.leaf("nickname", entry.nickname.as_str())?;
    out.leaf("fileAs", entry.file_as.as_str())?;

    for event in &entry.events {
        let attrs = [("label", event.label.as_str()), ("rel", event.rel.as_str())];
        if event.when.start_time.is_empty() {
            out.empty("event", &attrs)?;
        } else {
            out.open("event", &attrs)?;
            out.empty("when", &[("startTime", event.when.start_time.as_str())])?;
            out.close("event")?;
        }
    }

    for relation in &entry.relations {
        out.text("relation", &[("rel", relation.rel.as_str())], &relation.value)?;
    }

    for field in &entry.user_defined_fields {
        out.empty(
            "userDefinedField",
            &[("key", field.key.as_str()), ("value", field.value.as_str())],
        )?;
    }

    for website in &entry.websites {
        out.empty(
            "website",
            &[
                ("href", website.href.as_str()),
                ("rel", website.rel.as_str()),
                ("label", website.label.as_str()),
            ],
        )?;
    }

    for membership in &entry.group_memberships {
        out.empty(
            "groupMembershipInfo",
            &[
                ("deleted", if membership.deleted { "true" } else { "false" }),
                ("href", membership.href.as_str()),
            ],
        )?;
    }

    out.emit(Event::End(BytesEnd::new("entry")))?;
    out.finish()
}

fn flag(value: bool) -> &'static str {
    if value { "true" } else { "" }
}

/// Event writer that qualifies element names as it goes.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), CodecError> {
        self.writer
            .write_event(event)
            .map_err(|e| CodecError::Encode {
                message: e.to_string(),
            })
    }

    fn start(tag: &str, attrs: &[(&str, &str)]) -> BytesStart<'static> {
        let mut start = BytesStart::new(Namespace::qualify(tag));
        for (key, value) in attrs {
            if !value.is_empty() {
                start.push_attribute((*key, *value));
            }
        }
        start
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<(), CodecError> {
        self.emit(Event::Start(Self::start(tag, attrs)))
    }

    fn close(&mut self, tag: &str) -> Result<(), CodecError> {
        self.emit(Event::End(BytesEnd::new(Namespace::qualify(tag))))
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<(), CodecError> {
        self.emit(Event::Empty(Self::start(tag, attrs)))
    }

    fn text(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) -> Result<(), CodecError> {
        self.open(tag, attrs)?;
        self.emit(Event::Text(BytesText::new(text)))?;
        self.close(tag)
    }

    /// Text element written only when the text is non-empty.
    fn leaf(&mut self, tag: &str, text: &str) -> Result<(), CodecError> {
        if text.is_empty() {
            return Ok(());
        }
        self.text(tag, &[], text)
    }

    fn finish(self) -> Result<String, CodecError> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| CodecError::Encode {
            message: e.to_string(),
        })
    }
}
