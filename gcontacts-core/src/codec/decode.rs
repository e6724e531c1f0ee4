//! XML to model mapping.

use chrono::{DateTime, Utc};

use super::tree::XmlNode;
use super::CodecError;
use crate::model::{
    Birthday, Email, Entry, Event, ExtendedProperty, Feed, GroupMembershipInfo, InstantMessenger,
    Link, Name, Organization, PhoneNumber, PhoneticName, PostalAddress, Relation,
    StructuredPostalAddress, UserDefinedField, Website, When,
};

/// Decode a single `<entry>` document.
pub fn decode_entry(data: &[u8]) -> Result<Entry, CodecError> {
    let root = XmlNode::parse(data)?;
    expect_root(&root, "entry")?;
    entry_from_node(&root)
}

/// Decode a `<feed>` document.
pub fn decode_feed(data: &[u8]) -> Result<Feed, CodecError> {
    let root = XmlNode::parse(data)?;
    expect_root(&root, "feed")?;

    Ok(Feed {
        total_results: number(&root, "totalResults")?,
        start_index: number(&root, "startIndex")?,
        items_per_page: number(&root, "itemsPerPage")?,
        entries: root
            .children_named("entry")
            .map(entry_from_node)
            .collect::<Result<_, _>>()?,
    })
}

fn expect_root(root: &XmlNode, expected: &'static str) -> Result<(), CodecError> {
    if root.name == expected {
        Ok(())
    } else {
        Err(CodecError::UnexpectedRoot {
            expected,
            found: root.name.clone(),
        })
    }
}

fn number(parent: &XmlNode, element: &str) -> Result<u64, CodecError> {
    let Some(node) = parent.child(element) else {
        return Ok(0);
    };
    let value = node.text.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value.parse().map_err(|_| CodecError::InvalidNumber {
        element: element.to_string(),
        value: value.to_string(),
    })
}

fn timestamp(value: &str) -> Result<Option<DateTime<Utc>>, CodecError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| Some(parsed.with_timezone(&Utc)))
        .map_err(|e| CodecError::InvalidTimestamp {
            value: value.to_string(),
            message: e.to_string(),
        })
}

fn entry_from_node(node: &XmlNode) -> Result<Entry, CodecError> {
    Ok(Entry {
        etag: node.attr("etag").to_string(),
        id: node.child_text("id").to_string(),
        updated: timestamp(node.child_text("updated"))?,
        title: node.child_text("title").to_string(),
        content: node.child_text("content").to_string(),
        links: node.children_named("link").map(link).collect(),

        name: node.child("name").map(name).unwrap_or_default(),
        instant_messengers: node.children_named("im").map(instant_messenger).collect(),
        organization: node.child("organization").map(organization).unwrap_or_default(),
        emails: node.children_named("email").map(email).collect(),
        phone_numbers: node.children_named("phoneNumber").map(phone_number).collect(),
        postal_addresses: node.children_named("postalAddress").map(postal_address).collect(),
        structured_postal_addresses: node
            .children_named("structuredPostalAddress")
            .map(structured_postal_address)
            .collect(),
        extended_properties: node
            .children_named("extendedProperty")
            .map(|n| ExtendedProperty {
                name: n.attr("name").to_string(),
                value: n.attr("value").to_string(),
            })
            .collect(),

        birthday: Birthday {
            when: node
                .child("birthday")
                .map(|n| n.attr("when").to_string())
                .unwrap_or_default(),
        },
        nickname: node.child_text("nickname").to_string(),
        file_as: node.child_text("fileAs").to_string(),
        events: node.children_named("event").map(event).collect(),
        relations: node
            .children_named("relation")
            .map(|n| Relation {
                rel: n.attr("rel").to_string(),
                value: n.text.clone(),
            })
            .collect(),
        user_defined_fields: node
            .children_named("userDefinedField")
            .map(|n| UserDefinedField {
                key: n.attr("key").to_string(),
                value: n.attr("value").to_string(),
            })
            .collect(),
        websites: node
            .children_named("website")
            .map(|n| Website {
                rel: n.attr("rel").to_string(),
                label: n.attr("label").to_string(),
                href: n.attr("href").to_string(),
            })
            .collect(),
        group_memberships: node
            .children_named("groupMembershipInfo")
            .map(|n| GroupMembershipInfo {
                deleted: n.attr_bool("deleted"),
                href: n.attr("href").to_string(),
            })
            .collect(),
    })
}

fn link(node: &XmlNode) -> Link {
    Link {
        rel: node.attr("rel").to_string(),
        link_type: node.attr("type").to_string(),
        href: node.attr("href").to_string(),
    }
}

fn phonetic(node: Option<&XmlNode>) -> PhoneticName {
    node.map(|n| PhoneticName {
        value: n.text.clone(),
        phonetic: n.attr("yomi").to_string(),
    })
    .unwrap_or_default()
}

fn name(node: &XmlNode) -> Name {
    Name {
        full_name: node.child_text("fullName").to_string(),
        name_prefix: node.child_text("namePrefix").to_string(),
        given_name: phonetic(node.child("givenName")),
        additional_name: node.child_text("additionalName").to_string(),
        family_name: phonetic(node.child("familyName")),
        name_suffix: node.child_text("nameSuffix").to_string(),
    }
}

fn organization(node: &XmlNode) -> Organization {
    Organization {
        rel: node.attr("rel").to_string(),
        org_name: node.child_text("orgName").to_string(),
        org_title: node.child_text("orgTitle").to_string(),
    }
}

fn email(node: &XmlNode) -> Email {
    Email {
        address: node.attr("address").to_string(),
        primary: node.attr_bool("primary"),
        label: node.attr("label").to_string(),
        rel: node.attr("rel").to_string(),
    }
}

fn instant_messenger(node: &XmlNode) -> InstantMessenger {
    InstantMessenger {
        address: node.attr("address").to_string(),
        protocol: node.attr("protocol").to_string(),
        rel: node.attr("rel").to_string(),
    }
}

fn phone_number(node: &XmlNode) -> PhoneNumber {
    PhoneNumber {
        label: node.attr("label").to_string(),
        rel: node.attr("rel").to_string(),
        uri: node.attr("uri").to_string(),
        value: node.text.clone(),
    }
}

fn postal_address(node: &XmlNode) -> PostalAddress {
    PostalAddress {
        rel: node.attr("rel").to_string(),
        primary: node.attr_bool("primary"),
        label: node.attr("label").to_string(),
        value: node.text.clone(),
    }
}

fn structured_postal_address(node: &XmlNode) -> StructuredPostalAddress {
    StructuredPostalAddress {
        rel: node.attr("rel").to_string(),
        primary: node.attr_bool("primary"),
        label: node.attr("label").to_string(),
        street: node.child_text("street").to_string(),
        pobox: node.child_text("pobox").to_string(),
        neighborhood: node.child_text("neighborhood").to_string(),
        city: node.child_text("city").to_string(),
        region: node.child_text("region").to_string(),
        postcode: node.child_text("postcode").to_string(),
        country: node.child_text("country").to_string(),
        formatted_address: node.child_text("formattedAddress").to_string(),
    }
}

fn event(node: &XmlNode) -> Event {
    Event {
        label: node.attr("label").to_string(),
        rel: node.attr("rel").to_string(),
        when: When {
            start_time: node
                .child("when")
                .map(|n| n.attr("startTime").to_string())
                .unwrap_or_default(),
        },
    }
}
