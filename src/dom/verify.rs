//! Name and Character Data Verification
//!
//! Checks run by the `Document::create_*` constructors and by
//! `Document::set_value` before anything reaches the arena. The stores
//! and views never re-validate names.
//!
//! Character classes follow XML 1.0 (fifth edition).

use memchr::memmem;

use super::node::NodeKind;
use crate::error::{DomError, Result};

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x9 | 0xA | 0xD | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// S ::= (#x20 | #x9 | #xD | #xA)+
#[inline]
pub fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// NameStartChar, including ':'
pub fn is_name_start_char(c: char) -> bool {
    matches!(c as u32,
        0x3A | 0x41..=0x5A | 0x5F | 0x61..=0x7A | 0xC0..=0xD6 | 0xD8..=0xF6 |
        0xF8..=0x2FF | 0x370..=0x37D | 0x37F..=0x1FFF | 0x200C..=0x200D |
        0x2070..=0x218F | 0x2C00..=0x2FEF | 0x3001..=0xD7FF | 0xF900..=0xFDCF |
        0xFDF0..=0xFFFD | 0x10000..=0xEFFFF
    )
}

/// NameChar, including ':'
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c as u32,
            0x2D | 0x2E | 0x30..=0x39 | 0xB7 | 0x300..=0x36F | 0x203F..=0x2040
        )
}

fn invalid_name(name: &str, reason: &'static str) -> DomError {
    DomError::InvalidName {
        name: name.to_string(),
        reason,
    }
}

fn invalid_data(kind: NodeKind, reason: &'static str) -> DomError {
    DomError::InvalidData { kind, reason }
}

/// Validate a non-colonized name (local names and prefixes)
pub fn check_ncname(name: &str) -> Result<()> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid_name(name, "name is empty")),
        Some(':') => return Err(invalid_name(name, "name contains a colon")),
        Some(c) if !is_name_start_char(c) => {
            return Err(invalid_name(name, "name starts with an illegal character"))
        }
        Some(_) => {}
    }
    for c in chars {
        if c == ':' {
            return Err(invalid_name(name, "name contains a colon"));
        }
        if !is_name_char(c) {
            return Err(invalid_name(name, "name contains an illegal character"));
        }
    }
    Ok(())
}

/// Split a qualified name into (prefix, local), validating both halves
pub fn split_qname(qname: &str) -> Result<(&str, &str)> {
    match qname.split_once(':') {
        Some((prefix, local)) => {
            check_ncname(prefix)?;
            check_ncname(local)?;
            Ok((prefix, local))
        }
        None => {
            check_ncname(qname)?;
            Ok(("", qname))
        }
    }
}

/// Split a qualified name without validating it (lenient mode)
pub fn split_qname_unchecked(qname: &str) -> (&str, &str) {
    qname.split_once(':').unwrap_or(("", qname))
}

/// Every char must be a legal XML character
pub fn check_chars(kind: NodeKind, data: &str) -> Result<()> {
    if data.chars().all(is_xml_char) {
        Ok(())
    } else {
        Err(invalid_data(kind, "contains a character not allowed in XML"))
    }
}

/// Comments may not contain `--` nor end with `-`
pub fn check_comment(data: &str) -> Result<()> {
    check_chars(NodeKind::Comment, data)?;
    if memmem::find(data.as_bytes(), b"--").is_some() {
        return Err(invalid_data(NodeKind::Comment, "contains \"--\""));
    }
    if data.ends_with('-') {
        return Err(invalid_data(NodeKind::Comment, "ends with '-'"));
    }
    Ok(())
}

/// CDATA sections may not contain their own terminator
pub fn check_cdata(data: &str) -> Result<()> {
    check_chars(NodeKind::CData, data)?;
    if memmem::find(data.as_bytes(), b"]]>").is_some() {
        return Err(invalid_data(NodeKind::CData, "contains \"]]>\""));
    }
    Ok(())
}

/// PI targets are names other than `xml` in any case
pub fn check_pi_target(target: &str) -> Result<()> {
    check_ncname(target)?;
    if target.eq_ignore_ascii_case("xml") {
        return Err(invalid_name(target, "processing instruction target is reserved"));
    }
    Ok(())
}

pub fn check_pi_data(data: &str) -> Result<()> {
    check_chars(NodeKind::ProcessingInstruction, data)?;
    if memmem::find(data.as_bytes(), b"?>").is_some() {
        return Err(invalid_data(NodeKind::ProcessingInstruction, "contains \"?>\""));
    }
    Ok(())
}

/// A system literal is quoted with `'` or `"`, so it cannot hold both
pub fn check_system_literal(literal: &str) -> Result<()> {
    check_chars(NodeKind::EntityRef, literal)?;
    if literal.contains('\'') && literal.contains('"') {
        return Err(invalid_data(
            NodeKind::EntityRef,
            "system id contains both quote characters",
        ));
    }
    Ok(())
}

/// Attribute names may not use the `xmlns` namespace machinery
pub fn check_attribute_name(prefix: &str, local: &str) -> Result<()> {
    if prefix == "xmlns" || (prefix.is_empty() && local == "xmlns") {
        return Err(invalid_name(
            local,
            "namespace declarations are not attributes",
        ));
    }
    Ok(())
}

/// Prefix/URI pairing rules for element, attribute and declaration namespaces
pub fn check_namespace(prefix: &str, uri: &str) -> Result<()> {
    if prefix == "xml" {
        if uri != ns::XML {
            return Err(invalid_name(prefix, "the xml prefix is bound to the XML namespace"));
        }
        return Ok(());
    }
    if uri == ns::XML {
        return Err(invalid_name(prefix, "the XML namespace requires the xml prefix"));
    }
    if prefix == "xmlns" || uri == ns::XMLNS {
        return Err(invalid_name(prefix, "the xmlns namespace cannot be declared"));
    }
    if !prefix.is_empty() && uri.is_empty() {
        return Err(invalid_name(prefix, "a prefix needs a non-empty namespace URI"));
    }
    Ok(())
}
