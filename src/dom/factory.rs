//! Node construction
//!
//! Every item enters the arena through one of these constructors,
//! detached. With `DocumentOptions::verify` set, names and character
//! data are checked first; a rejected call allocates nothing.

use super::document::Document;
use super::node::{NodeId, NodeKind, XmlNode};
use super::verify;
use crate::error::{DomError, Result};

impl Document {
    fn split_name<'n>(&self, qname: &'n str) -> Result<(&'n str, &'n str)> {
        if self.options.verify {
            verify::split_qname(qname)
        } else {
            Ok(verify::split_qname_unchecked(qname))
        }
    }

    /// Element with no namespace
    pub fn create_element(&mut self, qname: &str) -> Result<NodeId> {
        self.create_element_ns(qname, "")
    }

    /// Element `prefix:local` in namespace `uri`
    pub fn create_element_ns(&mut self, qname: &str, uri: &str) -> Result<NodeId> {
        let (prefix, local) = self.split_name(qname)?;
        if self.options.verify {
            verify::check_namespace(prefix, uri)?;
        }
        let name_id = self.strings.intern(local);
        let prefix_id = self.strings.intern(prefix);
        let namespace_id = self.strings.intern(uri);
        Ok(self.push_node(XmlNode::element(name_id, prefix_id, namespace_id)))
    }

    pub fn create_text(&mut self, text: &str) -> Result<NodeId> {
        if self.options.verify {
            verify::check_chars(NodeKind::Text, text)?;
        }
        Ok(self.push_node(XmlNode::character_data(NodeKind::Text, text.to_string())))
    }

    pub fn create_cdata(&mut self, text: &str) -> Result<NodeId> {
        if self.options.verify {
            verify::check_cdata(text)?;
        }
        Ok(self.push_node(XmlNode::character_data(NodeKind::CData, text.to_string())))
    }

    pub fn create_comment(&mut self, text: &str) -> Result<NodeId> {
        if self.options.verify {
            verify::check_comment(text)?;
        }
        Ok(self.push_node(XmlNode::character_data(NodeKind::Comment, text.to_string())))
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> Result<NodeId> {
        if self.options.verify {
            verify::check_pi_target(target)?;
            verify::check_pi_data(data)?;
        }
        let target_id = self.strings.intern(target);
        Ok(self.push_node(XmlNode::processing_instruction(target_id, data.to_string())))
    }

    /// Unexpanded `&name;`, optionally remembering where it points
    pub fn create_entity_ref(&mut self, name: &str, system_id: &str) -> Result<NodeId> {
        if self.options.verify {
            verify::split_qname(name)?;
            verify::check_system_literal(system_id)?;
        }
        let name_id = self.strings.intern(name);
        Ok(self.push_node(XmlNode::entity_ref(name_id, system_id.to_string())))
    }

    /// Attribute with no namespace
    pub fn create_attribute(&mut self, qname: &str, value: &str) -> Result<NodeId> {
        self.create_attribute_ns(qname, value, "")
    }

    pub fn create_attribute_ns(&mut self, qname: &str, value: &str, uri: &str) -> Result<NodeId> {
        let (prefix, local) = self.split_name(qname)?;
        if self.options.verify {
            verify::check_attribute_name(prefix, local)?;
            if prefix.is_empty() && !uri.is_empty() {
                return Err(DomError::InvalidName {
                    name: qname.to_string(),
                    reason: "an attribute in a namespace needs a prefix",
                });
            }
            verify::check_namespace(prefix, uri)?;
            verify::check_chars(NodeKind::Attribute, value)?;
        }
        let name_id = self.strings.intern(local);
        let prefix_id = self.strings.intern(prefix);
        let namespace_id = self.strings.intern(uri);
        Ok(self.push_node(XmlNode::attribute(
            name_id,
            prefix_id,
            namespace_id,
            value.to_string(),
        )))
    }

    /// `xmlns:prefix="uri"`, or `xmlns="uri"` for an empty prefix
    pub fn create_namespace_decl(&mut self, prefix: &str, uri: &str) -> Result<NodeId> {
        if self.options.verify {
            if !prefix.is_empty() {
                verify::check_ncname(prefix)?;
            }
            verify::check_namespace(prefix, uri)?;
        }
        let prefix_id = self.strings.intern(prefix);
        let uri_id = self.strings.intern(uri);
        Ok(self.push_node(XmlNode::namespace_decl(prefix_id, uri_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DocumentOptions;

    #[test]
    fn test_created_nodes_are_detached() {
        let mut doc = Document::new();
        let ids = [
            doc.create_element("a").unwrap(),
            doc.create_text("t").unwrap(),
            doc.create_cdata("c").unwrap(),
            doc.create_comment("k").unwrap(),
            doc.create_processing_instruction("pi", "data").unwrap(),
            doc.create_entity_ref("ent", "ent.xml").unwrap(),
            doc.create_attribute("x", "1").unwrap(),
            doc.create_namespace_decl("p", "urn:p").unwrap(),
        ];
        for id in ids {
            assert_eq!(doc.owner(id), None);
        }
        assert_eq!(doc.kind(ids[4]), Some(NodeKind::ProcessingInstruction));
        assert_eq!(doc.name(ids[4]), Some("pi"));
        assert_eq!(doc.value(ids[4]), Some("data"));
        assert_eq!(doc.value(ids[7]), Some("urn:p"));
        assert_eq!(doc.prefix(ids[7]), Some("p"));
    }

    #[test]
    fn test_invalid_input_allocates_nothing() {
        let mut doc = Document::new();
        let before = doc.node_count();
        assert!(matches!(doc.create_element("1bad"), Err(DomError::InvalidName { .. })));
        assert!(matches!(doc.create_comment("a--b"), Err(DomError::InvalidData { .. })));
        assert!(doc.create_attribute("xmlns", "urn:x").is_err());
        assert!(doc.create_attribute_ns("id", "1", "urn:x").is_err());
        assert!(doc.create_element_ns("p:el", "").is_err());
        assert!(doc.create_processing_instruction("xml", "").is_err());
        assert_eq!(doc.node_count(), before);
    }

    #[test]
    fn test_lenient_mode_accepts_anything() {
        let mut doc = Document::with_options(DocumentOptions {
            verify: false,
            ..DocumentOptions::default()
        });
        let el = doc.create_element("1bad").unwrap();
        assert_eq!(doc.name(el), Some("1bad"));
        doc.create_comment("a--b").unwrap();
    }
}
