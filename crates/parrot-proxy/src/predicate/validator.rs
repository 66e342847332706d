//! Validation capabilities used by the JSON schema, XML and XPath body matchers.
//!
//! Matchers only depend on [`BodyValidator`]. [`StandardValidator`] is the
//! built-in implementation: the JSON schema subset in `json_schema`, and
//! sxd-document / sxd-xpath for XML.

use super::json_schema;
use std::collections::BTreeMap;
use std::fmt;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;
use tracing::{debug, warn};

pub trait BodyValidator: Send + Sync + fmt::Debug {
    /// Whether `candidate` is valid against the JSON schema text `schema`.
    fn json_schema_valid(&self, schema: &str, candidate: &str) -> bool;

    /// Whether `xpath` evaluates truthy against the XML `candidate`.
    fn xpath_truthy(&self, xpath: &str, candidate: &str) -> bool;

    /// Whether two XML documents are equal, ignoring insignificant
    /// whitespace, comments and attribute order.
    fn xml_equivalent(&self, expected: &str, candidate: &str) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StandardValidator;

impl BodyValidator for StandardValidator {
    fn json_schema_valid(&self, schema: &str, candidate: &str) -> bool {
        let schema: serde_json::Value = match serde_json::from_str(schema) {
            Ok(schema) => schema,
            Err(e) => {
                warn!("JSON schema is not valid JSON: {}", e);
                return false;
            }
        };
        match serde_json::from_str(candidate) {
            Ok(instance) => json_schema::is_valid(&schema, &instance),
            Err(_) => {
                debug!("Body is not JSON, schema does not match");
                false
            }
        }
    }

    fn xpath_truthy(&self, xpath: &str, candidate: &str) -> bool {
        use sxd_xpath::{evaluate_xpath, Value};

        let package = match parser::parse(candidate) {
            Ok(package) => package,
            Err(_) => {
                debug!("Body is not XML, XPath '{}' does not match", xpath);
                return false;
            }
        };
        let document = package.as_document();
        match evaluate_xpath(&document, xpath) {
            Ok(Value::Boolean(b)) => b,
            Ok(Value::Number(n)) => n != 0.0 && !n.is_nan(),
            Ok(Value::String(s)) => !s.is_empty(),
            Ok(Value::Nodeset(nodes)) => nodes.iter().next().is_some(),
            Err(e) => {
                warn!("Invalid XPath expression '{}': {}", xpath, e);
                false
            }
        }
    }

    fn xml_equivalent(&self, expected: &str, candidate: &str) -> bool {
        let Ok(expected_package) = parser::parse(expected) else {
            warn!("XML expectation is not well-formed, comparing as text");
            return expected.trim() == candidate.trim();
        };
        let Ok(candidate_package) = parser::parse(candidate) else {
            return false;
        };
        let expected_root = root_element(&expected_package.as_document());
        let candidate_root = root_element(&candidate_package.as_document());
        expected_root.is_some() && expected_root == candidate_root
    }
}

/// Whitespace-insensitive view of an XML element tree.
#[derive(Debug, PartialEq, Eq)]
enum XmlNode {
    Element {
        name: (Option<String>, String),
        attributes: BTreeMap<(Option<String>, String), String>,
        children: Vec<XmlNode>,
    },
    Text(String),
}

fn root_element(document: &sxd_document::dom::Document<'_>) -> Option<XmlNode> {
    document.root().children().into_iter().find_map(|child| match child {
        ChildOfRoot::Element(element) => Some(normalize(element)),
        _ => None,
    })
}

fn normalize(element: Element<'_>) -> XmlNode {
    let qname = element.name();
    let attributes = element
        .attributes()
        .into_iter()
        .map(|attribute| {
            let name = attribute.name();
            (
                (name.namespace_uri().map(str::to_string), name.local_part().to_string()),
                attribute.value().to_string(),
            )
        })
        .collect();

    let mut children = Vec::new();
    for child in element.children() {
        match child {
            ChildOfElement::Element(child) => children.push(normalize(child)),
            ChildOfElement::Text(text) => {
                let text = text.text().trim();
                if text.is_empty() {
                    continue;
                }
                // adjacent text runs are one logical node
                if let Some(XmlNode::Text(previous)) = children.last_mut() {
                    previous.push_str(text);
                } else {
                    children.push(XmlNode::Text(text.to_string()));
                }
            }
            _ => {}
        }
    }

    XmlNode::Element {
        name: (qname.namespace_uri().map(str::to_string), qname.local_part().to_string()),
        attributes,
        children,
    }
}
