//! Attribute references, their resolution against schemas, and response projection.
//!
//! * [`AttributeReference`] - parsed `urn:...:attr.sub` path
//! * [`resolve`] - turn include/exclude tokens into canonical references
//! * [`project`] / [`AttributeSelection`] - compute the visible subset of a resource

pub mod projection;
pub mod reference;
pub mod resolver;

pub use projection::{AttributeSelection, project, validate_selection};
pub use reference::{AttributeReference, parse_attribute_list};
pub use resolver::{ResolvedAttribute, resolve, resolve_reference};
