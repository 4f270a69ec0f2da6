//! `yangjson` converts between the JSON encoding of YANG-modeled data and a
//! normalized, schema-validated data tree.
//!
//! The JSON encoding is the one described by [RFC7951] (with an optional
//! compatibility mode for the earlier draft spelling, which writes 64-bit
//! integers and decimals as bare numbers instead of strings). Data never
//! travels through this crate untyped: every member name must resolve to a
//! node of the schema model and every scalar is decoded by the codec of its
//! declared type.
//!
//! # Implementation Details
//!
//! - The schema model ([`schema`]) is an immutable, hand-constructible tree;
//!   compiling it from YANG source is out of scope here.
//!
//! - Parsing and serialization both navigate with a [`SchemaStack`], which
//!   steps transparently through choice and case nodes, so a selected case's
//!   members appear directly under the choice's parent on the wire.
//!
//! - Scalar conversion lives in per-type codecs ([`codec`]), built and
//!   cached by a [`JsonCodecFactory`] configured with a [`WireVariant`].
//!
//! - Input enters as a [`serde_json::Value`] walked by a [`ValueReader`];
//!   output leaves through a [`TokenWriter`], with [`JsonWriter`] producing
//!   compact or indented text.
//!
//! # Examples
//!
//! Parsing a document against a one-module model:
//!
//! ```
//! use yangjson::{
//!     JsonCodecFactory, JsonParser, Module, ModuleId, QName, SchemaContext, SchemaNode,
//!     TypeDesc, ValueReader, WireVariant,
//! };
//!
//! let ns = "urn:example:net";
//! let model = SchemaContext::new(vec![Module::new(
//!     "net",
//!     ModuleId::new(ns),
//!     vec![SchemaNode::container(
//!         QName::new(ns, "routing"),
//!         vec![SchemaNode::leaf(QName::new(ns, "mtu"), TypeDesc::Uint16)],
//!     )],
//! )]);
//!
//! let codecs = JsonCodecFactory::new(&model, WireVariant::Rfc7951);
//! let parser = JsonParser::new(&codecs);
//! let doc: serde_json::Value =
//!     serde_json::from_str(r#"{"net:routing": {"mtu": 1500}}"#).unwrap();
//! let nodes = parser.parse(&mut ValueReader::new(&doc)).unwrap();
//! assert_eq!(nodes.len(), 1);
//! ```
//!
//! [RFC7951]: https://tools.ietf.org/html/rfc7951

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod iid;
pub mod parser;
pub mod qname;
pub mod schema;
pub mod stack;
pub mod token;
pub mod tree;
pub mod util;
pub mod value;
pub mod writer;

#[doc(inline)]
pub use codec::{JsonCodec, JsonCodecFactory, WireVariant};
#[doc(inline)]
pub use iid::{InstanceIdentifier, PathStep, Predicate};
#[doc(inline)]
pub use parser::JsonParser;
#[doc(inline)]
pub use qname::{ModuleId, QName};
#[doc(inline)]
pub use schema::{Identity, Module, NodeKind, SchemaContext, SchemaNode, TypeDesc};
#[doc(inline)]
pub use stack::SchemaStack;
#[doc(inline)]
pub use token::{JsonWriter, Scalar, TokenKind, TokenReader, TokenWriter, ValueReader};
#[doc(inline)]
pub use tree::{DataNode, KeyPredicates};
#[doc(inline)]
pub use util::{
    CodecError, CodecResult, ErrorCategory, ErrorDetail, ErrorRecord, ParseErrors, Severity,
};
#[doc(inline)]
pub use value::{Decimal64, Value};
#[doc(inline)]
pub use writer::JsonStreamWriter;
