//! XML serialization and parsing for document trees.

pub mod reader;
pub mod writer;

pub use reader::{parse_file, parse_str};
pub use writer::{
    escape_attribute, tlh_write_config, write_node, write_xml, NodeWriteConfig, XmlWriteConfig,
};
