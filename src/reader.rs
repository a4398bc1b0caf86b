pub mod attributes;
pub mod gtf;
pub use attributes::{parse_attributes, parse_attributes_lenient, AttributeMap};
pub use gtf::{read_gtf, read_gtf_from, FeatureType, GtfRecord};
