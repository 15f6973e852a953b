//! Request parameter coercion
//!
//! Loosely typed wire input (path segments, JSON payload, query string) is
//! merged into [`RawParams`] and coerced into a typed [`ParameterRecord`].
//! Each field applies a converter then a validator:
//! - `nid`, `nid0`, `nid1`, `to`, `field_name`: string
//! - `fields`, `order_by`: list of strings
//! - `set_values`: list of `(field, value)` pairs
//! - `values`: list
//! - `axis` (default 1), `limit`: int
//! - `conditions`: compiled condition expression
//! - `relation`, `style`: closed vocabularies
//! - `include_base`, `check_siblings`, `extra_space`: bool
//! - `node`: map; `value`: any literal
//!
//! [`ParameterRecord::get_kwargs`] forwards only the non-null fields an
//! [`Operation`] declares.

mod choice;
pub mod decode;
mod name;
mod operation;
mod record;

pub use choice::{Relation, Style};
pub use name::ParamName;
pub use operation::{EngineOperation, Operation};
pub use record::{Kwargs, ParamValue, ParameterRecord, RawParams, DEFAULT_AXIS};
