//! Clarity value representation
//!
//! Contract print events arrive as the textual `repr` of a Clarity value,
//! for example:
//!
//! ```text
//! (ok (tuple (data (tuple (amount-ustx u1000) ...)) (name "delegate-stx") (stacker 'SP...)))
//! ```
//!
//! This module decodes that text into a [`StructuredValue`] tree. Only the
//! value kinds the PoX-4 print events use are supported; anything else is
//! rejected with [`MalformedValueError`].

pub mod parser;
pub mod value;

pub use parser::{parse_event_repr, parse_value, MalformedValueError};
pub use value::{StructuredValue, Tuple};
