//! The PDF object model (§3): [`Value`], [`Name`], [`PdfString`],
//! [`Dictionary`], [`ObjectId`], and [`IndirectObject`].

mod dictionary;
mod indirect;
mod primitive;

pub use dictionary::Dictionary;
pub use indirect::{EncodedSpec, IndirectObject};
pub use primitive::{Name, ObjectId, PdfString, Value};
