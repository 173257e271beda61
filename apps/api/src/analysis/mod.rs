pub mod ats;

pub use ats::{analyze, AtsReport};
