pub mod path;
pub mod session;
pub mod tree;

pub use session::{Action, EditOutcome, EditSession, FieldEdit, SessionHandle, SessionRegistry};
