pub mod error;
pub mod summary;

pub use error::{RecalcError, Result};
pub use summary::render_summary;
