//! Live preview server: resolves request paths below a root directory,
//! converts the markdown found there, and answers with HTML.

mod error;
pub mod resolver;
pub mod server;

pub use error::{PreviewError, PreviewResult};
pub use resolver::{FileResolver, ResolveError};
pub use server::{router, PreviewServer, PreviewState};
