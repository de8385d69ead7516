pub mod candidate;
pub mod envelope;
pub mod gemini;
pub mod request;
pub mod result;

pub use candidate::*;
pub use envelope::*;
pub use request::*;
pub use result::*;
