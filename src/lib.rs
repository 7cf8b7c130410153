pub mod config;
pub mod decode;
pub mod error;
pub mod input;
pub mod session;

pub use config::Config;
pub use error::ClientError;
pub use session::{run, Session, SessionEnd, Step};
