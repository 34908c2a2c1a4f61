pub mod intent;
pub mod protocol;
pub mod status;

pub use intent::*;
pub use protocol::*;
pub use status::*;
