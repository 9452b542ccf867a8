pub mod buffer;
pub mod chain;
pub mod encoding;
pub mod error;
mod float;
pub mod stream;

pub use buffer::{ByteBuffer, ByteBufferBuilder};
pub use chain::BufferChain;
pub use encoding::StringEncoding;
pub use error::{Error, Result};
pub use stream::{ByteStream, DEFAULT_SCRATCH_SIZE};
