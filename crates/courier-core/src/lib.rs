pub mod message;
pub mod queue;
pub mod routing;

pub use message::Message;
pub use queue::FifoQueue;
pub use routing::partition_for;
