pub mod debounce;
pub mod sequence;

pub use debounce::Debouncer;
pub use sequence::{RequestSequence, RequestTicket};
