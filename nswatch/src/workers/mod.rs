mod consumer;
mod ringbuf;

pub use consumer::*;
pub use ringbuf::*;
