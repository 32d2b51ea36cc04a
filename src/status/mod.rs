//! Status pipeline stages: upstream model, HTTP transport, fetcher, transformer.

pub mod fetcher;
pub mod model;
pub mod transform;
pub mod transport;
