//! HTTP execution
//!
//! This module provides the transport port and the failover executor that
//! drives it across an endpoint set.

pub mod ports;
pub mod retry;

pub use ports::{
    normalize_mime, ByteStream, HttpResponse, HttpTransport, ResponseBody, TransportFactory,
};
pub use retry::{RetryPolicy, RetryingExecutor};
