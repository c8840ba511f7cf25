//! Client plumbing for the remote data server: the GETDATA line
//! protocol and a bounded connection pool with checkout/checkin
//! discipline.

pub mod client;
pub mod pool;

pub use client::{BackendClient, Connector, TcpConnector};
pub use pool::{ClientPool, PoolCounters, PooledClient};
