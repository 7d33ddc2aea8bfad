//! `ao-tool-client` — allow-list-enforced RPC facade (C4) over the
//! external tool registry HTTP API used by worker nodes.

pub mod client;

pub use client::ToolClient;
