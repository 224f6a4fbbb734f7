//! Minimal Chrome DevTools Protocol client.

mod client;
mod page;
mod protocol;

pub use client::CdpClient;
pub use page::PageSession;
pub use protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};
