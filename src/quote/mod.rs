//! Quote module: best bid, best ask and mid per outcome token.

pub mod service;
pub mod types;

pub use service::{PriceSource, QuoteService};
pub use types::{parse_price, Quote};
