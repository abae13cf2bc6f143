mod question;
mod request;
mod timestamps;

pub use question::{Question, SEPARATOR};
pub use request::{MarketError, MarketRequest, MarketType};
pub use timestamps::{parse_time, Timestamps};

#[cfg(test)]
pub(crate) use request::tests::sample_request;
