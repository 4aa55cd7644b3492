//! Wire format of the TrustX header bidding endpoint.

pub mod request;
pub mod response;
