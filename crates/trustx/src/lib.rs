#![forbid(unsafe_code)]

pub mod domain;
pub mod infra;
mod run;
mod util;

pub use {
    domain::{
        Adapter,
        Host,
        Size,
        demand::{Demand, Error, SlotDemand},
        placement::HtSlot,
        render::{Document, Frame},
        targeting::{Targeting, Value},
    },
    infra::config::Config,
    run::{run, start},
};
