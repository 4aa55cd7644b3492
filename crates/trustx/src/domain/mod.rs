pub mod creative;
pub mod demand;
pub mod placement;
pub mod price;
pub mod profile;
pub mod render;
pub mod size;
pub mod targeting;

pub use {
    demand::{Adapter, Host},
    size::Size,
};
