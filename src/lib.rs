extern crate static_assertions as sa;

pub mod segoff;
pub mod error;
pub mod mem;
pub mod dcb;
pub mod walker;
pub mod util;

pub mod app;
