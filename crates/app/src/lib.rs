//! Cart services, stores and upstream clients around the trolley engine.

pub mod charges;
pub mod context;
pub mod database;
pub mod domain;

#[cfg(test)]
mod test;
