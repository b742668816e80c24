//! Advertising configuration and payload encoding

pub mod config;
pub mod constants;
pub mod data;


pub use config::{
    AdvertisingConfig, AdvertisingConfigBuilder, AdvertisingParameters, AdvertisingType,
};
pub use data::{AdFlags, AdStructure, AdvertisingData};
