pub mod advertising;
pub mod constants;
pub mod types;

pub use advertising::{
    build_advertisement, build_scan_response, AdvConfigPending, AdvertisingData, AdvertisingError,
};
pub use constants::*;
pub use types::*;
