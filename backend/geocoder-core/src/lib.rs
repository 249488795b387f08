pub mod config;
pub mod dispatcher;
pub mod error;
pub mod geocoding_client;
pub mod host_channel;

#[cfg(test)]
mod tests;

pub const MAPQUEST_API_BASE_URL: &str = "https://www.mapquestapi.com";
pub const MAPQUEST_GEOCODE_URL: &str =
    const_format::concatcp!(MAPQUEST_API_BASE_URL, "/geocoding/v1/address");
pub const MAPQUEST_REVERSE_GEOCODE_URL: &str =
    const_format::concatcp!(MAPQUEST_API_BASE_URL, "/geocoding/v1/reverse");
