pub mod asset;
pub mod space;
