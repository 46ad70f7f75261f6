pub mod binning;
pub mod histogram;
