pub mod frame;
pub mod raster;
pub mod surface;
