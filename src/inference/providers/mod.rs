pub mod lens;

pub use lens::LensProvider;
