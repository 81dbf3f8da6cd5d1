pub mod analyser;
pub mod decode;
