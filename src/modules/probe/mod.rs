pub mod http_probe;

pub use http_probe::{HttpProbe, ProbeBody, ProbeMethod, ProbeRequest, ProbeResponse};
