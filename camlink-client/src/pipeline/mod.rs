mod frame_encoder;
mod frame_sampler;
mod stream_settings;
mod streaming_pipeline;
mod throughput;

pub use frame_encoder::*;
pub use frame_sampler::*;
pub use stream_settings::*;
pub use streaming_pipeline::*;
pub use throughput::*;
