pub mod service;
pub mod synthesizer;

pub use service::{PodcastService, PodcastServiceApi, PodcastSettings};
pub use synthesizer::synthesize_all;
