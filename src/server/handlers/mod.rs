pub mod audio_to_image;
pub mod health;

pub use audio_to_image::audio_to_image;
pub use health::health;
