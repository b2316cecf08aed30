//! Random xkcd comic publisher for VK group walls
//!
//! This library provides tools to:
//! - Fetch a random xkcd comic (latest number, metadata, image download)
//! - Publish a photo to a VK group wall via the four-step upload protocol
//! - Run the full fetch-and-post cycle with guaranteed local file cleanup

pub mod commands;
pub mod config;
pub mod error;
pub mod vk;
pub mod xkcd;

// Re-export common types
pub use config::Config;
pub use error::{Error, Result};
pub use vk::VkClient;
pub use xkcd::{FetchedComic, ImageArtifact, XkcdClient};
