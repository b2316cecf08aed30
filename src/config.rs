//! Configuration for the xkcd and VK API clients
//!
//! Loads credentials from environment variables (a local .env file is
//! picked up by the binary before this runs).

use std::env;

use crate::{Error, Result};

/// xkcd API host.
pub const XKCD_URL: &str = "https://xkcd.com";

/// VK API host.
pub const VK_API_URL: &str = "https://api.vk.com";

/// VK API version sent with every request.
pub const VK_API_VERSION: &str = "5.124";

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Implicit-flow access token for the VK API.
    pub vk_token: String,
    /// Numeric identifier of the target VK group.
    pub vk_group_id: i64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let vk_token = env::var("VK_IMPLICIT_FLOW_TOKEN")
            .map_err(|_| Error::InvalidArgument("VK_IMPLICIT_FLOW_TOKEN не задан".to_string()))?;

        if vk_token.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "VK_IMPLICIT_FLOW_TOKEN пустой".to_string(),
            ));
        }

        let vk_group_id = env::var("VK_GROUP_ID")
            .map_err(|_| Error::InvalidArgument("VK_GROUP_ID не задан".to_string()))?
            .parse()
            .map_err(|_| Error::InvalidArgument("VK_GROUP_ID не число".to_string()))?;

        Ok(Self {
            vk_token,
            vk_group_id,
        })
    }
}
