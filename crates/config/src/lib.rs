pub mod loader;
pub mod schema;

pub use {
    loader::{
        CONFIG_ENV, ConfigFormat, discover_and_load, find_config_file, load_config, parse_config,
    },
    schema::{ClientConfig, HttpConfig, QqConfig, SocialiteConfig, WeChatConfig, WeiboConfig},
};
