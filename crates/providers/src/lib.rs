pub mod qq;
pub mod registry;
pub mod wechat;
pub mod weibo;

#[cfg(test)]
mod test_support;

pub use {
    qq::{QqClient, QqEndpoints},
    registry::ProviderRegistry,
    wechat::{WeChatClient, WeChatEndpoints},
    weibo::{WeiboClient, WeiboEndpoints},
};
