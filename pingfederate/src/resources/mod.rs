//! Resource implementations

pub mod common;
pub mod incoming_proxy_settings;
pub mod oauth_client;
pub mod oauth_server_settings;
pub mod server_settings;

use common::ApiResource;

pub type IncomingProxySettingsResource = ApiResource<incoming_proxy_settings::IncomingProxySettings>;
pub type OAuthClientResource = ApiResource<oauth_client::OAuthClient>;
pub type OAuthServerSettingsResource = ApiResource<oauth_server_settings::OAuthServerSettings>;
pub type ServerSettingsResource = ApiResource<server_settings::ServerSettings>;
