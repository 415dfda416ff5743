pub mod config;
pub mod html;
pub mod http_client;
pub mod ids;
pub mod league;
pub mod logging;
pub mod lovb_fetch;
pub mod ncaa_fetch;
pub mod normalize;
pub mod pipeline;
pub mod pvf_fetch;
pub mod record;
pub mod registry;
pub mod replicate;
pub mod rows;
pub mod schema;
pub mod store;
pub mod validate;
