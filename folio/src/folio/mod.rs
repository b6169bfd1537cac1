pub mod cms;
pub mod config;
pub mod jsonld;
pub mod markup;
pub mod plugins;
pub mod promos;
pub mod renderer;
pub mod seo;
pub mod types;

pub use cms::WordPressClient;
pub use config::SiteConfig;
pub use renderer::PostRenderer;
pub use types::{Post, RenderedPost};
