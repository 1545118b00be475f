mod scene_desc;
mod source_config;

pub use scene_desc::SceneDesc;
pub use source_config::SourceConfig;
