pub mod assets;
pub mod config;
pub mod error;
pub mod events;
pub mod policy;
pub mod processing;
pub mod render;
pub mod render_loop;
pub mod timing;
pub mod tasks {
    pub mod viewer;
}
