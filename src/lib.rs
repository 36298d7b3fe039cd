pub mod config;
pub mod constants;
pub mod error;
pub mod mlp;
pub mod pipeline;
pub mod util {
    pub mod file_utils;
}
