mod args;
pub mod banners;
mod context;
mod error;
pub mod file_controls;
pub mod interval;
pub mod live;
pub mod nodes;
pub mod observer;
mod options;
pub mod panel;
pub mod presence;
pub mod profile;
pub mod profile_panel;
pub mod refresh;
pub mod request;
pub mod restart;
pub mod schema;
pub mod schema_manager;
pub mod storage;
pub mod surface;
mod viewer;
pub mod viewport;

#[cfg(test)]
mod test_utils;

pub use args::Args;
pub use banners::{Banner, BannerKind, Banners};
pub use context::{AppContext, SyncFlags};
pub use error::Error;
pub use options::ViewerOptions;
pub use profile::{Profile, ProfilePath};
pub use request::{EhttpClient, HttpClient, RequestManager};
pub use schema::{ParameterKind, ParameterSchema, Schema};
pub use storage::{DataPath, DataPathType};
pub use viewer::{Viewer, ViewerAction};

// export libs
pub use roomlink;

pub type Result<T> = std::result::Result<T, error::Error>;
