//! Filesystem primitives used by the provisioning pipeline and the runtime.

pub use error::{Error, Result};
pub use file::{
    atomic_write, ensure_dir, remove_dir_if_exists, remove_file_if_exists, replace_file,
    same_content,
};
pub use permissions::PermissionMode;

mod error;
mod file;
pub mod permissions;
