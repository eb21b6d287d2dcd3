pub mod admin;
pub mod post_files;
pub mod upload;
