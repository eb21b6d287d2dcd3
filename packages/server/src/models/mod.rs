pub mod attachment;
pub mod post_files;
pub mod protection;
