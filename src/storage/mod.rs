pub mod devices;
pub mod mailbox;
pub mod minio;
pub mod redis;
