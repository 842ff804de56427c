pub mod admin;
pub mod core;
pub mod karyawan;
pub mod route;
pub mod session;
pub mod stats;
