mod secret_store_file;

pub use secret_store_file::*;
