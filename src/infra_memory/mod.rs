mod secret_store_memory;

pub use secret_store_memory::*;
