pub mod memory;

pub use memory::InMemoryOrderStore;
