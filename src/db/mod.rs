pub mod store;

pub use store::{connect, ResultStore};
