//! Record types kept in the store

pub mod account;
pub mod batch;
pub mod cell_counts;

pub use account::Account;
pub use batch::Batch;
pub use cell_counts::CellCountSheet;
