//! # Services
//!
//! Thin domain operations over a [`SharedRepository`](crate::repository::SharedRepository).
//! Services are cheap to clone and hold no state of their own.

mod cart;
mod customer;
mod inventory;
mod transaction;

pub use cart::CartService;
pub use customer::CustomerService;
pub use inventory::InventoryService;
pub use transaction::TransactionService;
