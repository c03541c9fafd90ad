//! Page Components

mod customer;
mod customers;

pub use customer::CustomerPage;
pub use customers::CustomersPage;
