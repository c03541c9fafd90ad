//! Customer View State
//!
//! Every hook action moves the state through three phases: [`begin`] before
//! the client call, then one success transition or [`fail`]. Failures keep
//! whatever data was already loaded.
//!
//! [`begin`]: CustomerState::begin
//! [`fail`]: CustomerState::fail

use std::cell::RefCell;
use std::rc::Rc;

use carnil_core::{Customer, ListResponse};
use leptos::prelude::{GetUntracked, RwSignal, Update};

/// Which collection a hook instance maintains
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// `customer` is the subject; mutations replace it
    Single,
    /// `customers` is the subject; mutations edit it in place
    List,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomerState {
    pub customer: Option<Customer>,
    pub customers: Vec<Customer>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub has_more: bool,
    pub total_count: Option<u64>,
}

impl CustomerState {
    pub fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.is_loading = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn created(&mut self, view: View, customer: Customer) {
        match view {
            View::Single => self.customer = Some(customer),
            View::List => self.customers.insert(0, customer),
        }
        self.is_loading = false;
    }

    pub fn updated(&mut self, view: View, id: &str, customer: Customer) {
        match view {
            View::Single => self.customer = Some(customer),
            View::List => {
                if let Some(slot) = self.customers.iter_mut().find(|c| c.id == id) {
                    *slot = customer;
                }
            }
        }
        self.is_loading = false;
    }

    pub fn deleted(&mut self, view: View, id: &str) {
        match view {
            View::Single => self.customer = None,
            View::List => self.customers.retain(|c| c.id != id),
        }
        self.is_loading = false;
    }

    pub fn fetched(&mut self, customer: Customer) {
        self.customer = Some(customer);
        self.is_loading = false;
    }

    pub fn listed(&mut self, page: ListResponse<Customer>) {
        self.customers = page.data;
        self.has_more = page.has_more;
        self.total_count = page.total_count;
        self.is_loading = false;
    }
}

/// Where a hook keeps its [`CustomerState`].
///
/// Components use a reactive signal; anything else (tests, non-reactive
/// hosts) can use a plain shared cell.
pub trait StateCell: Clone + 'static {
    fn modify(&self, f: impl FnOnce(&mut CustomerState));

    fn snapshot(&self) -> CustomerState;
}

impl StateCell for RwSignal<CustomerState> {
    fn modify(&self, f: impl FnOnce(&mut CustomerState)) {
        Update::update(self, f);
    }

    fn snapshot(&self) -> CustomerState {
        self.get_untracked()
    }
}

impl StateCell for Rc<RefCell<CustomerState>> {
    fn modify(&self, f: impl FnOnce(&mut CustomerState)) {
        f(&mut self.borrow_mut());
    }

    fn snapshot(&self) -> CustomerState {
        self.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: &str, name: &str) -> Customer {
        Customer {
            id: id.into(),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_begin_clears_error() {
        let mut state = CustomerState {
            error: Some("old".into()),
            ..Default::default()
        };
        state.begin();
        assert!(state.is_loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_failure_keeps_data() {
        let mut state = CustomerState {
            customers: vec![customer("cus_1", "Ada")],
            ..Default::default()
        };
        state.begin();
        state.fail("Failed to delete customer");

        assert!(!state.is_loading);
        assert_eq!(state.customers.len(), 1);
        assert_eq!(state.error.as_deref(), Some("Failed to delete customer"));
    }

    #[test]
    fn test_list_mutations() {
        let mut state = CustomerState {
            customers: vec![customer("cus_1", "Ada"), customer("cus_2", "Grace")],
            ..Default::default()
        };

        state.created(View::List, customer("cus_3", "Barbara"));
        assert_eq!(state.customers[0].id, "cus_3");

        state.updated(View::List, "cus_2", customer("cus_2", "Grace H."));
        assert_eq!(state.customers[2].name.as_deref(), Some("Grace H."));

        state.deleted(View::List, "cus_1");
        let ids: Vec<_> = state.customers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["cus_3", "cus_2"]);
        assert_eq!(state.customer, None);
    }

    #[test]
    fn test_single_mutations() {
        let mut state = CustomerState::default();

        state.created(View::Single, customer("cus_1", "Ada"));
        assert_eq!(state.customer.as_ref().map(|c| c.id.as_str()), Some("cus_1"));
        assert!(state.customers.is_empty());

        state.deleted(View::Single, "cus_1");
        assert_eq!(state.customer, None);
    }

    #[test]
    fn test_listed_replaces_page() {
        let mut state = CustomerState::default();
        state.listed(ListResponse::new(vec![customer("cus_1", "Ada")], true, Some(12)));

        assert_eq!(state.customers.len(), 1);
        assert!(state.has_more);
        assert_eq!(state.total_count, Some(12));
    }
}
