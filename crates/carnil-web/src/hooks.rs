//! Customer Hooks
//!
//! [`use_customer`] follows one customer, [`use_customer_list`] a page of
//! customers. Both return a [`CustomerHandle`] whose actions call the payments
//! client and mirror the outcome into reactive [`CustomerState`].
//!
//! Every action also returns the client's envelope. A client error becomes a
//! failed envelope carrying the error message.

use carnil_core::{
    CarnilResponse, CreateCustomerRequest, Customer, CustomerListRequest, ListResponse,
    Resource, SharedClient, UpdateCustomerRequest,
};
use leptos::prelude::RwSignal;

use crate::state::{CustomerState, StateCell, View};

/// What a handle loads on mount and on `refetch`
#[derive(Clone, Debug)]
enum Subject {
    Customer(Option<String>),
    List(Option<CustomerListRequest>),
}

/// Customer actions bound to one piece of state
#[derive(Clone)]
pub struct CustomerHandle<S: StateCell = RwSignal<CustomerState>> {
    client: SharedClient,
    state: S,
    subject: Subject,
}

impl<S: StateCell> CustomerHandle<S> {
    /// Handle following a single customer
    pub fn single(client: SharedClient, state: S, customer_id: Option<String>) -> Self {
        Self {
            client,
            state,
            subject: Subject::Customer(customer_id.filter(|id| !id.is_empty())),
        }
    }

    /// Handle following a customer list
    pub fn list(client: SharedClient, state: S, request: Option<CustomerListRequest>) -> Self {
        Self {
            client,
            state,
            subject: Subject::List(request),
        }
    }

    pub const fn state(&self) -> &S {
        &self.state
    }

    const fn view(&self) -> View {
        match self.subject {
            Subject::Customer(_) => View::Single,
            Subject::List(_) => View::List,
        }
    }

    /// Initial load: a single handle fetches only when it has an id
    pub async fn mount(&self) {
        match &self.subject {
            Subject::Customer(Some(id)) => {
                self.fetch_customer(id).await;
            }
            Subject::Customer(None) => {}
            Subject::List(request) => {
                self.list_customers(request.clone()).await;
            }
        }
    }

    /// Repeat the load: a single handle without an id lists instead
    pub async fn refetch(&self) {
        match &self.subject {
            Subject::Customer(Some(id)) => {
                self.fetch_customer(id).await;
            }
            Subject::Customer(None) => {
                self.list_customers(None).await;
            }
            Subject::List(request) => {
                self.list_customers(request.clone()).await;
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.modify(CustomerState::clear_error);
    }

    pub async fn create_customer(&self, request: CreateCustomerRequest) -> CarnilResponse<Customer> {
        self.state.modify(CustomerState::begin);
        let result = self.client.create_customer(request).await;

        let view = self.view();
        self.settle(result, "Failed to create customer", |state, customer| {
            state.created(view, customer);
        })
    }

    pub async fn update_customer(
        &self,
        id: &str,
        request: UpdateCustomerRequest,
    ) -> CarnilResponse<Customer> {
        self.state.modify(CustomerState::begin);
        let result = self.client.update_customer(id, request).await;

        let view = self.view();
        self.settle(result, "Failed to update customer", |state, customer| {
            state.updated(view, id, customer);
        })
    }

    pub async fn delete_customer(&self, id: &str) -> CarnilResponse<Resource> {
        self.state.modify(CustomerState::begin);
        // Providers answer deletes with `null` or a tombstone; only `success` counts
        let result = self.client.delete_customer(id).await.map(|mut response| {
            if response.success && response.data.is_none() {
                response.data = Some(Resource::Null);
            }
            response
        });

        let view = self.view();
        self.settle(result, "Failed to delete customer", |state, _| {
            state.deleted(view, id);
        })
    }

    pub async fn fetch_customer(&self, id: &str) -> CarnilResponse<Customer> {
        self.state.modify(CustomerState::begin);
        let result = self.client.get_customer(id).await;

        self.settle(result, "Failed to fetch customer", CustomerState::fetched)
    }

    pub async fn list_customers(
        &self,
        request: Option<CustomerListRequest>,
    ) -> CarnilResponse<ListResponse<Customer>> {
        self.state.modify(CustomerState::begin);
        let result = self.client.list_customers(request).await;

        self.settle(result, "Failed to list customers", CustomerState::listed)
    }

    fn settle<T: Clone>(
        &self,
        result: carnil_core::Result<CarnilResponse<T>>,
        fallback: &str,
        apply: impl FnOnce(&mut CustomerState, T),
    ) -> CarnilResponse<T> {
        let response = match result {
            Ok(response) => response,
            Err(e) => CarnilResponse::failure(e.to_string()),
        };

        match (response.success, response.data.clone()) {
            (true, Some(data)) => self.state.modify(|state| apply(state, data)),
            _ => {
                let error = response
                    .error
                    .clone()
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| fallback.to_string());
                self.state.modify(|state| state.fail(error));
            }
        }
        response
    }
}

/// Follow one customer, fetching it on mount when `customer_id` is set.
pub fn use_customer(client: SharedClient, customer_id: Option<String>) -> CustomerHandle {
    let handle = CustomerHandle::single(client, RwSignal::new(CustomerState::default()), customer_id);
    spawn_mount(handle.clone());
    handle
}

/// Follow a customer list, listing with `request` on mount.
pub fn use_customer_list(
    client: SharedClient,
    request: Option<CustomerListRequest>,
) -> CustomerHandle {
    let handle = CustomerHandle::list(client, RwSignal::new(CustomerState::default()), request);
    spawn_mount(handle.clone());
    handle
}

fn spawn_mount(handle: CustomerHandle) {
    leptos::task::spawn_local(async move {
        handle.mount().await;
    });
}
