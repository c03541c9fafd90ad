//! Customers Page

use carnil_core::{CreateCustomerRequest, CustomerListRequest, SharedClient};
use leptos::prelude::*;

use crate::components::{CustomerRow, ErrorBanner};
use crate::hooks::use_customer_list;
use crate::provider::use_carnil;

const PAGE_SIZE: usize = 20;

#[component]
pub fn CustomersPage() -> impl IntoView {
    match use_carnil() {
        Ok(client) => view! { <CustomerList client /> }.into_any(),
        Err(e) => view! { <p class="error">{e.to_string()}</p> }.into_any(),
    }
}

#[component]
fn CustomerList(client: SharedClient) -> impl IntoView {
    let customers = use_customer_list(
        client,
        Some(CustomerListRequest {
            limit: Some(PAGE_SIZE),
            ..Default::default()
        }),
    );
    let state = *customers.state();
    let (email, set_email) = signal(String::new());
    let (name, set_name) = signal(String::new());

    let create = {
        let customers = customers.clone();
        move |_| {
            let request = CreateCustomerRequest {
                email: Some(email.get()).filter(|e| !e.is_empty()),
                name: Some(name.get()).filter(|n| !n.is_empty()),
                ..Default::default()
            };
            let customers = customers.clone();
            leptos::task::spawn_local(async move {
                if customers.create_customer(request).await.success {
                    set_email.set(String::new());
                    set_name.set(String::new());
                }
            });
        }
    };

    let delete = {
        let customers = customers.clone();
        Callback::new(move |id: String| {
            let customers = customers.clone();
            leptos::task::spawn_local(async move {
                customers.delete_customer(&id).await;
            });
        })
    };

    let dismiss = {
        let customers = customers.clone();
        Callback::new(move |()| customers.clear_error())
    };

    let refresh = move |_| {
        let customers = customers.clone();
        leptos::task::spawn_local(async move { customers.refetch().await });
    };

    view! {
        <div class="customers">
            <header>
                <h1>"Customers"</h1>
                <span class="count">
                    {move || state.get().total_count.map(|n| format!("{n} total"))}
                </span>
                <button class="btn" on:click=refresh disabled=move || state.get().is_loading>
                    "Refresh"
                </button>
            </header>

            <ErrorBanner error=Signal::derive(move || state.get().error) on_dismiss=dismiss />

            <div class="new-customer">
                <input
                    type="email"
                    placeholder="email"
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
                <input
                    type="text"
                    placeholder="name"
                    prop:value=move || name.get()
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                />
                <button class="btn btn-primary" on:click=create disabled=move || state.get().is_loading>
                    "Add customer"
                </button>
            </div>

            <table>
                <thead>
                    <tr><th>"ID"</th><th>"Email"</th><th>"Name"</th><th></th></tr>
                </thead>
                <tbody>
                    <For
                        each=move || state.get().customers
                        key=|customer| customer.id.clone()
                        children=move |customer| view! { <CustomerRow customer on_delete=delete /> }
                    />
                </tbody>
            </table>

            <Show when=move || state.get().has_more>
                <p class="more">"More customers available"</p>
            </Show>
        </div>
    }
}
