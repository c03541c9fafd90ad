//! Customer Detail Page

use carnil_core::{SharedClient, UpdateCustomerRequest};
use leptos::prelude::*;
use leptos_router::hooks::use_params_map;

use crate::api;
use crate::components::ErrorBanner;
use crate::hooks::use_customer;
use crate::provider::use_carnil;

#[component]
pub fn CustomerPage() -> impl IntoView {
    let params = use_params_map();
    let id = params.read_untracked().get("id");

    match use_carnil() {
        Ok(client) => view! { <CustomerDetail client id /> }.into_any(),
        Err(e) => view! { <p class="error">{e.to_string()}</p> }.into_any(),
    }
}

#[component]
fn CustomerDetail(client: SharedClient, id: Option<String>) -> impl IntoView {
    let customer = use_customer(client, id.clone());
    let state = *customer.state();
    let (name, set_name) = signal(String::new());

    let rename = {
        let customer = customer.clone();
        let id = id.clone();
        move |_| {
            let Some(id) = id.clone() else { return };
            let request = UpdateCustomerRequest {
                name: Some(name.get()),
                ..Default::default()
            };
            let customer = customer.clone();
            leptos::task::spawn_local(async move {
                customer.update_customer(&id, request).await;
            });
        }
    };

    let dismiss = {
        let customer = customer.clone();
        Callback::new(move |()| customer.clear_error())
    };

    let use_as_session = move |_| {
        if let Some(id) = &id {
            api::remember_customer(id);
        }
    };

    view! {
        <div class="customer">
            <ErrorBanner error=Signal::derive(move || state.get().error) on_dismiss=dismiss />

            <Show when=move || state.get().is_loading>
                <p class="loading">"Loading..."</p>
            </Show>

            {move || state.get().customer.map(|c| view! {
                <dl>
                    <dt>"ID"</dt><dd>{c.id}</dd>
                    <dt>"Email"</dt><dd>{c.email.unwrap_or_default()}</dd>
                    <dt>"Name"</dt><dd>{c.name.unwrap_or_default()}</dd>
                    <dt>"Description"</dt><dd>{c.description.unwrap_or_default()}</dd>
                </dl>
            })}

            <div class="rename">
                <input
                    type="text"
                    placeholder="new name"
                    prop:value=move || name.get()
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                />
                <button class="btn" on:click=rename>"Rename"</button>
                <button class="btn" on:click=use_as_session>"Act as this customer"</button>
            </div>

            <a href="/">"Back to customers"</a>
        </div>
    }
}
