//! UI Components

use carnil_core::Customer;
use leptos::prelude::*;

/// One row of the customer table
#[component]
pub fn CustomerRow(customer: Customer, on_delete: Callback<String>) -> impl IntoView {
    let id = customer.id.clone();
    let href = format!("/customers/{}", customer.id);

    view! {
        <tr class="customer-row">
            <td><a href=href>{customer.id.clone()}</a></td>
            <td>{customer.email.unwrap_or_default()}</td>
            <td>{customer.name.unwrap_or_default()}</td>
            <td>
                <button class="btn btn-danger" on:click=move |_| on_delete.run(id.clone())>
                    "Delete"
                </button>
            </td>
        </tr>
    }
}

/// Dismissable error line
#[component]
pub fn ErrorBanner(
    #[prop(into)] error: Signal<Option<String>>,
    on_dismiss: Callback<()>,
) -> impl IntoView {
    view! {
        <Show when=move || error.get().is_some()>
            <div class="error-banner">
                <span>{move || error.get().unwrap_or_default()}</span>
                <button on:click=move |_| on_dismiss.run(())>"×"</button>
            </div>
        </Show>
    }
}
