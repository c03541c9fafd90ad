//! Main App Component

use leptos::prelude::*;
use leptos_router::{components::*, path};

use crate::api;
use crate::pages::{CustomerPage, CustomersPage};
use crate::provider::CarnilProvider;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    match api::remote_client(api::session_customer().as_deref()) {
        Ok(client) => view! {
            <CarnilProvider client fallback=|| view! { <p class="loading">"Connecting..."</p> }>
                <Router>
                    <main class="app">
                        <Routes fallback=|| view! { <p>"Page not found"</p> }>
                            <Route path=path!("/") view=CustomersPage />
                            <Route path=path!("/customers/:id") view=CustomerPage />
                        </Routes>
                    </main>
                </Router>
            </CarnilProvider>
        }
        .into_any(),
        Err(e) => view! { <p class="error">{e.to_string()}</p> }.into_any(),
    }
}
