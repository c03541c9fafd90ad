//! Carnil Provider
//!
//! Probes the payments client once on mount and gates its children on the
//! result. Hooks receive the client explicitly; the context carries the
//! provider's status and the client for components that did not get one.

use carnil_core::{PaymentsClient, SharedClient};
use leptos::prelude::*;

use crate::error::WebError;

/// Provider lifecycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderStatus {
    Loading,
    Ready,
    Failed(String),
}

impl ProviderStatus {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Value provided to descendants of [`CarnilProvider`]
#[derive(Clone)]
pub struct CarnilContext {
    pub status: ReadSignal<ProviderStatus>,
    client: SharedClient,
}

/// Run the health probe. An unhealthy client is an error.
pub async fn initialize(client: &dyn PaymentsClient) -> Result<(), String> {
    match client.health_check().await {
        Ok(true) => Ok(()),
        Ok(false) => Err("Carnil health check failed".into()),
        Err(e) => Err(e.to_string()),
    }
}

#[component]
pub fn CarnilProvider(
    client: SharedClient,
    /// Shown while the health check runs
    #[prop(optional, into)]
    fallback: Option<ViewFn>,
    /// Called with the failure message
    #[prop(optional, into)]
    on_error: Option<Callback<String>>,
    children: ChildrenFn,
) -> impl IntoView {
    let (status, set_status) = signal(ProviderStatus::Loading);
    provide_context(CarnilContext {
        status,
        client: client.clone(),
    });

    leptos::task::spawn_local(async move {
        match initialize(client.as_ref()).await {
            Ok(()) => set_status.set(ProviderStatus::Ready),
            Err(error) => {
                if let Some(on_error) = on_error {
                    on_error.run(error.clone());
                }
                set_status.set(ProviderStatus::Failed(error));
            }
        }
    });

    move || match status.get() {
        ProviderStatus::Loading if fallback.is_some() => {
            fallback.as_ref().map(ViewFn::run).into_any()
        }
        ProviderStatus::Failed(error) => view! {
            <div class="carnil-error" style="padding: 1rem; color: red;">
                <h3>"Carnil Error"</h3>
                <p>{error}</p>
            </div>
        }
        .into_any(),
        _ => children().into_any(),
    }
}

pub fn use_carnil_context() -> Result<CarnilContext, WebError> {
    use_context::<CarnilContext>().ok_or(WebError::OutsideProvider)
}

/// The provider's client, once its health check has passed
pub fn use_carnil() -> Result<SharedClient, WebError> {
    let context = use_carnil_context()?;
    if context.status.get_untracked() == ProviderStatus::Ready {
        Ok(context.client)
    } else {
        Err(WebError::ClientUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use carnil_core::{ClientConfig, Fault, MemoryClient};

    use super::*;

    #[tokio::test]
    async fn test_initialize() {
        let client = MemoryClient::new(ClientConfig::new("stripe"));
        assert_eq!(initialize(&client).await, Ok(()));

        client.set_healthy(false);
        assert_eq!(
            initialize(&client).await,
            Err("Carnil health check failed".into())
        );

        client
            .fail("healthCheck", Fault::Error("connection refused".into()))
            .await;
        assert_eq!(initialize(&client).await, Err("connection refused".into()));
    }

    #[test]
    fn test_status_accessors() {
        assert!(ProviderStatus::Loading.is_loading());
        assert_eq!(ProviderStatus::Failed("x".into()).error(), Some("x"));
        assert_eq!(ProviderStatus::Ready.error(), None);
    }

    #[test]
    fn test_context_outside_provider() {
        assert!(matches!(
            use_carnil_context(),
            Err(WebError::OutsideProvider)
        ));
        assert!(matches!(use_carnil(), Err(WebError::OutsideProvider)));
    }
}
