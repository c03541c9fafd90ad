//! UI Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebError {
    #[error("use_carnil_context must be used within a CarnilProvider")]
    OutsideProvider,

    #[error("Carnil instance not available. Make sure CarnilProvider is properly configured.")]
    ClientUnavailable,

    #[error(transparent)]
    Client(#[from] carnil_core::CarnilError),
}
