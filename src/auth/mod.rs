pub mod callback;
pub mod cookies;
pub mod credentials;
pub mod holder;
pub mod session;

pub use callback::CallbackQuery;
pub use cookies::SessionCookies;
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredentials};
pub use holder::AuthHolder;
pub use session::{AuthSession, AuthState, SessionHandle};
