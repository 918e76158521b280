use std::sync::Mutex;

/// Storage slot for the current access/refresh pair. One logical slot per
/// client instance; set and clear are the pipeline's only observable
/// side effects.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn set_tokens(&self, access_token: &str, refresh_token: &str);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<StoredTokens>,
}

#[derive(Debug, Default)]
struct StoredTokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        self.inner.lock().expect("token store poisoned").access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner.lock().expect("token store poisoned").refresh_token.clone()
    }

    fn set_tokens(&self, access_token: &str, refresh_token: &str) {
        let mut inner = self.inner.lock().expect("token store poisoned");
        inner.access_token = Some(access_token.to_string());
        inner.refresh_token = Some(refresh_token.to_string());
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().expect("token store poisoned");
        inner.access_token = None;
        inner.refresh_token = None;
    }
}
