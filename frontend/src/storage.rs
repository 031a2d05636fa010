use chat_sessions_core::{KeyValueStore, StoreError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// `window.localStorage`, when the browser grants it.
pub struct BrowserStore {
    storage: Option<Storage>,
}

impl BrowserStore {
    pub fn open() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable, chats will not survive a reload");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&Storage, StoreError> {
        self.storage.as_ref().ok_or_else(|| StoreError::Unavailable {
            message: "localStorage is not available".to_string(),
        })
    }
}

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StoreError::Unavailable { message: js_error(e) })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        // fails with QuotaExceededError when the origin's storage is full
        self.storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::write(key, js_error(e)))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| StoreError::write(key, js_error(e)))
    }
}
