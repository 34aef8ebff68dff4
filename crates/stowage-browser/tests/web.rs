#![cfg(target_arch = "wasm32")]

use stowage_browser::{local_storage, web::WebStorage, HostRuntime, StorageProvider};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn when_item_is_stored_in_session_storage_then_it_reads_back() {
    let storage = local_storage(HostRuntime::in_process(WebStorage::session()));
    storage.clear().expect("clear should succeed");

    storage.set_item("count", &3).expect("write should succeed");

    assert_eq!(storage.get_item::<i32>("count").expect("read should succeed"), Some(3));
    assert_eq!(storage.provider().get_item("count").expect("raw read should succeed"), Some("3".to_owned()));
    assert_eq!(storage.keys().expect("keys should succeed"), vec!["count".to_owned()]);
    assert!(storage.contains_key("count").expect("lookup should succeed"));
}

#[wasm_bindgen_test]
fn when_key_is_absent_then_local_storage_reports_none() {
    let storage = local_storage(HostRuntime::in_process(WebStorage::local()));
    storage.remove_item("stowage-absent").expect("removal should succeed");

    assert!(!storage.contains_key("stowage-absent").expect("lookup should succeed"));
    assert_eq!(storage.get_item::<String>("stowage-absent").expect("read should succeed"), None);
}
