//! Ready-made wiring of the service to a host.

use std::sync::Arc;

use stowage_json::{JsonSerializer, SerdeJsonSerializer, SerializerSettings};

use crate::{host::HostRuntime, provider::BrowserStorageProvider, service::LocalStorageService};

pub type BrowserLocalStorage<J = SerdeJsonSerializer> = LocalStorageService<BrowserStorageProvider, J>;

/// Case-insensitive property names, `null` members left out on write, timespans as `d.hh:mm:ss:FFF`.
pub fn default_serializer() -> SerdeJsonSerializer {
    SerdeJsonSerializer::configured(|options| {
        options.property_name_case_insensitive = true;
        options.ignore_null_on_write = true;
    })
}

pub fn local_storage(runtime: HostRuntime) -> BrowserLocalStorage {
    local_storage_with(runtime, default_serializer())
}

pub fn local_storage_with<J: JsonSerializer>(runtime: HostRuntime, serializer: J) -> BrowserLocalStorage<J> {
    LocalStorageService::new(BrowserStorageProvider::new(runtime), serializer)
}

/// One service for the whole application; listeners registered through any clone see every write.
pub fn shared_local_storage(runtime: HostRuntime) -> Arc<BrowserLocalStorage> {
    Arc::new(local_storage(runtime))
}

pub fn local_storage_from_settings(runtime: HostRuntime, settings: SerializerSettings) -> BrowserLocalStorage {
    local_storage_with(runtime, SerdeJsonSerializer::new(settings.into()))
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use stowage_json::SerializerSettings;

    use super::{local_storage, local_storage_from_settings};
    use crate::{host::HostRuntime, memory::MemoryStore, provider::StorageProvider};

    #[test]
    fn when_default_storage_writes_duration_then_it_is_stored_as_timespan() {
        let storage = local_storage(HostRuntime::in_process(MemoryStore::new()));

        storage.set_item("timeout", &Duration::from_secs(90)).expect("write should succeed");

        assert_eq!(storage.provider().get_item("timeout"), Ok(Some("\"0.00:01:30:\"".to_owned())));
        assert_eq!(storage.get_item::<Duration>("timeout").expect("read should succeed"), Some(Duration::from_secs(90)));
    }

    #[test]
    fn when_settings_ask_for_indentation_then_values_are_written_indented() {
        let settings = SerializerSettings { write_indented: true, ..SerializerSettings::default() };
        let storage = local_storage_from_settings(HostRuntime::in_process(MemoryStore::new()), settings);

        storage.set_item("point", &[1, 2]).expect("write should succeed");

        assert_eq!(storage.provider().get_item("point"), Ok(Some("[\n  1,\n  2\n]".to_owned())));
    }
}
