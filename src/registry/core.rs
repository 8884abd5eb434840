use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use serde_json::{Value, json};

use crate::component::{self, Component, ComponentType, ParameterBuilder, Parameters};
use crate::error::{ParameterError, RegionError, Result};
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::metrics::RegistryMetrics;

use super::audit::{RegistryAuditEventBuilder, RegistryAuditStage};
use super::config::RegistryConfig;
use super::events::{RegionEvents, RegionsChanged, SubscriptionId};
use super::index::{RegistrationIndex, Removal};
use super::registration::ComponentRegistration;

/// Registry mapping region names to the components registered into them.
///
/// Every registration is identified by `(region, component type, key)`; the
/// empty key is the default slot. The index sits behind a single lock taken
/// once per public call. Mutations never notify on their own: callers batch
/// their changes and then call [`raise_regions_changed`](Self::raise_regions_changed).
pub struct RegionRegistry {
    index: RwLock<RegistrationIndex>,
    events: RegionEvents,
    config: RegistryConfig,
    created_at: Instant,
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            index: RwLock::new(RegistrationIndex::default()),
            events: RegionEvents::new(),
            config,
            created_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register `C` under the default key without parameters.
    pub fn register<C: Component>(&self, region: &str) -> Result<()> {
        self.register_keyed::<C>(region, "", None)
    }

    /// Fails with [`RegionError::DuplicateKey`] when `(region, C, key)` is taken.
    pub fn register_keyed<C: Component>(
        &self,
        region: &str,
        key: &str,
        parameters: Option<Parameters>,
    ) -> Result<()> {
        let component = ComponentType::of::<C>();
        if self.insert(region, component, key, parameters) {
            Ok(())
        } else {
            Err(RegionError::DuplicateKey {
                region: region.to_string(),
                component: component.name().to_string(),
                key: key.to_string(),
            })
        }
    }

    /// Register with parameters produced by a [`ParameterBuilder`] callback.
    ///
    /// Builder failures are raised before the index is touched.
    pub fn register_with<C, F>(&self, region: &str, key: &str, configure: F) -> Result<()>
    where
        C: Component,
        F: FnOnce(&mut ParameterBuilder<C>) -> std::result::Result<(), ParameterError>,
    {
        let parameters = component::configure::<C, F>(configure)?;
        self.register_keyed::<C>(region, key, Some(parameters))
    }

    pub fn try_register<C: Component>(&self, region: &str) -> bool {
        self.try_register_keyed::<C>(region, "", None)
    }

    /// Like [`register_keyed`](Self::register_keyed) but reports a taken slot
    /// as `false`. The existing registration is kept as is.
    pub fn try_register_keyed<C: Component>(
        &self,
        region: &str,
        key: &str,
        parameters: Option<Parameters>,
    ) -> bool {
        self.insert(region, ComponentType::of::<C>(), key, parameters)
    }

    /// Only parameter builder failures are errors; a taken slot is `Ok(false)`.
    pub fn try_register_with<C, F>(&self, region: &str, key: &str, configure: F) -> Result<bool>
    where
        C: Component,
        F: FnOnce(&mut ParameterBuilder<C>) -> std::result::Result<(), ParameterError>,
    {
        let parameters = component::configure::<C, F>(configure)?;
        Ok(self.try_register_keyed::<C>(region, key, Some(parameters)))
    }

    /// Fails with [`RegionError::RegionNotFound`] for a region that never had a
    /// registration and [`RegionError::RegistrationNotFound`] when the region
    /// is known but `(C, key)` is absent.
    pub fn unregister<C: Component>(&self, region: &str, key: &str) -> Result<()> {
        let component = ComponentType::of::<C>();
        match self.remove(region, component, key) {
            Removal::Removed(_) => Ok(()),
            Removal::UnknownRegion => Err(RegionError::RegionNotFound(region.to_string())),
            Removal::Missing => Err(RegionError::RegistrationNotFound {
                region: region.to_string(),
                component: component.name().to_string(),
                key: key.to_string(),
            }),
        }
    }

    /// Returns whether a registration was removed. An unknown region is still
    /// an error, unlike [`try_register`](Self::try_register).
    pub fn try_unregister<C: Component>(&self, region: &str, key: &str) -> Result<bool> {
        match self.remove(region, ComponentType::of::<C>(), key) {
            Removal::Removed(_) => Ok(true),
            Removal::Missing => Ok(false),
            Removal::UnknownRegion => Err(RegionError::RegionNotFound(region.to_string())),
        }
    }

    /// All registrations of `region` across component types; empty when the
    /// region is unknown.
    pub fn registrations(&self, region: &str) -> Vec<ComponentRegistration> {
        self.read_index().region(region)
    }

    pub fn registration<C: Component>(
        &self,
        region: &str,
        key: &str,
    ) -> Option<ComponentRegistration> {
        self.read_index()
            .get(region, ComponentType::of::<C>(), key)
            .cloned()
    }

    pub fn contains<C: Component>(&self, region: &str, key: &str) -> bool {
        self.read_index()
            .get(region, ComponentType::of::<C>(), key)
            .is_some()
    }

    /// Whether `region` has ever received a registration.
    pub fn has_region(&self, region: &str) -> bool {
        self.read_index().has_region(region)
    }

    pub fn region_names(&self) -> Vec<String> {
        self.read_index().region_names()
    }

    pub fn len(&self) -> usize {
        self.read_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify subscribers that `regions` changed. An empty list tells every
    /// subscriber to reload; see [`raise_all_changed`](Self::raise_all_changed).
    pub fn raise_regions_changed<I, S>(&self, regions: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatch(RegionsChanged::new(regions))
    }

    pub fn raise_all_changed(&self) -> usize {
        self.dispatch(RegionsChanged::all())
    }

    /// Handlers run synchronously inside `raise_*`. They may query the
    /// registry but must not mutate it.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&RegionsChanged) + Send + Sync + 'static,
    {
        let id = self.events.subscribe(handler);
        self.observe(
            RegistryAuditStage::Subscribed,
            LogLevel::Debug,
            "subscribed",
            vec![json_kv("subscription", id.raw())],
        );
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.events.unsubscribe(id);
        if removed {
            self.observe(
                RegistryAuditStage::Unsubscribed,
                LogLevel::Debug,
                "unsubscribed",
                vec![json_kv("subscription", id.raw())],
            );
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.len()
    }

    /// Write a metrics snapshot through the configured logger.
    pub fn emit_metrics(&self) {
        let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        else {
            return;
        };
        let snapshot = metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot(self.created_at.elapsed());
        let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
    }

    fn insert(
        &self,
        region: &str,
        component: ComponentType,
        key: &str,
        parameters: Option<Parameters>,
    ) -> bool {
        let registration = ComponentRegistration::new(key, component, parameters);
        let inserted = self.write_index().insert(region, registration);

        let fields = registration_fields(region, component, key);
        if inserted {
            self.record_metric(|metrics| metrics.record_registration());
            self.observe(RegistryAuditStage::Registered, LogLevel::Debug, "registered", fields);
        } else {
            self.record_metric(|metrics| metrics.record_rejected());
            self.observe(
                RegistryAuditStage::RegistrationRejected,
                LogLevel::Warn,
                "registration_rejected",
                fields,
            );
        }
        inserted
    }

    fn remove(&self, region: &str, component: ComponentType, key: &str) -> Removal {
        let removal = self.write_index().remove(region, component, key);
        if let Removal::Removed(_) = removal {
            self.record_metric(|metrics| metrics.record_unregistration());
            self.observe(
                RegistryAuditStage::Unregistered,
                LogLevel::Debug,
                "unregistered",
                registration_fields(region, component, key),
            );
        }
        removal
    }

    fn dispatch(&self, event: RegionsChanged) -> usize {
        let delivered = self.events.emit(&event);
        self.record_metric(|metrics| metrics.record_notification(delivered));
        self.observe(
            RegistryAuditStage::RegionsChanged,
            LogLevel::Debug,
            "regions_changed",
            vec![
                json_kv("regions", json!(event.regions())),
                json_kv("delivered", delivered),
            ],
        );
        delivered
    }

    fn read_index(&self) -> RwLockReadGuard<'_, RegistrationIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, RegistrationIndex> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_metric(&self, update: impl FnOnce(&mut RegistryMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            let mut guard = metrics.lock().unwrap_or_else(PoisonError::into_inner);
            update(&mut *guard);
        }
    }

    fn observe(
        &self,
        stage: RegistryAuditStage,
        level: LogLevel,
        message: &str,
        fields: Vec<(String, Value)>,
    ) {
        if let Some(audit) = self.config.audit.as_ref() {
            let event = fields
                .iter()
                .fold(RegistryAuditEventBuilder::new(stage), |builder, (key, value)| {
                    builder.detail(key.clone(), value.clone())
                })
                .finish();
            audit.record(event);
        }
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, &self.config.log_target, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

impl std::fmt::Debug for RegionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionRegistry")
            .field("registrations", &self.len())
            .field("subscribers", &self.events.len())
            .field("config", &self.config)
            .finish()
    }
}

fn registration_fields(region: &str, component: ComponentType, key: &str) -> Vec<(String, Value)> {
    vec![
        json_kv("region", region),
        json_kv("component", component.name()),
        json_kv("key", key),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Property;
    use crate::logging::{Logger, MemorySink};
    use crate::registry::audit::MemoryAudit;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const MAIN: &str = "Main";

    struct TypeX;
    impl Component for TypeX {}

    struct TypeY;
    impl Component for TypeY {}

    struct InputText;

    impl InputText {
        const VALUE: Property<InputText, String> = Property::new("value");
        const PLACEHOLDER: Property<InputText, String> = Property::new("placeholder");
    }

    impl Component for InputText {
        fn properties() -> &'static [&'static str] {
            &["value"]
        }
    }

    fn keys(registry: &RegionRegistry, region: &str) -> Vec<String> {
        let mut keys: Vec<String> = registry
            .registrations(region)
            .iter()
            .map(|r| format!("{}:{}", r.component(), r.key()))
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn unknown_region_has_no_registrations() {
        let registry = RegionRegistry::new();
        assert!(registry.registrations("Nowhere").is_empty());
        assert!(!registry.has_region("Nowhere"));
    }

    #[test]
    fn registration_exposes_type_key_and_parameters() {
        let registry = RegionRegistry::new();
        registry
            .register_keyed::<InputText>(MAIN, "", Some(Parameters::new().with("value", "x".to_string())))
            .unwrap();

        let found = registry.registrations(MAIN);
        assert_eq!(found.len(), 1);
        assert!(found[0].component().is::<InputText>());
        assert!(found[0].is_default_key());
        let params = found[0].parameters().unwrap();
        assert_eq!(params.get::<String>("value").map(String::as_str), Some("x"));
    }

    #[test]
    fn uniqueness_is_scoped_per_type() {
        let registry = RegionRegistry::new();
        registry.register::<TypeX>(MAIN).unwrap();
        registry.register::<TypeY>(MAIN).unwrap();
        assert_eq!(keys(&registry, MAIN), vec!["TypeX:", "TypeY:"]);
    }

    #[test]
    fn duplicate_register_fails_and_keeps_index() {
        let registry = RegionRegistry::new();
        registry
            .register_keyed::<TypeX>(MAIN, "k", Some(Parameters::new().with("n", 1u8)))
            .unwrap();

        let err = registry
            .register_keyed::<TypeX>(MAIN, "k", Some(Parameters::new().with("n", 2u8)))
            .unwrap_err();
        assert!(matches!(err, RegionError::DuplicateKey { .. }));
        assert!(err.to_string().contains("with key \"k\""));

        let found = registry.registrations(MAIN);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].parameters().unwrap().get::<u8>("n"), Some(&1));
    }

    #[test]
    fn try_register_does_not_overwrite() {
        let registry = RegionRegistry::new();
        let first = Parameters::new().with("n", 1u8);
        assert!(registry.try_register_keyed::<TypeX>(MAIN, "", Some(first)));
        assert!(!registry.try_register_keyed::<TypeX>(MAIN, "", Some(Parameters::new().with("n", 2u8))));
        assert!(!registry.try_register::<TypeX>(MAIN));

        let found = registry.registration::<TypeX>(MAIN, "").unwrap();
        assert_eq!(found.parameters().unwrap().get::<u8>("n"), Some(&1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_type_with_distinct_keys() {
        let registry = RegionRegistry::new();
        assert!(registry.try_register_keyed::<TypeX>(MAIN, "1", None));
        assert!(registry.try_register_keyed::<TypeX>(MAIN, "2", None));
        registry.unregister::<TypeX>(MAIN, "1").unwrap();
        assert_eq!(keys(&registry, MAIN), vec!["TypeX:2"]);
    }

    #[test]
    fn unregister_leaves_siblings() {
        let registry = RegionRegistry::new();
        registry.register::<TypeX>(MAIN).unwrap();
        registry.register_keyed::<TypeX>(MAIN, "extra", None).unwrap();
        registry.register::<TypeY>(MAIN).unwrap();
        registry.register::<TypeX>("Other").unwrap();

        registry.unregister::<TypeX>(MAIN, "").unwrap();
        assert_eq!(keys(&registry, MAIN), vec!["TypeX:extra", "TypeY:"]);
        assert_eq!(keys(&registry, "Other"), vec!["TypeX:"]);
    }

    #[test]
    fn unregister_unknown_region_fails() {
        let registry = RegionRegistry::new();
        let err = registry.unregister::<TypeX>("Ghost", "").unwrap_err();
        assert!(matches!(err, RegionError::RegionNotFound(ref name) if name == "Ghost"));
        assert!(err.to_string().contains("Ghost"));

        let err = registry.try_unregister::<TypeX>("Ghost", "").unwrap_err();
        assert!(matches!(err, RegionError::RegionNotFound(_)));
    }

    #[test]
    fn unregister_missing_entry_message_depends_on_key() {
        let registry = RegionRegistry::new();
        registry.register::<TypeY>(MAIN).unwrap();

        let default_key = registry.unregister::<TypeX>(MAIN, "").unwrap_err();
        assert!(matches!(default_key, RegionError::RegistrationNotFound { .. }));
        assert_eq!(
            default_key.to_string(),
            "the type TypeX is not registered with region \"Main\""
        );

        let keyed = registry.unregister::<TypeY>(MAIN, "7").unwrap_err();
        assert_eq!(
            keyed.to_string(),
            "the type TypeY is not registered with key \"7\" with region \"Main\""
        );
    }

    #[test]
    fn try_unregister_reports_absence() {
        let registry = RegionRegistry::new();
        registry.register::<TypeX>(MAIN).unwrap();
        assert!(!registry.try_unregister::<TypeY>(MAIN, "").unwrap());
        assert!(registry.try_unregister::<TypeX>(MAIN, "").unwrap());
        assert!(!registry.try_unregister::<TypeX>(MAIN, "").unwrap());
        assert!(registry.has_region(MAIN));
        assert!(registry.registrations(MAIN).is_empty());
    }

    #[test]
    fn builder_callback_populates_parameters() {
        let registry = RegionRegistry::new();
        registry
            .register_with::<InputText, _>(MAIN, "", |p| {
                p.add(InputText::VALUE, "hello".to_string())?;
                Ok(())
            })
            .unwrap();
        let found = registry.registration::<InputText>(MAIN, "").unwrap();
        assert_eq!(
            found.parameters().unwrap().get::<String>("value").map(String::as_str),
            Some("hello")
        );

        let again = registry
            .try_register_with::<InputText, _>(MAIN, "", |p| {
                p.add(InputText::VALUE, String::new())?;
                Ok(())
            })
            .unwrap();
        assert!(!again);
    }

    #[test]
    fn builder_failure_registers_nothing() {
        let registry = RegionRegistry::new();
        let err = registry
            .register_with::<InputText, _>(MAIN, "", |p| {
                p.add(InputText::PLACEHOLDER, "type here".to_string())?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RegionError::Parameter(ParameterError::UnknownProperty { .. })
        ));
        assert!(!registry.has_region(MAIN));

        let err = registry
            .try_register_with::<InputText, _>(MAIN, "", |p| {
                p.add(InputText::PLACEHOLDER, String::new())?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, RegionError::Parameter(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn raise_delivers_to_every_subscriber() {
        let registry = RegionRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..3 {
            let sink = Arc::clone(&seen);
            registry.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        }

        assert_eq!(registry.raise_regions_changed(["A"]), 3);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|event| event.regions() == ["A".to_string()]));
    }

    #[test]
    fn raise_without_regions_is_global() {
        let registry = RegionRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        registry.subscribe(move |event| {
            if event.affects("Sidebar") {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        registry.raise_all_changed();
        registry.raise_regions_changed(Vec::<String>::new());
        registry.raise_regions_changed(["Main"]);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn raise_without_subscribers_is_noop() {
        let registry = RegionRegistry::new();
        assert_eq!(registry.raise_regions_changed(["Main"]), 0);
    }

    #[test]
    fn handler_can_query_during_notification() {
        let registry = Arc::new(RegionRegistry::new());
        registry.register::<TypeX>(MAIN).unwrap();
        let observed = Arc::new(AtomicUsize::new(0));
        let (reader, count) = (Arc::clone(&registry), Arc::clone(&observed));
        let id = registry.subscribe(move |_| {
            count.store(reader.registrations(MAIN).len(), Ordering::SeqCst);
        });

        registry.raise_regions_changed([MAIN]);
        assert_eq!(observed.load(Ordering::SeqCst), 1);
        assert!(registry.unsubscribe(id));
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn observability_hooks_record_activity() {
        let sink = Arc::new(MemorySink::new());
        let audit = Arc::new(MemoryAudit::new());
        let mut config = RegistryConfig::default()
            .with_logger(Logger::from_arc(sink.clone()))
            .with_audit(audit.clone());
        config.enable_metrics();
        let metrics = config.metrics_handle().unwrap();
        let registry = RegionRegistry::with_config(config);

        registry.register::<TypeX>(MAIN).unwrap();
        assert!(!registry.try_register::<TypeX>(MAIN));
        registry.unregister::<TypeX>(MAIN, "").unwrap();
        registry.raise_regions_changed([MAIN]);
        registry.emit_metrics();

        assert_eq!(
            audit.stages(),
            vec![
                RegistryAuditStage::Registered,
                RegistryAuditStage::RegistrationRejected,
                RegistryAuditStage::Unregistered,
                RegistryAuditStage::RegionsChanged,
            ]
        );
        assert_eq!(audit.events()[0].detail("component"), Some(&json!("TypeX")));

        let messages = sink.messages();
        assert_eq!(
            messages,
            vec![
                "registered",
                "registration_rejected",
                "unregistered",
                "regions_changed",
                "registry_metrics",
            ]
        );

        let snapshot = metrics.lock().unwrap().snapshot(std::time::Duration::ZERO);
        assert_eq!(snapshot.registrations, 1);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.unregistrations, 1);
        assert_eq!(snapshot.notifications, 1);
        assert_eq!(snapshot.deliveries, 0);
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        let registry = Arc::new(RegionRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .register_keyed::<TypeX>(MAIN, &n.to_string(), None)
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.registrations(MAIN).len(), 4);
    }
}
