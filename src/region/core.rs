use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use blake3::Hash;
use serde_json::json;

use crate::access::{AccessCache, Authorizer};
use crate::error::Result;
use crate::logging::{LogLevel, Logger, REGION_TARGET, event_with_fields, json_kv};
use crate::registry::{ComponentRegistration, RegionRegistry, SubscriptionId};
use crate::services::{self, ServiceScope};

/// Produces the output for one registration.
pub trait ComponentRenderer {
    fn render(&self, registration: &ComponentRegistration) -> String;
}

impl<F> ComponentRenderer for F
where
    F: Fn(&ComponentRegistration) -> String,
{
    fn render(&self, registration: &ComponentRegistration) -> String {
        self(registration)
    }
}

/// Wraps each rendered item, e.g. to add a frame around it.
pub type ItemTemplate = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Result of [`RegionView::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub content: String,
    pub items: usize,
    pub changed: bool,
}

/// A mounted placeholder that renders whatever is registered under its name.
///
/// The view subscribes on mount and only goes stale for notifications that
/// name its region or name no region at all. Dropping the view unsubscribes.
pub struct RegionView {
    name: String,
    registry: Arc<RegionRegistry>,
    access: Arc<AccessCache>,
    authorizer: Option<Arc<dyn Authorizer>>,
    subscription: Option<SubscriptionId>,
    stale: Arc<AtomicBool>,
    registrations: Vec<ComponentRegistration>,
    item_template: Option<ItemTemplate>,
    empty_content: Option<String>,
    separator: String,
    content: String,
    hash: Option<Hash>,
    logger: Option<Logger>,
}

impl RegionView {
    pub fn mount(
        name: impl Into<String>,
        registry: Arc<RegionRegistry>,
        access: Arc<AccessCache>,
    ) -> Self {
        let name = name.into();
        let stale = Arc::new(AtomicBool::new(false));
        let subscription = {
            let stale = Arc::clone(&stale);
            let region = name.clone();
            registry.subscribe(move |event| {
                if event.affects(&region) {
                    stale.store(true, Ordering::SeqCst);
                }
            })
        };
        let registrations = registry.registrations(&name);

        Self {
            name,
            registry,
            access,
            authorizer: None,
            subscription: Some(subscription),
            stale,
            registrations,
            item_template: None,
            empty_content: None,
            separator: "\n".to_string(),
            content: String::new(),
            hash: None,
            logger: None,
        }
    }

    /// Mount against the registry and access cache of `scope`.
    pub fn mount_in(scope: &ServiceScope, name: impl Into<String>) -> Result<Self> {
        let registry = services::region_registry(scope)?;
        let access = services::access_cache(scope)?;
        Ok(Self::mount(name, registry, access))
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn with_item_template<F>(mut self, template: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.item_template = Some(Arc::new(template));
        self
    }

    /// Content shown when nothing visible is registered.
    pub fn with_empty_content(mut self, content: impl Into<String>) -> Self {
        self.empty_content = Some(content.into());
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Reload registrations if a relevant notification arrived. Returns
    /// whether a reload happened.
    pub fn refresh(&mut self) -> bool {
        if !self.stale.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.reload();
        true
    }

    pub fn reload(&mut self) {
        self.registrations = self.registry.registrations(&self.name);
        if let Some(logger) = self.logger.as_ref() {
            let event = event_with_fields(
                LogLevel::Debug,
                REGION_TARGET,
                "region_reloaded",
                [
                    json_kv("region", json!(self.name)),
                    json_kv("registrations", self.registrations.len()),
                ],
            );
            let _ = logger.log_event(event);
        }
    }

    /// Registrations as of the last load, including hidden ones.
    pub fn registrations(&self) -> &[ComponentRegistration] {
        &self.registrations
    }

    /// Registrations the current authorizer may see.
    pub fn visible(&self) -> Vec<&ComponentRegistration> {
        let authorizer = self.authorizer.as_deref();
        self.registrations
            .iter()
            .filter(|registration| self.access.permits(registration.component(), authorizer))
            .collect()
    }

    /// Refresh if needed, then render every visible registration.
    pub fn render<R>(&mut self, renderer: &R) -> RenderOutcome
    where
        R: ComponentRenderer + ?Sized,
    {
        self.refresh();

        let items: Vec<String> = self
            .visible()
            .into_iter()
            .map(|registration| {
                let body = renderer.render(registration);
                match self.item_template.as_ref() {
                    Some(template) => template(&body),
                    None => body,
                }
            })
            .collect();

        let content = if items.is_empty() {
            self.empty_content.clone().unwrap_or_default()
        } else {
            items.join(&self.separator)
        };

        let new_hash = blake3::hash(content.as_bytes());
        let changed = self.hash.map(|h| h != new_hash).unwrap_or(true);
        if changed {
            self.content = content.clone();
            self.hash = Some(new_hash);
        }

        RenderOutcome {
            content,
            items: items.len(),
            changed,
        }
    }

    /// Output of the last render.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn unmount(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.registry.unsubscribe(id);
        }
    }
}

impl Drop for RegionView {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessRequirement, Principal};
    use crate::component::{Component, Parameters};
    use crate::logging::MemorySink;

    struct Greeting;
    impl Component for Greeting {
        fn properties() -> &'static [&'static str] {
            &["name"]
        }
    }

    struct Clock;
    impl Component for Clock {}

    struct AdminTools;
    impl Component for AdminTools {
        fn access() -> Option<AccessRequirement> {
            Some(AccessRequirement::roles("admin"))
        }
    }

    fn describe(registration: &ComponentRegistration) -> String {
        let name = registration
            .parameters()
            .and_then(|p| p.get::<String>("name"))
            .cloned()
            .unwrap_or_default();
        format!("{}({}){}", registration.component(), registration.key(), name)
    }

    fn setup() -> (Arc<RegionRegistry>, Arc<AccessCache>) {
        (Arc::new(RegionRegistry::new()), Arc::new(AccessCache::new()))
    }

    #[test]
    fn empty_region_renders_fallback() {
        let (registry, access) = setup();
        let mut view = RegionView::mount("Main", registry, access).with_empty_content("nothing here");
        let outcome = view.render(&describe);
        assert_eq!(outcome.content, "nothing here");
        assert_eq!(outcome.items, 0);
        assert!(outcome.changed);
    }

    #[test]
    fn renders_registrations_with_parameters() {
        let (registry, access) = setup();
        registry
            .register_keyed::<Greeting>("Main", "", Some(Parameters::new().with("name", "Ada".to_string())))
            .unwrap();
        registry.register::<Clock>("Main").unwrap();
        registry.register::<Clock>("Other").unwrap();

        let mut view = RegionView::mount("Main", registry, access).with_separator(" | ");
        let outcome = view.render(&describe);
        assert_eq!(outcome.content, "Greeting()Ada | Clock()");
        assert_eq!(view.content(), "Greeting()Ada | Clock()");
    }

    #[test]
    fn only_relevant_notifications_mark_stale() {
        let (registry, access) = setup();
        let mut view = RegionView::mount("Main", Arc::clone(&registry), access);

        registry.register::<Clock>("Main").unwrap();
        registry.raise_regions_changed(["Other"]);
        assert!(!view.is_stale());
        assert!(!view.refresh());
        assert!(view.registrations().is_empty());

        registry.raise_regions_changed(["Main"]);
        assert!(view.refresh());
        assert_eq!(view.registrations().len(), 1);

        registry.unregister::<Clock>("Main", "").unwrap();
        registry.raise_all_changed();
        assert!(view.is_stale());
        assert!(view.render(&describe).changed);
        assert!(view.registrations().is_empty());
    }

    #[test]
    fn unchanged_output_is_not_reported_as_change() {
        let (registry, access) = setup();
        registry.register::<Clock>("Main").unwrap();
        let mut view = RegionView::mount("Main", Arc::clone(&registry), access);
        assert!(view.render(&describe).changed);
        registry.raise_regions_changed(["Main"]);
        assert!(!view.render(&describe).changed);
    }

    #[test]
    fn authorization_hides_components() {
        let (registry, access) = setup();
        registry.register::<AdminTools>("Main").unwrap();
        registry.register::<Clock>("Main").unwrap();

        let mut anonymous = RegionView::mount("Main", Arc::clone(&registry), Arc::clone(&access));
        assert_eq!(anonymous.render(&describe).content, "Clock()");

        let admin = Arc::new(Principal::authenticated().with_role("admin"));
        let mut privileged = RegionView::mount("Main", registry, access).with_authorizer(admin);
        assert_eq!(privileged.render(&describe).items, 2);
        assert_eq!(privileged.registrations().len(), 2);
    }

    #[test]
    fn item_template_wraps_each_item() {
        let (registry, access) = setup();
        registry.register_keyed::<Clock>("Main", "a", None).unwrap();
        registry.register_keyed::<Clock>("Main", "b", None).unwrap();
        let mut view = RegionView::mount("Main", registry, access)
            .with_item_template(|body| format!("[{body}]"))
            .with_separator("");
        assert_eq!(view.render(&describe).content, "[Clock(a)][Clock(b)]");
    }

    #[test]
    fn drop_unsubscribes() {
        let (registry, access) = setup();
        let mut view = RegionView::mount("Main", Arc::clone(&registry), Arc::clone(&access));
        assert_eq!(registry.subscriber_count(), 1);
        view.unmount();
        assert!(!view.is_mounted());
        assert_eq!(registry.subscriber_count(), 0);

        {
            let _scoped = RegionView::mount("Main", Arc::clone(&registry), access);
            assert_eq!(registry.subscriber_count(), 1);
        }
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn mount_in_scope_uses_scoped_registry() {
        let scope = ServiceScope::root().create_scope();
        services::region_registry(&scope)
            .unwrap()
            .register::<Clock>("Main")
            .unwrap();
        let sink = Arc::new(MemorySink::new());
        let mut view = RegionView::mount_in(&scope, "Main")
            .unwrap()
            .with_logger(Logger::from_arc(sink.clone()));
        assert_eq!(view.registrations().len(), 1);

        view.reload();
        assert_eq!(sink.messages(), vec!["region_reloaded".to_string()]);
    }
}
