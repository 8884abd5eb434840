use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::access::AccessRequirement;

/// A renderable component kind that can be registered into a region.
///
/// Implementors are usually unit structs standing in for the real widget type.
/// `properties` lists the parameter names the component accepts; the parameter
/// builder rejects anything else. `access` declares the authorization
/// requirement a region view checks before showing the component.
pub trait Component: 'static {
    fn properties() -> &'static [&'static str] {
        &[]
    }

    fn access() -> Option<AccessRequirement> {
        None
    }
}

/// Type token identifying a [`Component`] implementation.
///
/// Equality and hashing only consider the underlying [`TypeId`].
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    properties: fn() -> &'static [&'static str],
    access: fn() -> Option<AccessRequirement>,
}

impl ComponentType {
    pub fn of<C: Component>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: short_name(type_name::<C>()),
            properties: C::properties,
            access: C::access,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Unqualified type name, used in error messages and logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn properties(&self) -> &'static [&'static str] {
        (self.properties)()
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties().contains(&property)
    }

    /// Evaluates the component's declared requirement. Prefer
    /// [`AccessCache::requirement`](crate::access::AccessCache::requirement),
    /// which memoizes this per type.
    pub fn access_requirement(&self) -> Option<AccessRequirement> {
        (self.access)()
    }

    pub fn is<C: Component>(&self) -> bool {
        self.id == TypeId::of::<C>()
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.name).finish()
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn short_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    let start = head.rfind("::").map(|idx| idx + 2).unwrap_or(0);
    &full[start..]
}

/// Typed handle to one property of component `C` holding values of type `V`.
///
/// Declare them as constants next to the component:
///
/// ```
/// use room_regions::{Component, Property};
///
/// struct Banner;
///
/// impl Banner {
///     const TITLE: Property<Banner, String> = Property::new("title");
/// }
///
/// impl Component for Banner {
///     fn properties() -> &'static [&'static str] {
///         &["title"]
///     }
/// }
///
/// assert_eq!(Banner::TITLE.name(), "title");
/// ```
pub struct Property<C, V> {
    name: &'static str,
    _marker: PhantomData<fn(&C) -> V>,
}

impl<C, V> Property<C, V> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<C, V> Clone for Property<C, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, V> Copy for Property<C, V> {}

impl<C, V> fmt::Debug for Property<C, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&self.name).finish()
    }
}
