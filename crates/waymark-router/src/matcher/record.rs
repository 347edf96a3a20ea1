//! Route definitions and the normalized records built from them.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use crate::guard::Guard;

/// Name of the component slot used by single-component routes.
pub const DEFAULT_SLOT: &str = "default";

/// Lifecycle hooks a component can expose to the guard pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentHook {
	/// Runs when the component's record is left.
	BeforeRouteLeave,
	/// Runs when the component's record stays matched across a navigation.
	BeforeRouteUpdate,
	/// Runs when the component's record is entered.
	BeforeRouteEnter,
}

impl ComponentHook {
	/// The hook name the view layer uses for this slot.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::BeforeRouteLeave => "beforeRouteLeave",
			Self::BeforeRouteUpdate => "beforeRouteUpdate",
			Self::BeforeRouteEnter => "beforeRouteEnter",
		}
	}

	/// Looks a hook up by its name.
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"beforeRouteLeave" => Some(Self::BeforeRouteLeave),
			"beforeRouteUpdate" => Some(Self::BeforeRouteUpdate),
			"beforeRouteEnter" => Some(Self::BeforeRouteEnter),
			_ => None,
		}
	}
}

impl fmt::Display for ComponentHook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A component slot value.
///
/// The router never renders components. It only needs a name for the view
/// layer and the lifecycle guards the component exposes.
#[derive(Clone)]
pub struct Component {
	name: String,
	hooks: HashMap<ComponentHook, Guard>,
}

impl Component {
	/// Creates a component without hooks.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			hooks: HashMap::new(),
		}
	}

	/// Attaches a lifecycle guard, replacing any previous one for the hook.
	pub fn hook(mut self, hook: ComponentHook, guard: impl Into<Guard>) -> Self {
		self.hooks.insert(hook, guard.into());
		self
	}

	/// Shorthand for [`ComponentHook::BeforeRouteLeave`].
	pub fn before_route_leave(self, guard: impl Into<Guard>) -> Self {
		self.hook(ComponentHook::BeforeRouteLeave, guard)
	}

	/// Shorthand for [`ComponentHook::BeforeRouteUpdate`].
	pub fn before_route_update(self, guard: impl Into<Guard>) -> Self {
		self.hook(ComponentHook::BeforeRouteUpdate, guard)
	}

	/// Shorthand for [`ComponentHook::BeforeRouteEnter`].
	pub fn before_route_enter(self, guard: impl Into<Guard>) -> Self {
		self.hook(ComponentHook::BeforeRouteEnter, guard)
	}

	/// Returns the component name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the guard registered for `hook`.
	pub fn guard(&self, hook: ComponentHook) -> Option<&Guard> {
		self.hooks.get(&hook)
	}

	/// Looks a guard up by hook name, e.g. `"beforeRouteLeave"`.
	pub fn guard_by_name(&self, name: &str) -> Option<&Guard> {
		ComponentHook::from_name(name).and_then(|hook| self.guard(hook))
	}
}

impl fmt::Debug for Component {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut hooks: Vec<_> = self.hooks.keys().map(|hook| hook.as_str()).collect();
		hooks.sort_unstable();
		f.debug_struct("Component")
			.field("name", &self.name)
			.field("hooks", &hooks)
			.finish()
	}
}

/// User-supplied route definition.
#[derive(Clone, Default)]
pub struct RouteDefinition {
	pub(crate) path: String,
	pub(crate) name: Option<String>,
	pub(crate) components: BTreeMap<String, Component>,
	pub(crate) before_enter: Option<Guard>,
	pub(crate) meta: Map<String, Value>,
	pub(crate) children: Vec<RouteDefinition>,
}

impl RouteDefinition {
	/// Creates a definition for `path`.
	///
	/// A path starting with `/` is absolute. Anything else is resolved
	/// against the parent route's path.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			..Self::default()
		}
	}

	/// Sets the route name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the component of the default slot.
	pub fn component(self, component: Component) -> Self {
		self.named_component(DEFAULT_SLOT, component)
	}

	/// Sets the component of a named slot.
	pub fn named_component(mut self, slot: impl Into<String>, component: Component) -> Self {
		self.components.insert(slot.into(), component);
		self
	}

	/// Sets the record-level enter guard.
	pub fn before_enter(mut self, guard: impl Into<Guard>) -> Self {
		self.before_enter = Some(guard.into());
		self
	}

	/// Adds a metadata entry.
	pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.meta.insert(key.into(), value.into());
		self
	}

	/// Adds a child definition.
	pub fn child(mut self, child: RouteDefinition) -> Self {
		self.children.push(child);
		self
	}

	/// Adds several child definitions.
	pub fn children(mut self, children: impl IntoIterator<Item = RouteDefinition>) -> Self {
		self.children.extend(children);
		self
	}

	/// Returns the raw, unnormalized path.
	pub fn path(&self) -> &str {
		&self.path
	}
}

impl fmt::Debug for RouteDefinition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteDefinition")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("components", &self.components)
			.field("has_before_enter", &self.before_enter.is_some())
			.field("children", &self.children)
			.finish()
	}
}

/// A normalized route, shared by the matcher and every location it matched.
#[derive(Clone)]
pub struct RouteRecord {
	path: String,
	name: Option<String>,
	components: BTreeMap<String, Component>,
	before_enter: Option<Guard>,
	meta: Map<String, Value>,
}

impl RouteRecord {
	pub(crate) fn from_definition(definition: &RouteDefinition, path: String) -> Self {
		Self {
			path,
			name: definition.name.clone(),
			components: definition.components.clone(),
			before_enter: definition.before_enter.clone(),
			meta: definition.meta.clone(),
		}
	}

	/// Normalized absolute path.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Route name.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// All component slots.
	pub fn components(&self) -> &BTreeMap<String, Component> {
		&self.components
	}

	/// Component of the default slot.
	pub fn component(&self) -> Option<&Component> {
		self.components.get(DEFAULT_SLOT)
	}

	/// Components in guard lookup order: the default slot first, then the
	/// named slots by name.
	pub fn components_in_guard_order(&self) -> impl Iterator<Item = &Component> {
		self.component().into_iter().chain(
			self.components
				.iter()
				.filter(|(slot, _)| slot.as_str() != DEFAULT_SLOT)
				.map(|(_, component)| component),
		)
	}

	/// Record-level enter guard.
	pub fn before_enter(&self) -> Option<&Guard> {
		self.before_enter.as_ref()
	}

	/// Metadata bag.
	pub fn meta(&self) -> &Map<String, Value> {
		&self.meta
	}
}

impl fmt::Debug for RouteRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteRecord")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("components", &self.components)
			.field("has_before_enter", &self.before_enter.is_some())
			.field("meta", &self.meta)
			.finish()
	}
}

impl PartialEq for RouteRecord {
	fn eq(&self, other: &Self) -> bool {
		self.path == other.path
	}
}

impl Eq for RouteRecord {}
