//! Route tree and path resolution.
//!
//! The matcher turns user [`RouteDefinition`]s into a tree of
//! [`RouteRecord`]s and resolves a path to the root-to-leaf chain of records
//! that owns it. Matching is literal: a path resolves only to the record
//! whose normalized path is equal to it.
//!
//! ```
//! use waymark_router::matcher::{PathMatcher, RouteDefinition};
//!
//! let matcher = PathMatcher::new(vec![
//! 	RouteDefinition::new("/about")
//! 		.name("about")
//! 		.children(vec![RouteDefinition::new("m"), RouteDefinition::new("n")]),
//! ])
//! .unwrap();
//!
//! let location = matcher.resolve("/about/n").unwrap();
//! let paths: Vec<&str> = location.matched().iter().map(|r| r.path()).collect();
//! assert_eq!(paths, vec!["/about", "/about/n"]);
//! assert!(matcher.resolve("/missing").is_err());
//! ```

mod path;
mod record;

pub use path::{SEPARATOR, join_paths, normalize_path, split_location};
pub use record::{Component, ComponentHook, DEFAULT_SLOT, RouteDefinition, RouteRecord};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{RouterError, RouterResult};
use crate::location::Location;

/// Runtime wrapper around a record, linked into the route tree.
struct MatcherNode {
	record: Arc<RouteRecord>,
	parent: Option<usize>,
	children: Vec<usize>,
}

/// The route tree.
///
/// Nodes live in a slab; removed nodes leave a hole so that the indices held
/// by parents and children stay valid.
#[derive(Default)]
pub struct PathMatcher {
	nodes: Vec<Option<MatcherNode>>,
	/// Registration order of live nodes.
	order: Vec<usize>,
	by_path: HashMap<String, usize>,
	by_name: HashMap<String, usize>,
}

impl fmt::Debug for PathMatcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PathMatcher")
			.field("routes", &self.paths())
			.field("named_routes", &self.by_name.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl PathMatcher {
	/// Builds a matcher from top-level definitions.
	pub fn new(definitions: impl IntoIterator<Item = RouteDefinition>) -> RouterResult<Self> {
		let mut matcher = Self::default();
		for definition in definitions {
			matcher.add_route(definition, None)?;
		}
		Ok(matcher)
	}

	/// Registers a definition and its children.
	///
	/// `parent` is the normalized path of an already registered route. The
	/// whole subtree is validated before anything is inserted, so a failed
	/// call leaves the matcher unchanged.
	pub fn add_route(
		&mut self,
		definition: RouteDefinition,
		parent: Option<&str>,
	) -> RouterResult<()> {
		let parent_index = match parent {
			Some(parent_path) => {
				let normalized = normalize_path(parent_path);
				Some(
					*self
						.by_path
						.get(&normalized)
						.ok_or_else(|| RouterError::no_match(normalized))?,
				)
			}
			None => None,
		};
		let parent_path = parent_index.map(|index| self.record_at(index).path().to_string());

		let mut seen_paths = Vec::new();
		let mut seen_names = Vec::new();
		self.validate(
			&definition,
			parent_path.as_deref(),
			&mut seen_paths,
			&mut seen_names,
		)?;

		self.insert(&definition, parent_index);
		Ok(())
	}

	fn validate(
		&self,
		definition: &RouteDefinition,
		parent_path: Option<&str>,
		seen_paths: &mut Vec<String>,
		seen_names: &mut Vec<String>,
	) -> RouterResult<()> {
		let path = join_paths(parent_path, &definition.path);

		if self.by_path.contains_key(&path) || seen_paths.contains(&path) {
			return Err(RouterError::DuplicateRoute { path });
		}
		if let Some(name) = &definition.name {
			if name.trim().is_empty() {
				return Err(RouterError::InvalidRoute(format!(
					"route '{}' has an empty name",
					path
				)));
			}
			if self.by_name.contains_key(name) || seen_names.contains(name) {
				return Err(RouterError::InvalidRoute(format!(
					"route name '{}' is already in use",
					name
				)));
			}
			seen_names.push(name.clone());
		}
		seen_paths.push(path.clone());

		for child in &definition.children {
			self.validate(child, Some(&path), seen_paths, seen_names)?;
		}
		Ok(())
	}

	fn insert(&mut self, definition: &RouteDefinition, parent: Option<usize>) -> usize {
		let parent_path = parent.map(|index| self.record_at(index).path().to_string());
		let path = join_paths(parent_path.as_deref(), &definition.path);
		let record = Arc::new(RouteRecord::from_definition(definition, path.clone()));

		let index = self.nodes.len();
		self.nodes.push(Some(MatcherNode {
			record,
			parent,
			children: Vec::new(),
		}));
		if let Some(parent) = parent
			&& let Some(node) = self.nodes[parent].as_mut()
		{
			node.children.push(index);
		}

		for child in &definition.children {
			self.insert(child, Some(index));
		}

		tracing::debug!(path = %path, name = ?definition.name, "route registered");
		self.by_path.insert(path, index);
		if let Some(name) = &definition.name {
			self.by_name.insert(name.clone(), index);
		}
		self.order.push(index);
		index
	}

	/// Resolves `path` to the chain of records that owns it.
	///
	/// Query strings and fragments are ignored for matching but kept in
	/// [`Location::full_path`].
	///
	/// # Errors
	///
	/// Returns [`RouterError::NoMatch`] when no record has the normalized path.
	pub fn resolve(&self, path: &str) -> RouterResult<Location> {
		let (bare, _, _) = split_location(path);
		let normalized = normalize_path(bare);
		let index = *self
			.by_path
			.get(&normalized)
			.ok_or_else(|| RouterError::no_match(normalized.clone()))?;

		let mut matched = Vec::new();
		let mut cursor = Some(index);
		while let Some(current) = cursor {
			let node = self.node_at(current);
			matched.push(Arc::clone(&node.record));
			cursor = node.parent;
		}
		matched.reverse();

		Ok(Location::new(normalized, path.to_string(), matched))
	}

	/// Resolves the route registered under `name`.
	pub fn resolve_named(&self, name: &str) -> RouterResult<Location> {
		let record = self
			.get_by_name(name)
			.ok_or_else(|| RouterError::InvalidRoute(format!("unknown route name '{}'", name)))?;
		self.resolve(record.path())
	}

	/// Removes the route at `path` together with all of its descendants.
	///
	/// Returns the removed records, the route itself first. Locations that
	/// were already resolved keep their own references to the records.
	pub fn remove_route(&mut self, path: &str) -> RouterResult<Vec<Arc<RouteRecord>>> {
		let normalized = normalize_path(path);
		let index = *self
			.by_path
			.get(&normalized)
			.ok_or_else(|| RouterError::no_match(normalized))?;

		let parent = self.node_at(index).parent;
		if let Some(parent) = parent
			&& let Some(node) = self.nodes[parent].as_mut()
		{
			node.children.retain(|child| *child != index);
		}

		let mut removed = Vec::new();
		let mut pending = vec![index];
		while let Some(current) = pending.pop() {
			if let Some(node) = self.nodes[current].take() {
				self.by_path.remove(node.record.path());
				if let Some(name) = node.record.name() {
					self.by_name.remove(name);
				}
				pending.extend(node.children.iter().rev().copied());
				removed.push(node.record);
			}
		}
		self.order.retain(|index| self.nodes[*index].is_some());

		tracing::debug!(path = %path, removed = removed.len(), "route removed");
		Ok(removed)
	}

	/// Returns the record registered at `path`.
	pub fn get(&self, path: &str) -> Option<&Arc<RouteRecord>> {
		self.by_path
			.get(&normalize_path(path))
			.map(|index| &self.node_at(*index).record)
	}

	/// Returns the record registered under `name`.
	pub fn get_by_name(&self, name: &str) -> Option<&Arc<RouteRecord>> {
		self.by_name
			.get(name)
			.map(|index| &self.node_at(*index).record)
	}

	/// Returns `true` if a route is registered at `path`.
	pub fn has_route(&self, path: &str) -> bool {
		self.by_path.contains_key(&normalize_path(path))
	}

	/// Direct children of the route at `path`, in registration order.
	pub fn children(&self, path: &str) -> Option<Vec<Arc<RouteRecord>>> {
		let index = self.by_path.get(&normalize_path(path))?;
		Some(
			self.node_at(*index)
				.children
				.iter()
				.map(|child| Arc::clone(&self.node_at(*child).record))
				.collect(),
		)
	}

	/// Parent of the route at `path`.
	pub fn parent(&self, path: &str) -> Option<&Arc<RouteRecord>> {
		let index = self.by_path.get(&normalize_path(path))?;
		self.node_at(*index)
			.parent
			.map(|parent| &self.node_at(parent).record)
	}

	/// All records in registration order. Children are registered before
	/// their parent.
	pub fn records(&self) -> Vec<Arc<RouteRecord>> {
		self.order
			.iter()
			.map(|index| Arc::clone(&self.node_at(*index).record))
			.collect()
	}

	/// All normalized paths in registration order.
	pub fn paths(&self) -> Vec<&str> {
		self.order
			.iter()
			.map(|index| self.node_at(*index).record.path())
			.collect()
	}

	/// Number of registered routes.
	pub fn len(&self) -> usize {
		self.order.len()
	}

	/// Returns `true` when no route is registered.
	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	fn node_at(&self, index: usize) -> &MatcherNode {
		self.nodes[index]
			.as_ref()
			.unwrap_or_else(|| unreachable!("matcher index {} points at a removed node", index))
	}

	fn record_at(&self, index: usize) -> &RouteRecord {
		&self.node_at(index).record
	}
}
