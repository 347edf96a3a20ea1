//! Ordered guard execution for one navigation.

use std::sync::Arc;

use crate::error::GuardRejection;
use crate::location::Location;
use crate::matcher::{ComponentHook, RouteRecord};

use super::{Guard, GuardContext, GuardOutcome, GuardRegistry, GuardStep, run_guard};

/// Records of a navigation grouped by how they change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
	/// Records present in `from` only, root to leaf.
	pub leaving: Vec<Arc<RouteRecord>>,
	/// Records present in both chains, root to leaf.
	pub updating: Vec<Arc<RouteRecord>>,
	/// Records present in `to` only, root to leaf.
	pub entering: Vec<Arc<RouteRecord>>,
}

impl ChangeSet {
	/// Classifies the records of `to` and `from` by path.
	pub fn classify(to: &Location, from: &Location) -> Self {
		let mut changes = Self::default();
		let depth = to.matched().len().max(from.matched().len());

		for index in 0..depth {
			if let Some(record) = from.matched().get(index) {
				if to.contains_record(record.path()) {
					changes.updating.push(Arc::clone(record));
				} else {
					changes.leaving.push(Arc::clone(record));
				}
			}
			if let Some(record) = to.matched().get(index)
				&& !from.contains_record(record.path())
			{
				changes.entering.push(Arc::clone(record));
			}
		}

		changes
	}
}

/// A guard waiting for its turn in the pipeline.
#[derive(Debug, Clone)]
pub struct QueuedGuard {
	pub guard: Guard,
	pub step: GuardStep,
	/// Position within `step`.
	pub index: usize,
	/// Owning record for record and component guards.
	pub record: Option<Arc<RouteRecord>>,
}

/// How a guard stopped the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardFailureKind {
	Aborted(Option<String>),
	Redirected(String),
}

/// The guard that stopped the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardFailure {
	pub step: GuardStep,
	pub index: usize,
	/// Path of the owning record.
	pub record: Option<String>,
	pub kind: GuardFailureKind,
}

impl GuardFailure {
	/// Describes the failure as a rejection of the navigation to `to`.
	pub fn rejection(&self, to: &str) -> GuardRejection {
		let reason = match &self.kind {
			GuardFailureKind::Aborted(reason) => reason.clone(),
			GuardFailureKind::Redirected(target) => Some(format!("redirected to '{target}'")),
		};
		GuardRejection {
			to: to.to_string(),
			step: self.step,
			index: self.index,
			record: self.record.clone(),
			reason,
		}
	}

	/// Redirect target, if the guard redirected.
	pub fn redirect_target(&self) -> Option<&str> {
		match &self.kind {
			GuardFailureKind::Redirected(target) => Some(target),
			GuardFailureKind::Aborted(_) => None,
		}
	}
}

/// The full, ordered list of guards for one navigation.
#[derive(Debug)]
pub struct GuardPipeline {
	to: Location,
	from: Location,
	queue: Vec<QueuedGuard>,
}

impl GuardPipeline {
	/// Collects every guard that applies to the navigation from `from` to `to`.
	///
	/// Global guards are snapshotted here, so registrations made while the
	/// pipeline runs only affect later navigations.
	pub fn build(
		to: &Location,
		from: &Location,
		before: &GuardRegistry,
		resolve: &GuardRegistry,
	) -> Self {
		let changes = ChangeSet::classify(to, from);
		let mut queue = Vec::new();

		push_component_hooks(
			&mut queue,
			GuardStep::Leave,
			ComponentHook::BeforeRouteLeave,
			changes.leaving.iter().rev(),
		);
		push_global(&mut queue, GuardStep::Before, before);
		push_component_hooks(
			&mut queue,
			GuardStep::Update,
			ComponentHook::BeforeRouteUpdate,
			changes.updating.iter(),
		);

		let record_guards = to
			.matched()
			.iter()
			.filter_map(|record| record.before_enter().map(|guard| (record, guard)));
		for (index, (record, guard)) in record_guards.enumerate() {
			queue.push(QueuedGuard {
				guard: guard.clone(),
				step: GuardStep::BeforeEnter,
				index,
				record: Some(Arc::clone(record)),
			});
		}

		push_component_hooks(
			&mut queue,
			GuardStep::Enter,
			ComponentHook::BeforeRouteEnter,
			changes.entering.iter(),
		);
		push_global(&mut queue, GuardStep::Resolve, resolve);

		Self {
			to: to.clone(),
			from: from.clone(),
			queue,
		}
	}

	/// Guards in execution order.
	pub fn queue(&self) -> &[QueuedGuard] {
		&self.queue
	}

	pub fn len(&self) -> usize {
		self.queue.len()
	}

	pub fn is_empty(&self) -> bool {
		self.queue.is_empty()
	}

	/// Runs the guards one at a time and stops at the first one that does not
	/// proceed.
	pub async fn run(self) -> Result<(), GuardFailure> {
		for queued in self.queue {
			let ctx = GuardContext {
				to: self.to.clone(),
				from: self.from.clone(),
				record: queued.record.clone(),
			};
			tracing::trace!(
				step = %queued.step,
				index = queued.index,
				to = %self.to.full_path(),
				"running guard"
			);

			let kind = match run_guard(&queued.guard, ctx).await {
				GuardOutcome::Proceed => continue,
				GuardOutcome::Abort(reason) => GuardFailureKind::Aborted(reason),
				GuardOutcome::Redirect(target) => GuardFailureKind::Redirected(target),
			};
			return Err(GuardFailure {
				step: queued.step,
				index: queued.index,
				record: queued.record.map(|record| record.path().to_string()),
				kind,
			});
		}
		Ok(())
	}
}

fn push_global(queue: &mut Vec<QueuedGuard>, step: GuardStep, registry: &GuardRegistry) {
	for (index, guard) in registry.snapshot().into_iter().enumerate() {
		queue.push(QueuedGuard {
			guard,
			step,
			index,
			record: None,
		});
	}
}

fn push_component_hooks<'a>(
	queue: &mut Vec<QueuedGuard>,
	step: GuardStep,
	hook: ComponentHook,
	records: impl Iterator<Item = &'a Arc<RouteRecord>>,
) {
	let mut index = 0;
	for record in records {
		for component in record.components_in_guard_order() {
			if let Some(guard) = component.guard(hook) {
				queue.push(QueuedGuard {
					guard: guard.clone(),
					step,
					index,
					record: Some(Arc::clone(record)),
				});
				index += 1;
			}
		}
	}
}
