//! Change notifications and their classification

use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use std::ffi::OsString;
use std::fmt;
use std::ops::BitOr;
use std::path::{Path, PathBuf};

use crate::error::WatchError;

/// Recognized kinds of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
	Created,
	Deleted,
	Modified,
	/// Renamed into the watched directory
	MovedIn,
	/// Renamed away from the watched directory
	MovedOut,
	/// A file opened for writing was closed
	WriteClosed,
	Other,
}

impl ChangeKind {
	/// Human readable suffix for log lines
	pub fn describe(self) -> &'static str {
		match self {
			ChangeKind::Created => " was created.",
			ChangeKind::Deleted => " was deleted.",
			ChangeKind::Modified => " was modified.",
			_ => " was changed in some sort of way.",
		}
	}

	fn bit(self) -> u8 {
		match self {
			ChangeKind::Created => EventMask::CREATE.0,
			ChangeKind::Deleted => EventMask::DELETE.0,
			ChangeKind::Modified => EventMask::MODIFY.0,
			ChangeKind::MovedIn => EventMask::MOVED_TO.0,
			ChangeKind::MovedOut => EventMask::MOVED_FROM.0,
			ChangeKind::WriteClosed => EventMask::CLOSE_WRITE.0,
			ChangeKind::Other => EventMask::OTHER.0,
		}
	}
}

/// Set of change kinds a watch reacts to
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventMask(u8);

impl EventMask {
	pub const EMPTY: EventMask = EventMask(0);
	pub const CREATE: EventMask = EventMask(1);
	pub const DELETE: EventMask = EventMask(1 << 1);
	pub const MODIFY: EventMask = EventMask(1 << 2);
	pub const MOVED_TO: EventMask = EventMask(1 << 3);
	pub const MOVED_FROM: EventMask = EventMask(1 << 4);
	pub const CLOSE_WRITE: EventMask = EventMask(1 << 5);
	pub const OTHER: EventMask = EventMask(1 << 6);

	/// Mask used for every registration: deletion, rename-into and write
	/// completion, plus creation (tree growth) and unclassified events.
	/// Plain modification is left out; a finished write always follows it.
	pub const DEFAULT: EventMask = EventMask(
		Self::DELETE.0 | Self::MOVED_TO.0 | Self::CLOSE_WRITE.0 | Self::CREATE.0 | Self::OTHER.0,
	);

	pub const fn union(self, other: EventMask) -> EventMask {
		EventMask(self.0 | other.0)
	}

	pub fn contains(self, other: EventMask) -> bool {
		self.0 & other.0 == other.0
	}

	pub fn contains_kind(self, kind: ChangeKind) -> bool {
		self.0 & kind.bit() != 0
	}
}

impl BitOr for EventMask {
	type Output = EventMask;

	fn bitor(self, rhs: EventMask) -> EventMask {
		self.union(rhs)
	}
}

impl fmt::Debug for EventMask {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		const NAMES: [(EventMask, &str); 7] = [
			(EventMask::CREATE, "CREATE"),
			(EventMask::DELETE, "DELETE"),
			(EventMask::MODIFY, "MODIFY"),
			(EventMask::MOVED_TO, "MOVED_TO"),
			(EventMask::MOVED_FROM, "MOVED_FROM"),
			(EventMask::CLOSE_WRITE, "CLOSE_WRITE"),
			(EventMask::OTHER, "OTHER"),
		];
		let names: Vec<&str> =
			NAMES.iter().filter(|(bit, _)| self.contains(*bit)).map(|(_, name)| *name).collect();
		write!(f, "EventMask({})", names.join(" | "))
	}
}

/// One change inside a watched directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
	/// The watched directory the change happened in
	pub parent: PathBuf,

	/// Entry name inside `parent`, absent for events about the directory itself
	pub name: Option<OsString>,

	pub kind: ChangeKind,

	/// The backend reported the subject as a directory
	pub is_dir: bool,
}

impl ChangeEvent {
	pub fn new(parent: impl Into<PathBuf>, name: impl Into<OsString>, kind: ChangeKind) -> Self {
		Self { parent: parent.into(), name: Some(name.into()), kind, is_dir: false }
	}

	pub fn dir(mut self) -> Self {
		self.is_dir = true;
		self
	}

	/// Split a full path into parent directory and entry name
	pub fn for_path(path: &Path, kind: ChangeKind, is_dir: bool) -> Self {
		match path.parent() {
			Some(parent) => Self {
				parent: parent.to_path_buf(),
				name: path.file_name().map(OsString::from),
				kind,
				is_dir,
			},
			None => Self { parent: path.to_path_buf(), name: None, kind, is_dir },
		}
	}

	/// Full path of the changed entry
	pub fn subject(&self) -> Option<PathBuf> {
		self.name.as_ref().map(|name| self.parent.join(name))
	}
}

/// What the watch subsystem delivers to the dispatcher
#[derive(Debug)]
pub enum WatchNotification {
	Change(ChangeEvent),

	/// Events were dropped because the subsystem ran out of capacity
	Overflow,

	Error(WatchError),
}

/// Translate a `notify` event into notifications, one per affected path
pub fn from_notify(event: Event) -> Vec<WatchNotification> {
	if event.need_rescan() {
		return vec![WatchNotification::Overflow];
	}

	let (kind, is_dir) = match event.kind {
		EventKind::Create(create) => (ChangeKind::Created, create == CreateKind::Folder),
		EventKind::Remove(remove) => (ChangeKind::Deleted, remove == RemoveKind::Folder),
		EventKind::Access(AccessKind::Close(AccessMode::Write)) => (ChangeKind::WriteClosed, false),
		EventKind::Access(_) => return vec![],
		EventKind::Modify(ModifyKind::Name(RenameMode::To)) => (ChangeKind::MovedIn, false),
		EventKind::Modify(ModifyKind::Name(RenameMode::From)) => (ChangeKind::MovedOut, false),
		// Both halves of a rename were already delivered separately
		EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => return vec![],
		EventKind::Modify(_) => (ChangeKind::Modified, false),
		EventKind::Any | EventKind::Other => (ChangeKind::Other, false),
	};

	event
		.paths
		.iter()
		.map(|path| WatchNotification::Change(ChangeEvent::for_path(path, kind, is_dir)))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use notify::event::{DataChange, Flag};

	fn changes(event: Event) -> Vec<ChangeEvent> {
		from_notify(event)
			.into_iter()
			.map(|n| match n {
				WatchNotification::Change(change) => change,
				other => panic!("unexpected notification {:?}", other),
			})
			.collect()
	}

	#[test]
	fn test_default_mask() {
		let mask = EventMask::DEFAULT;
		assert!(mask.contains_kind(ChangeKind::Deleted));
		assert!(mask.contains_kind(ChangeKind::MovedIn));
		assert!(mask.contains_kind(ChangeKind::WriteClosed));
		assert!(mask.contains_kind(ChangeKind::Created));
		assert!(mask.contains_kind(ChangeKind::Other));
		assert!(!mask.contains_kind(ChangeKind::Modified));
		assert!(!mask.contains_kind(ChangeKind::MovedOut));
		assert_eq!(
			format!("{:?}", EventMask::CREATE | EventMask::DELETE),
			"EventMask(CREATE | DELETE)"
		);
	}

	#[test]
	fn test_overflow_flag() {
		let event = Event::new(EventKind::Other).set_flag(Flag::Rescan);
		let notifications = from_notify(event);
		assert_eq!(notifications.len(), 1);
		assert!(matches!(notifications[0], WatchNotification::Overflow));
	}

	#[test]
	fn test_folder_creation() {
		let event = Event::new(EventKind::Create(CreateKind::Folder)).add_path("/srv/app/new".into());
		let change = &changes(event)[0];
		assert_eq!(change.parent, PathBuf::from("/srv/app"));
		assert_eq!(change.name, Some(OsString::from("new")));
		assert_eq!(change.kind, ChangeKind::Created);
		assert!(change.is_dir);
		assert_eq!(change.subject(), Some(PathBuf::from("/srv/app/new")));
	}

	#[test]
	fn test_kind_mapping() {
		let cases = [
			(EventKind::Remove(RemoveKind::File), ChangeKind::Deleted),
			(EventKind::Access(AccessKind::Close(AccessMode::Write)), ChangeKind::WriteClosed),
			(EventKind::Modify(ModifyKind::Data(DataChange::Any)), ChangeKind::Modified),
			(EventKind::Modify(ModifyKind::Name(RenameMode::To)), ChangeKind::MovedIn),
			(EventKind::Modify(ModifyKind::Name(RenameMode::From)), ChangeKind::MovedOut),
			(EventKind::Other, ChangeKind::Other),
		];
		for (kind, expected) in cases {
			let event = Event::new(kind).add_path("/d/f".into());
			assert_eq!(changes(event)[0].kind, expected, "{:?}", kind);
		}
	}

	#[test]
	fn test_irrelevant_events_dropped() {
		let read = Event::new(EventKind::Access(AccessKind::Read)).add_path("/d/f".into());
		assert!(from_notify(read).is_empty());
		let both = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
			.add_path("/d/a".into())
			.add_path("/d/b".into());
		assert!(from_notify(both).is_empty());
	}

	#[test]
	fn test_describe() {
		assert_eq!(ChangeKind::Deleted.describe(), " was deleted.");
		assert_eq!(ChangeKind::WriteClosed.describe(), " was changed in some sort of way.");
	}

	#[test]
	fn test_event_without_name() {
		let change = ChangeEvent::for_path(Path::new("/"), ChangeKind::Deleted, true);
		assert_eq!(change.subject(), None);
	}
}

// vim: ts=4
