//! Persistent rigid-body poses among named reference frames.
//!
//! Each world is a single-rooted tree of frames backed by one SQLite file.
//! Queries are stated with the staged chain
//! `in_world → get/set → wrt → ei → as_pose`, separating the frame a pose is
//! defined *with respect to* from the frame its translation is *expressed in*.

pub mod algebra;
pub mod graph;
pub mod query;
pub mod session;
pub mod store;

pub use algebra::{MatrixError, Pose};
pub use session::{Session, World};

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("only [a-z], [0-9] and dash (-) is allowed in frame and world names")]
	InvalidName,
	#[error("the world frame is the immobile root and cannot be set")]
	RootImmutable,
	#[error("a frame cannot be defined with respect to itself")]
	SelfReference,
	#[error("the submitted matrix is not a rigid transform: {0}")]
	BadMatrix(#[from] MatrixError),
	#[error("the frame {0} does not exist in this world")]
	MissingReference(String),
	#[error("the queried frames do not share a root")]
	DisconnectedGraph,
	#[error("the parent chain revisits {0}, closing a kinematic loop")]
	KinematicLoop(String),
	#[error("the parent chain does not terminate at the world root within 100 hops")]
	TruncatedChain,
	#[error("no writable directory is available for the world database")]
	NotWritable,
	#[error("timed out waiting for the world database lock")]
	StoreBusy,
	#[error("database error: {0}")]
	Store(rusqlite::Error),
	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
	fn from(err: rusqlite::Error) -> Self {
		match err {
			rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::DatabaseBusy =>
				Error::StoreBusy,
			err => Error::Store(err),
		}
	}
}

pub(crate) fn valid_name(name: &str) -> bool {
	!name.is_empty() && name.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'-'))
}

#[cfg(test)]
mod tests {
	use super::valid_name;

	#[test]
	fn name_grammar() {
		assert!(valid_name("world"));
		assert!(valid_name("robot-arm-2"));
		assert!(valid_name("0"));
		assert!(!valid_name(""));
		assert!(!valid_name("Hello"));
		assert!(!valid_name("a_b"));
		assert!(!valid_name("a b"));
		assert!(!valid_name("café"));
	}
}
