use glam::{DMat3, DMat4};
use tracing::debug;
use crate::algebra::Pose;
use crate::store::{FrameRecord, Store, MAX_DEPTH, ROOT_FRAME};
use crate::Error;

// Monogram notation throughout: X_A_B is the pose of A with respect to B,
// with the translation expressed in B.
pub struct FrameGraph {
	store: Store,
}

struct RootPose {
	root: String,
	pose: Pose,
}

impl FrameGraph {
	pub fn new(store: Store) -> Self {
		FrameGraph { store }
	}

	pub fn resolve(&self, subject: &str, basis: &str, csys: &str) -> Result<DMat4, Error> {
		let walk_s = self.pose_wrt_root(subject)?;
		let x_b_w = self.pose_wrt_shared_root(basis, &walk_s.root)?;
		let x_c_w = self.pose_wrt_shared_root(csys, &walk_s.root)?;

		// The basis only anchors the translation; the coordinate system picks
		// the axes both the rotation and the translation are expressed in.
		let r_w_c = x_c_w.r.transpose();
		let pose = Pose {
			r: r_w_c * walk_s.pose.r,
			t: r_w_c * (walk_s.pose.t - x_b_w.t),
		};
		Ok(pose.to_matrix())
	}

	pub fn store_pose(
		&mut self,
		subject: &str,
		basis: &str,
		csys: &str,
		pose: &Pose,
	) -> Result<(), Error> {
		if subject == ROOT_FRAME {
			return Err(Error::RootImmutable);
		}
		if subject == basis {
			return Err(Error::SelfReference);
		}

		if self.store.fetch(basis)?.is_some() {
			if self.store.fetch(subject)?.is_some() {
				// Re-parenting an existing frame must not close a cycle
				// through its old record. A chain that dangles before
				// reaching a root cannot loop, so truncation passes here.
				if let Err(err) = self.chase_root(basis, Some(subject)) {
					if !matches!(err, Error::TruncatedChain) {
						return Err(err);
					}
				}
			}
			let r_c_b = if basis == csys {
				DMat3::IDENTITY
			} else {
				DMat3::from_mat4(self.resolve(csys, basis, basis)?)
			};
			debug!(subject, basis, csys, "storing frame");
			return self.store.replace(&FrameRecord {
				name: subject.to_string(),
				parent: Some(basis.to_string()),
				pose: Pose { r: r_c_b * pose.r, t: r_c_b * pose.t },
			});
		}

		if basis == csys {
			// Unknown basis named as its own coordinate system: park the
			// subject under the dangling parent until the basis appears.
			debug!(subject, basis, "storing frame under absent basis");
			return self.store.replace(&FrameRecord {
				name: subject.to_string(),
				parent: Some(basis.to_string()),
				pose: *pose,
			});
		}

		if self.store.fetch(subject)?.is_some() && self.store.fetch(csys)?.is_some() {
			// The subject is known instead: define the basis from it with the
			// rigid-pose reversal, keeping the caller's coordinate system.
			return self.store_pose(basis, subject, csys, &pose.reversed());
		}

		Err(Error::MissingReference(basis.to_string()))
	}

	fn pose_wrt_root(&self, frame: &str) -> Result<RootPose, Error> {
		let Some(walk) = self.store.root_walk(frame)? else {
			return Err(Error::MissingReference(frame.to_string()));
		};
		if walk.terminal_parent.is_some() {
			return Err(Error::TruncatedChain);
		}
		Ok(RootPose { root: walk.terminal, pose: walk.pose })
	}

	fn pose_wrt_shared_root(&self, frame: &str, root: &str) -> Result<Pose, Error> {
		if frame == root {
			return Ok(Pose::IDENTITY);
		}
		let walk = self.pose_wrt_root(frame)?;
		if walk.root != root {
			return Err(Error::DisconnectedGraph);
		}
		Ok(walk.pose)
	}

	// In-process alternative to the store-side walk: chases parents one fetch
	// at a time, accumulating the pose as a unit quaternion. Meeting `guard`
	// on the way up is a kinematic loop.
	fn chase_root(&self, start: &str, guard: Option<&str>) -> Result<RootPose, Error> {
		let Some(mut record) = self.store.fetch(start)? else {
			return Err(Error::MissingReference(start.to_string()));
		};
		let mut q = record.pose.rotation_quat();
		let mut t = record.pose.t;
		let mut depth = 0;

		while let Some(parent) = record.parent.clone() {
			if guard == Some(parent.as_str()) {
				return Err(Error::KinematicLoop(parent));
			}
			depth += 1;
			if depth > MAX_DEPTH {
				return Err(Error::TruncatedChain);
			}
			record = match self.store.fetch(&parent)? {
				Some(record) => record,
				None => return Err(Error::TruncatedChain),
			};
			let pq = record.pose.rotation_quat();
			t = pq * t + record.pose.t;
			q = (pq * q).normalize();
		}
		Ok(RootPose { root: record.name, pose: Pose::from_quat(q, t) })
	}
}
